#![allow(dead_code)]

use base64::Engine;
use resume_pager::{
    CustomItem, Document, EducationItem, Origin, Payload, PersonalInfo, ProjectItem, Section, SectionId, SkillItem,
    Styles, TextStyle, WorkItem,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn style(bold: bool, color: &str) -> TextStyle {
    TextStyle {
        bold: Some(bold),
        color: Some(color.to_string()),
    }
}

pub fn styles(entries: &[(&str, TextStyle)]) -> Option<Styles> {
    Some(entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
}

pub fn section(id: &str, order: i64, origin: Origin, title: &str, payload: Payload) -> Section {
    Section {
        id: SectionId::from(id),
        title: title.to_string(),
        visible: true,
        order,
        origin,
        payload,
        styles: None,
    }
}

/// Small opaque PNG as a data URL.
pub fn png_data_url(width: u32, height: u32) -> String {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([40, 90, 160, 255]));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(buf.into_inner())
    )
}

/// Every section kind populated, with style overrides, a right-aligned date,
/// an inline custom label and a user-created section.
pub fn full_document() -> Document {
    let mut personal = section(
        "1",
        1,
        Origin::Builtin,
        "Personal Information",
        Payload::Personal(PersonalInfo {
            name: "Jane Doe".into(),
            title: "Systems Engineer".into(),
            email: "jane@example.com".into(),
            phone: "+1 555 0100".into(),
            address: "Springfield".into(),
            summary: "Builds reliable things.\nLikes pagers.".into(),
            photo: String::new(),
        }),
    );
    personal.styles = styles(&[("name", style(true, "#222222")), ("email", style(false, "#1890ff"))]);

    let education = section(
        "2",
        2,
        Origin::Builtin,
        "Education",
        Payload::Education(vec![EducationItem {
            id: "e1".into(),
            school: "State University".into(),
            degree: "M.Sc.".into(),
            field: "Computer Science".into(),
            start_date: "2014-09".into(),
            end_date: "2016-06".into(),
            description: "Thesis on layout engines.".into(),
            date_right_align: Some(true),
            styles: styles(&[("school", style(true, "#000"))]),
        }]),
    );

    let work = section(
        "3",
        3,
        Origin::Builtin,
        "Work Experience",
        Payload::Work(vec![
            WorkItem {
                id: "w1".into(),
                company: "Acme".into(),
                position: "Engineer".into(),
                start_date: "2016-07".into(),
                end_date: "2020-01".into(),
                description: "Shipped the print pipeline.".into(),
                date_right_align: None,
                styles: None,
            },
            WorkItem {
                id: "w2".into(),
                company: "Globex".into(),
                position: "Staff Engineer".into(),
                start_date: "2020-02".into(),
                end_date: "present".into(),
                description: String::new(),
                date_right_align: Some(false),
                styles: styles(&[("date", style(false, "#999"))]),
            },
        ]),
    );

    let skills = section(
        "4",
        4,
        Origin::Builtin,
        "Skills",
        Payload::Skills(vec![
            SkillItem {
                id: "s1".into(),
                name: "Rust".into(),
                level: 5.0,
                styles: None,
            },
            SkillItem {
                id: "s2".into(),
                name: "Go".into(),
                level: 3.5,
                styles: None,
            },
        ]),
    );

    let projects = section(
        "5",
        5,
        Origin::Builtin,
        "Projects",
        Payload::Projects(vec![ProjectItem {
            id: "p1".into(),
            name: "resume-pager".into(),
            description: "Greedy A4 pagination.".into(),
            technologies: vec!["Rust".into(), "PDF".into()],
            link: "https://example.com/resume-pager".into(),
            styles: styles(&[("link", style(true, "#0000ff"))]),
        }]),
    );

    let custom = section(
        "6",
        6,
        Origin::UserCreated,
        "Languages",
        Payload::Custom(vec![
            CustomItem {
                id: "c1".into(),
                label: "English".into(),
                content: "Native".into(),
                label_inline: Some(true),
                styles: None,
            },
            CustomItem {
                id: "c2".into(),
                label: "German".into(),
                content: "Conversational".into(),
                label_inline: None,
                styles: styles(&[("content", style(false, "#666"))]),
            },
        ]),
    );

    Document::from_sections(vec![personal, education, work, skills, projects, custom]).unwrap()
}

/// A custom section whose single item holds `paragraphs` paragraphs of text.
pub fn long_custom(id: &str, order: i64, paragraphs: usize) -> Section {
    let content = (0..paragraphs)
        .map(|i| format!("Paragraph {i}: the quick brown fox jumps over the lazy dog again and again."))
        .collect::<Vec<_>>()
        .join("\n");
    section(
        id,
        order,
        Origin::UserCreated,
        "Notes",
        Payload::Custom(vec![CustomItem {
            id: format!("{id}-item").as_str().into(),
            label: String::new(),
            content,
            label_inline: None,
            styles: None,
        }]),
    )
}
