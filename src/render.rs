//! Section → block descriptor. Pure and deterministic: the same section and
//! settings always produce the same `Block`, which is what lets measurement and
//! export share one layout pass.

use crate::config::LayoutSettings;
use crate::document::Document;
use crate::model::{
    CustomItem, EducationItem, Payload, PersonalInfo, ProjectItem, Section, SectionId, SectionKind, SkillItem,
    Styles, TextStyle, WorkItem, style_for,
};

pub type Rgb = [u8; 3];

/// Default link colour when a link has no colour override.
pub const LINK_COLOR: Rgb = [0x18, 0x90, 0xff];

/// Heading line box, as a multiple of the font size.
pub const HEADING_LINE_HEIGHT: f32 = 1.35;

pub const DIVIDER_SPACING_BASE: f32 = 16.0;
pub const FIRST_LINE_SPACING_BASE: f32 = 8.0;
pub const ITEM_GAP: f32 = 32.0;
pub const CUSTOM_ITEM_GAP: f32 = 24.0;
pub const PHOTO_SIZE: f32 = 128.0;
pub const PHOTO_GAP: f32 = 32.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Normal,
    Secondary,
    Link,
}

impl Tone {
    pub fn default_color(self) -> Rgb {
        match self {
            Tone::Normal => [0x26, 0x26, 0x26],
            Tone::Secondary => [0x73, 0x73, 0x73],
            Tone::Link => LINK_COLOR,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Span {
    pub text: String,
    pub bold: bool,
    pub color: Option<Rgb>,
    pub tone: Tone,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Span {
            text: text.into(),
            bold: false,
            color: None,
            tone: Tone::Normal,
        }
    }

    fn styled(text: impl Into<String>, style: Option<&TextStyle>, tone: Tone) -> Self {
        Span {
            text: text.into(),
            bold: style.is_some_and(TextStyle::is_bold),
            color: style.and_then(TextStyle::rgb),
            tone,
        }
    }

    pub fn resolved_color(&self) -> Rgb {
        self.color.unwrap_or(self.tone.default_color())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Photo {
    /// `data:image/...;base64,...` as stored in the document.
    pub data_url: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SkillCell {
    pub name: Span,
    /// Bar fill in [0, 1].
    pub fraction: f32,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Title {
        text: String,
        size: f32,
    },
    /// Vertical space; negative values pull following content up.
    Gap(f32),
    Divider,
    Text {
        spans: Vec<Span>,
        size: f32,
        line_height: f32,
        align: Align,
        space_after: f32,
    },
    Split {
        left: Vec<Span>,
        right: Vec<Span>,
        size: f32,
        line_height: f32,
        space_after: f32,
    },
    SkillGrid {
        rows: Vec<SkillCell>,
        size: f32,
        line_height: f32,
    },
    Tags {
        label: Span,
        tags: Vec<String>,
        size: f32,
        line_height: f32,
        color: Option<Rgb>,
    },
    Header {
        lines: Vec<Node>,
        photo: Option<Photo>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub section_id: SectionId,
    pub kind: SectionKind,
    pub nodes: Vec<Node>,
}

/// Render one section. `None` when the section has nothing to show.
pub fn render(section: &Section, settings: &LayoutSettings) -> Option<Block> {
    let s = settings.clamped();
    let nodes = match &section.payload {
        Payload::Personal(info) => render_personal(info, section.styles.as_ref(), &s)?,
        Payload::Education(items) => titled(section, &s, ITEM_GAP, items, |i| education_item(i, &s))?,
        Payload::Work(items) => titled(section, &s, ITEM_GAP, items, |i| work_item(i, &s))?,
        Payload::Skills(items) => {
            if items.is_empty() {
                return None;
            }
            let mut nodes = heading(section, &s);
            nodes.push(Node::SkillGrid {
                rows: items.iter().map(skill_cell).collect(),
                size: s.content_font_size,
                line_height: s.line_height,
            });
            nodes
        }
        Payload::Projects(items) => titled(section, &s, ITEM_GAP, items, |i| project_item(i, &s))?,
        Payload::Custom(items) => titled(section, &s, CUSTOM_ITEM_GAP, items, |i| custom_item(i, &s))?,
    };
    Some(Block {
        section_id: section.id.clone(),
        kind: section.kind(),
        nodes,
    })
}

/// Blocks for every visible, non-empty section, in render order.
pub fn render_visible(document: &Document, settings: &LayoutSettings) -> Vec<Block> {
    document
        .visible_sections()
        .into_iter()
        .filter_map(|section| render(section, settings))
        .collect()
}

fn heading(section: &Section, s: &LayoutSettings) -> Vec<Node> {
    vec![
        Node::Title {
            text: section.title.clone(),
            size: s.title_font_size,
        },
        Node::Gap(DIVIDER_SPACING_BASE * s.divider_spacing),
        Node::Divider,
        Node::Gap(FIRST_LINE_SPACING_BASE * s.first_line_spacing),
    ]
}

fn titled<T>(
    section: &Section,
    s: &LayoutSettings,
    item_gap: f32,
    items: &[T],
    item: impl Fn(&T) -> Vec<Node>,
) -> Option<Vec<Node>> {
    if items.is_empty() {
        return None;
    }
    let mut nodes = heading(section, s);
    for (i, it) in items.iter().enumerate() {
        if i > 0 {
            nodes.push(Node::Gap(item_gap));
        }
        nodes.extend(item(it));
    }
    Some(nodes)
}

fn paragraph(spans: Vec<Span>, s: &LayoutSettings, align: Align, space_after: f32) -> Node {
    Node::Text {
        spans,
        size: s.content_font_size,
        line_height: s.line_height,
        align,
        space_after,
    }
}

fn render_personal(info: &PersonalInfo, styles: Option<&Styles>, s: &LayoutSettings) -> Option<Vec<Node>> {
    if info.is_blank() {
        return None;
    }
    let style = |field: &str| styles.and_then(|st| st.get(field));
    let or_label = |value: &str, label: &str| {
        if value.trim().is_empty() { label.to_string() } else { value.to_string() }
    };

    let mut lines = vec![
        Node::Text {
            spans: vec![Span::styled(or_label(&info.name, "Name"), style("name"), Tone::Normal)],
            size: s.title_font_size * 1.5,
            line_height: HEADING_LINE_HEIGHT,
            align: Align::Center,
            space_after: 8.0,
        },
        paragraph(
            vec![Span::styled(or_label(&info.title, "Title"), style("title"), Tone::Normal)],
            s,
            Align::Center,
            16.0,
        ),
    ];

    let contacts: Vec<(&str, &str)> = [("email", &info.email), ("phone", &info.phone), ("address", &info.address)]
        .into_iter()
        .filter(|(_, v)| !v.trim().is_empty())
        .map(|(f, v)| (f, v.as_str()))
        .collect();
    let last = contacts.len().saturating_sub(1);
    for (i, &(field, value)) in contacts.iter().enumerate() {
        let space_after = if i == last { 16.0 } else { 4.0 };
        lines.push(paragraph(
            vec![Span::styled(value, style(field), Tone::Secondary)],
            s,
            Align::Center,
            space_after,
        ));
    }

    if !info.summary.trim().is_empty() {
        lines.push(paragraph(
            vec![Span::styled(&info.summary, style("summary"), Tone::Normal)],
            s,
            Align::Left,
            s.content_font_size,
        ));
    }

    let photo = (!info.photo.trim().is_empty()).then(|| Photo {
        data_url: info.photo.clone(),
    });
    Some(vec![Node::Header { lines, photo }])
}

fn date_range(start: &str, end: &str) -> Option<String> {
    if start.trim().is_empty() && end.trim().is_empty() {
        None
    } else {
        Some(format!("{start} - {end}"))
    }
}

/// Primary fields joined by `" | "`, skipping blanks.
fn joined(fields: &[(&str, &str)], styles: &Option<Styles>) -> Vec<Span> {
    let mut spans = Vec::new();
    for (field, value) in fields.iter().filter(|(_, v)| !v.trim().is_empty()) {
        if !spans.is_empty() {
            spans.push(Span::plain(" | "));
        }
        spans.push(Span::styled(*value, style_for(styles, field), Tone::Normal));
    }
    spans
}

fn dated_row(
    fields: &[(&str, &str)],
    start: &str,
    end: &str,
    right_align: bool,
    styles: &Option<Styles>,
    s: &LayoutSettings,
) -> Node {
    let mut left = joined(fields, styles);
    let date = date_range(start, end).map(|d| Span::styled(d, style_for(styles, "date"), Tone::Secondary));

    if right_align {
        return Node::Split {
            left,
            right: date.into_iter().collect(),
            size: s.content_font_size,
            line_height: s.line_height,
            space_after: 32.0,
        };
    }
    if let Some(date) = date {
        if !left.is_empty() {
            left.push(Span::plain(" | "));
        }
        left.push(date);
    }
    paragraph(left, s, Align::Left, 8.0)
}

fn description(text: &str, styles: &Option<Styles>, s: &LayoutSettings) -> Option<Node> {
    (!text.trim().is_empty()).then(|| {
        paragraph(
            vec![Span::styled(text, style_for(styles, "description"), Tone::Normal)],
            s,
            Align::Left,
            s.content_font_size,
        )
    })
}

fn education_item(item: &EducationItem, s: &LayoutSettings) -> Vec<Node> {
    let row = dated_row(
        &[
            ("school", item.school.as_str()),
            ("degree", item.degree.as_str()),
            ("field", item.field.as_str()),
        ],
        &item.start_date,
        &item.end_date,
        item.date_right_align == Some(true),
        &item.styles,
        s,
    );
    std::iter::once(row)
        .chain(description(&item.description, &item.styles, s))
        .collect()
}

fn work_item(item: &WorkItem, s: &LayoutSettings) -> Vec<Node> {
    let row = dated_row(
        &[("company", item.company.as_str()), ("position", item.position.as_str())],
        &item.start_date,
        &item.end_date,
        item.date_right_align == Some(true),
        &item.styles,
        s,
    );
    std::iter::once(row)
        .chain(description(&item.description, &item.styles, s))
        .collect()
}

/// Bar fill for a skill level. Levels are clamped to [0, 5]; non-finite levels count as 0.
pub fn skill_fraction(level: f64) -> f32 {
    let level = if level.is_finite() { level.clamp(0.0, 5.0) } else { 0.0 };
    (level / 5.0) as f32
}

fn skill_label(level: f64) -> String {
    let level = if level.is_finite() { level } else { 0.0 };
    // f64's Display already drops a trailing ".0"
    format!("{level}/5")
}

fn skill_cell(item: &SkillItem) -> SkillCell {
    SkillCell {
        name: Span::styled(&item.name, style_for(&item.styles, "name"), Tone::Normal),
        fraction: skill_fraction(item.level),
        label: skill_label(item.level),
    }
}

fn project_item(item: &ProjectItem, s: &LayoutSettings) -> Vec<Node> {
    let mut nodes = vec![paragraph(
        vec![Span::styled(&item.name, style_for(&item.styles, "name"), Tone::Normal)],
        s,
        Align::Left,
        s.content_font_size,
    )];
    nodes.extend(description(&item.description, &item.styles, s));

    let tags: Vec<String> = item
        .technologies
        .iter()
        .filter(|t| !t.trim().is_empty())
        .cloned()
        .collect();
    if !tags.is_empty() {
        let style = style_for(&item.styles, "technologies");
        nodes.push(Node::Gap(8.0));
        nodes.push(Node::Tags {
            label: Span::styled("Tech stack: ", style, Tone::Normal),
            tags,
            size: s.content_font_size,
            line_height: s.line_height,
            color: style.and_then(TextStyle::rgb),
        });
    }

    if !item.link.trim().is_empty() {
        let style = style_for(&item.styles, "link");
        let mut url = Span::styled(item.link.trim(), style, Tone::Link);
        url.color.get_or_insert(LINK_COLOR);
        nodes.push(Node::Gap(8.0));
        nodes.push(paragraph(
            vec![Span::styled("Link: ", None, Tone::Secondary), url],
            s,
            Align::Left,
            s.content_font_size,
        ));
    }
    nodes
}

fn custom_item(item: &CustomItem, s: &LayoutSettings) -> Vec<Node> {
    let label_style = style_for(&item.styles, "label");
    let content_style = style_for(&item.styles, "content");
    let has_label = !item.label.trim().is_empty();
    let has_content = !item.content.trim().is_empty();

    if has_label && item.label_inline == Some(true) {
        let mut spans = vec![Span::styled(format!("{}: ", item.label), label_style, Tone::Normal)];
        if has_content {
            spans.push(Span::styled(&item.content, content_style, Tone::Normal));
        }
        return vec![paragraph(spans, s, Align::Left, 8.0)];
    }

    let mut nodes = Vec::new();
    if has_label {
        nodes.push(paragraph(
            vec![Span::styled(&item.label, label_style, Tone::Normal)],
            s,
            Align::Left,
            8.0,
        ));
    }
    if has_content {
        nodes.push(paragraph(
            vec![Span::styled(&item.content, content_style, Tone::Normal)],
            s,
            Align::Left,
            s.content_font_size,
        ));
    }
    nodes
}
