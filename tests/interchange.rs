mod common;

use chrono::{TimeZone, Utc};
use resume_pager::{
    Document, Error, LayoutSettings, Origin, Payload, SectionId, SectionKind, from_json, to_json,
};

#[test]
fn full_document_round_trips_unchanged() {
    let doc = common::full_document();
    let ts = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();

    let json = to_json(&doc, ts, None).unwrap();
    let back = from_json(&json).unwrap();

    assert_eq!(back.timestamp, ts);
    assert_eq!(back.document.sections(), doc.sections());
    let kinds: Vec<SectionKind> = back.document.render_order().iter().map(|s| s.kind()).collect();
    assert_eq!(kinds.len(), 6);

    let education = back.document.section(&SectionId::from("2")).unwrap();
    let Payload::Education(items) = &education.payload else {
        panic!("education payload expected");
    };
    assert_eq!(items[0].date_right_align, Some(true));
    assert_eq!(
        items[0].styles.as_ref().and_then(|s| s.get("school")).and_then(|s| s.color.as_deref()),
        Some("#000")
    );
    assert_eq!(back.document.section(&SectionId::from("6")).unwrap().origin, Origin::UserCreated);

    // A second pass is byte-identical.
    assert_eq!(to_json(&back.document, back.timestamp, None).unwrap(), json);
}

#[test]
fn wire_format_uses_modules_and_type_tags() {
    let json = to_json(&common::full_document(), Utc::now(), None).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let modules = value["modules"].as_array().unwrap();
    assert_eq!(modules.len(), 6);
    assert_eq!(modules[0]["type"], "personal");
    assert_eq!(modules[1]["data"][0]["dateRightAlign"], true);
    assert!(value["timestamp"].is_string());
    assert!(value.get("settings").is_none());
}

#[test]
fn settings_are_optional_on_import() {
    let settings = LayoutSettings {
        section_spacing: 0.5,
        content_font_size: 16.0,
        ..LayoutSettings::default()
    };
    let json = to_json(&common::full_document(), Utc::now(), Some(&settings)).unwrap();
    assert_eq!(from_json(&json).unwrap().settings, Some(settings));
}

#[test]
fn second_personal_section_is_rejected() {
    let mut doc = common::full_document();
    assert!(matches!(
        doc.add_section(SectionKind::Personal, ""),
        Err(Error::InvariantViolation(_))
    ));

    let mut sections = doc.into_sections();
    let mut twin = sections[0].clone();
    twin.id = SectionId::from("twin");
    sections.push(twin);
    let text = serde_json::json!({ "modules": sections, "timestamp": "2024-03-01T08:30:00Z" }).to_string();
    assert!(matches!(from_json(&text), Err(Error::InvariantViolation(_))));
}

#[test]
fn imported_ids_are_never_reissued() {
    let json = to_json(&common::full_document(), Utc::now(), None).unwrap();
    let mut doc: Document = from_json(&json).unwrap().document;
    let existing: Vec<SectionId> = doc.sections().iter().map(|s| s.id.clone()).collect();
    let fresh = doc.add_section(SectionKind::Custom, "Hobbies").unwrap();
    assert!(!existing.contains(&fresh));
    let copy = doc.duplicate_section(&SectionId::from("3")).unwrap();
    let section = doc.section(&copy).unwrap();
    assert_eq!(section.origin, Origin::Duplicated);
    assert!(!section.payload.item_ids().iter().any(|i| i.0 == "w1" || i.0 == "w2"));
}
