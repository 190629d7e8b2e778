use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(pub String);

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SectionId {
    fn from(s: &str) -> Self {
        SectionId(s.to_string())
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId(s.to_string())
    }
}

/// Where a section came from. Only builtin sections are protected from deletion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    #[default]
    #[serde(rename = "original")]
    Builtin,
    #[serde(rename = "copied")]
    Duplicated,
    #[serde(rename = "custom")]
    UserCreated,
}

impl Origin {
    pub fn is_deletable(self) -> bool {
        !matches!(self, Origin::Builtin)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl TextStyle {
    pub fn is_bold(&self) -> bool {
        self.bold.unwrap_or(false)
    }

    pub fn rgb(&self) -> Option<[u8; 3]> {
        self.color.as_deref().and_then(parse_color)
    }
}

/// Per-field overrides keyed by field name (`"name"`, `"date"`, ...).
pub type Styles = BTreeMap<String, TextStyle>;

pub(crate) fn style_for<'a>(styles: &'a Option<Styles>, field: &str) -> Option<&'a TextStyle> {
    styles.as_ref().and_then(|s| s.get(field))
}

/// Parse `#rgb` / `#rrggbb` hex colors. Anything else is treated as "no override".
pub fn parse_color(s: &str) -> Option<[u8; 3]> {
    let hex = s.trim().strip_prefix('#')?;
    let digit = |i: usize, len: usize| u8::from_str_radix(hex.get(i..i + len)?, 16).ok();
    match hex.len() {
        3 => Some([digit(0, 1)? * 17, digit(1, 1)? * 17, digit(2, 1)? * 17]),
        6 => Some([digit(0, 2)?, digit(2, 2)?, digit(4, 2)?]),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Personal,
    Education,
    Work,
    Skills,
    Projects,
    Custom,
}

impl SectionKind {
    pub fn default_title(self) -> &'static str {
        match self {
            SectionKind::Personal => "Personal Information",
            SectionKind::Education => "Education",
            SectionKind::Work => "Work Experience",
            SectionKind::Skills => "Skills",
            SectionKind::Projects => "Projects",
            SectionKind::Custom => "Custom Section",
        }
    }

    pub fn empty_payload(self) -> Payload {
        match self {
            SectionKind::Personal => Payload::Personal(PersonalInfo::default()),
            SectionKind::Education => Payload::Education(Vec::new()),
            SectionKind::Work => Payload::Work(Vec::new()),
            SectionKind::Skills => Payload::Skills(Vec::new()),
            SectionKind::Projects => Payload::Projects(Vec::new()),
            SectionKind::Custom => Payload::Custom(Vec::new()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub summary: String,
    /// Data URL (`data:image/png;base64,...`) or empty.
    #[serde(default)]
    pub photo: String,
}

impl PersonalInfo {
    pub fn is_blank(&self) -> bool {
        [
            &self.name,
            &self.title,
            &self.email,
            &self.phone,
            &self.address,
            &self.summary,
            &self.photo,
        ]
        .iter()
        .all(|s| s.trim().is_empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationItem {
    pub id: ItemId,
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_right_align: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<Styles>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: ItemId,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_right_align: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<Styles>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillItem {
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    /// Nominally 1-5; the editor does not enforce it, the renderer clamps.
    #[serde(default)]
    pub level: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<Styles>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectItem {
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<Styles>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomItem {
    pub id: ItemId,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_inline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<Styles>,
}

/// Kind-specific section content. On the wire: `"type"` + `"data"`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Payload {
    Personal(PersonalInfo),
    Education(Vec<EducationItem>),
    Work(Vec<WorkItem>),
    Skills(Vec<SkillItem>),
    Projects(Vec<ProjectItem>),
    Custom(Vec<CustomItem>),
}

impl Payload {
    pub fn kind(&self) -> SectionKind {
        match self {
            Payload::Personal(_) => SectionKind::Personal,
            Payload::Education(_) => SectionKind::Education,
            Payload::Work(_) => SectionKind::Work,
            Payload::Skills(_) => SectionKind::Skills,
            Payload::Projects(_) => SectionKind::Projects,
            Payload::Custom(_) => SectionKind::Custom,
        }
    }

    pub fn item_ids(&self) -> Vec<&ItemId> {
        match self {
            Payload::Personal(_) => Vec::new(),
            Payload::Education(items) => items.iter().map(|i| &i.id).collect(),
            Payload::Work(items) => items.iter().map(|i| &i.id).collect(),
            Payload::Skills(items) => items.iter().map(|i| &i.id).collect(),
            Payload::Projects(items) => items.iter().map(|i| &i.id).collect(),
            Payload::Custom(items) => items.iter().map(|i| &i.id).collect(),
        }
    }

    /// Mutable access to the `styles` slot of one item, `None` if the item is absent.
    pub(crate) fn item_styles_mut(&mut self, id: &ItemId) -> Option<&mut Option<Styles>> {
        match self {
            Payload::Personal(_) => None,
            Payload::Education(items) => items.iter_mut().find(|i| &i.id == id).map(|i| &mut i.styles),
            Payload::Work(items) => items.iter_mut().find(|i| &i.id == id).map(|i| &mut i.styles),
            Payload::Skills(items) => items.iter_mut().find(|i| &i.id == id).map(|i| &mut i.styles),
            Payload::Projects(items) => items.iter_mut().find(|i| &i.id == id).map(|i| &mut i.styles),
            Payload::Custom(items) => items.iter_mut().find(|i| &i.id == id).map(|i| &mut i.styles),
        }
    }

    /// Rewrite every item id through `fresh`, used when a section is duplicated.
    pub(crate) fn reassign_item_ids(&mut self, mut fresh: impl FnMut() -> ItemId) {
        match self {
            Payload::Personal(_) => {}
            Payload::Education(items) => items.iter_mut().for_each(|i| i.id = fresh()),
            Payload::Work(items) => items.iter_mut().for_each(|i| i.id = fresh()),
            Payload::Skills(items) => items.iter_mut().for_each(|i| i.id = fresh()),
            Payload::Projects(items) => items.iter_mut().for_each(|i| i.id = fresh()),
            Payload::Custom(items) => items.iter_mut().for_each(|i| i.id = fresh()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    pub order: i64,
    #[serde(default, rename = "source")]
    pub origin: Origin,
    #[serde(flatten)]
    pub payload: Payload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<Styles>,
}

fn default_visible() -> bool {
    true
}

impl Section {
    pub fn kind(&self) -> SectionKind {
        self.payload.kind()
    }
}
