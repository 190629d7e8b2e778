//! JSON interchange: `{ "modules": [...], "timestamp": "...", "settings"?: {...} }`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::LayoutSettings;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::model::Section;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    modules: &'a [Section],
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    settings: Option<&'a LayoutSettings>,
}

#[derive(Deserialize)]
struct Envelope {
    modules: Vec<Section>,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    settings: Option<LayoutSettings>,
}

/// A successfully imported file.
#[derive(Debug)]
pub struct Imported {
    pub document: Document,
    pub timestamp: DateTime<Utc>,
    pub settings: Option<LayoutSettings>,
}

/// Serialize a document, pretty-printed with two-space indentation.
pub fn to_json(document: &Document, timestamp: DateTime<Utc>, settings: Option<&LayoutSettings>) -> Result<String> {
    let envelope = EnvelopeRef {
        modules: document.sections(),
        timestamp,
        settings,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Parse an interchange file into a fresh document.
///
/// Parse failures (including unknown section types) are `ImportFormat`;
/// duplicate ids or a second personal section are `InvariantViolation`. Nothing
/// is repaired.
pub fn from_json(text: &str) -> Result<Imported> {
    let envelope: Envelope = serde_json::from_str(text).map_err(|e| Error::ImportFormat(e.to_string()))?;
    let document = Document::from_sections(envelope.modules)?;
    log::debug!(
        "from_json: {} sections, timestamp {}",
        document.sections().len(),
        envelope.timestamp
    );
    Ok(Imported {
        document,
        timestamp: envelope.timestamp,
        settings: envelope.settings,
    })
}
