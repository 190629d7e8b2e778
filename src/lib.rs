mod config;
mod document;
mod error;
mod fonts;
mod interchange;
mod layout;
mod measure;
mod model;
mod pager;
mod pdf;
mod preview;
mod render;
mod store;

pub use config::{LayoutSettings, PT_PER_PX, PX_PER_INCH, PageGeometry};
pub use document::Document;
pub use error::{Error, Result};
pub use fonts::{DEFAULT_FAMILIES, FaceMetrics, FontMetrics};
pub use interchange::{Imported, from_json, to_json};
pub use layout::{BlockLayout, Placed, lay_out};
pub use measure::{FixedHeights, Measure, Surface, TextMeasurer};
pub use model::{
    CustomItem, EducationItem, ItemId, Origin, Payload, PersonalInfo, ProjectItem, Section, SectionId, SectionKind,
    SkillItem, Styles, TextStyle, WorkItem, parse_color,
};
pub use pager::{Page, PagedBlock, Pagination, paginate, paginate_document};
pub use pdf::{ExportOptions, export_pdf};
pub use preview::{DEFAULT_DEBOUNCE, Debouncer, Preview};
pub use render::{Align, Block, LINK_COLOR, Node, Photo, Rgb, SkillCell, Span, Tone, render, render_visible, skill_fraction};
pub use store::{Resume, ResumeStore, ResumeSummary};

use std::path::Path;
use std::time::Instant;

/// Paginate and export `document` with the given fonts. This is the whole
/// pipeline behind the "export current preview" action.
pub fn export_with(
    document: &Document,
    settings: &LayoutSettings,
    container_width: f32,
    metrics: FontMetrics,
    options: &ExportOptions,
) -> Result<Vec<u8>> {
    let t0 = Instant::now();
    let geometry = PageGeometry::a4();
    let mut measurer = TextMeasurer::new(metrics);
    let (blocks, pagination) = paginate_document(document, settings, &geometry, container_width, &mut measurer)?;
    let t_paginate = t0.elapsed();

    let bytes = export_pdf(&pagination, &blocks, measurer.metrics(), &geometry, options)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: paginate={:.1}ms, export={:.1}ms, total={:.1}ms ({} pages, {} bytes)",
        t_paginate.as_secs_f64() * 1000.0,
        (t_total - t_paginate).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        pagination.page_count(),
        bytes.len(),
    );
    Ok(bytes)
}

/// [`export_with`] using the system fonts named by `RESUME_FONT_FAMILY` and a
/// white background.
pub fn export(document: &Document, settings: &LayoutSettings, container_width: f32) -> Result<Vec<u8>> {
    export_with(
        document,
        settings,
        container_width,
        FontMetrics::from_env(),
        &ExportOptions::default(),
    )
}

/// Read an interchange file and write the exported PDF. Settings embedded in
/// the file win over the defaults.
pub fn convert_json_to_pdf(input: &Path, output: &Path, container_width: Option<f32>) -> Result<()> {
    let t0 = Instant::now();

    let text = std::fs::read_to_string(input)?;
    let imported = from_json(&text)?;
    let t_import = t0.elapsed();

    let settings = imported.settings.unwrap_or_default();
    let width = container_width.unwrap_or(PageGeometry::a4().width);
    let bytes = export(&imported.document, &settings, width)?;
    let t_export = t0.elapsed();

    std::fs::write(output, &bytes)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: import={:.1}ms, export={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
        t_import.as_secs_f64() * 1000.0,
        (t_export - t_import).as_secs_f64() * 1000.0,
        (t_total - t_export).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(())
}
