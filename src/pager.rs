//! Greedy page partitioning over measured blocks.

use crate::config::{LayoutSettings, PageGeometry};
use crate::document::Document;
use crate::error::Result;
use crate::measure::Measure;
use crate::model::SectionId;
use crate::render::{Block, render_visible};

/// One block's slot on a page. `index` points into the block list the
/// pagination was computed from; `height` includes the inter-section margin.
#[derive(Clone, Debug, PartialEq)]
pub struct PagedBlock {
    pub section_id: SectionId,
    pub index: usize,
    pub height: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    pub blocks: Vec<PagedBlock>,
    /// Sum of block heights on this page.
    pub height: f32,
}

impl Page {
    /// True for the single-oversized-block case: the page holds more than `usable_height`.
    pub fn overflows(&self, usable_height: f32) -> bool {
        self.height > usable_height
    }

    pub fn section_ids(&self) -> impl Iterator<Item = &SectionId> {
        self.blocks.iter().map(|b| &b.section_id)
    }
}

/// Partition measured blocks into pages.
///
/// Single pass, no backtracking: a block moves to a fresh page only when it
/// would push a non-empty page strictly past `usable_height`. Blocks are never
/// split; an oversized block sits alone on its own page. Empty input still
/// yields one empty page.
pub fn paginate(measured: &[(SectionId, f32)], usable_height: f32, section_margin: f32) -> Vec<Page> {
    let mut pages = Vec::new();
    let mut current = Page::default();

    for (index, (section_id, measured_height)) in measured.iter().enumerate() {
        let block_height = measured_height + section_margin;
        if !current.blocks.is_empty() && current.height + block_height > usable_height {
            pages.push(std::mem::take(&mut current));
        }
        current.blocks.push(PagedBlock {
            section_id: section_id.clone(),
            index,
            height: block_height,
        });
        current.height += block_height;
    }

    if !current.blocks.is_empty() || pages.is_empty() {
        pages.push(current);
    }
    pages
}

/// A complete pagination pass and the parameters it was computed under.
#[derive(Clone, Debug, PartialEq)]
pub struct Pagination {
    pub pages: Vec<Page>,
    pub usable_height: f32,
    pub container_width: f32,
    pub section_margin: f32,
}

impl Pagination {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page number (0-based) a section landed on, if it was paginated at all.
    pub fn page_of(&self, id: &SectionId) -> Option<usize> {
        self.pages
            .iter()
            .position(|p| p.blocks.iter().any(|b| &b.section_id == id))
    }

    /// Section ids per page, the shape most callers and tests compare on.
    pub fn assignment(&self) -> Vec<Vec<SectionId>> {
        self.pages
            .iter()
            .map(|p| p.section_ids().cloned().collect())
            .collect()
    }
}

/// Render, measure and paginate every visible section of `document`.
///
/// Blocks are measured one after another at the content width derived from
/// `container_width`. The display `scale` is never consulted. Any measurement
/// failure aborts the whole pass.
pub fn paginate_document(
    document: &Document,
    settings: &LayoutSettings,
    geometry: &PageGeometry,
    container_width: f32,
    measurer: &mut impl Measure,
) -> Result<(Vec<Block>, Pagination)> {
    let t0 = std::time::Instant::now();
    let settings = settings.clamped();
    let blocks = render_visible(document, &settings);
    let content_width = geometry.content_width(container_width);

    let mut measured = Vec::with_capacity(blocks.len());
    for block in &blocks {
        let height = measurer.measure(block, content_width)?;
        measured.push((block.section_id.clone(), height.max(0.0)));
    }

    let usable_height = geometry.usable_height(container_width);
    let section_margin = settings.section_margin();
    let pages = paginate(&measured, usable_height, section_margin);

    log::debug!(
        "paginate_document: {} blocks → {} pages (H={usable_height:.1}px, margin={section_margin:.1}px) in {:.1}ms",
        blocks.len(),
        pages.len(),
        t0.elapsed().as_secs_f64() * 1000.0,
    );

    Ok((
        blocks,
        Pagination {
            pages,
            usable_height,
            container_width,
            section_margin,
        },
    ))
}
