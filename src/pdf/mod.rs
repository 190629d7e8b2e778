mod draw;
mod images;

use std::collections::{HashMap, HashSet};

use pdf_writer::{Filter, Name, Pdf, Rect, Ref, Str};

use crate::config::PageGeometry;
use crate::error::{Error, Result};
use crate::fonts::{EmbeddedFont, FontMetrics, embed_face};
use crate::layout::{BlockLayout, Placed, lay_out};
use crate::pager::Pagination;
use crate::render::{Block, Rgb};

use draw::{ImageXObject, PageCanvas};

#[derive(Clone, Debug)]
pub struct ExportOptions {
    /// Painted over every page before content. Opaque white unless overridden.
    pub background: Rgb,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            background: [0xff, 0xff, 0xff],
        }
    }
}

/// Write one PDF page per page of `pagination`.
///
/// Blocks are laid out exactly as they were measured (same layout pass, same
/// content width) and stacked in pager order with the inter-section margin
/// between them. The container-px layout is mapped onto the physical page by a
/// uniform scale, so page boundaries are the pager's. Any unreadable photo
/// aborts the export before a single byte is produced.
pub fn export_pdf(
    pagination: &Pagination,
    blocks: &[Block],
    metrics: &FontMetrics,
    geometry: &PageGeometry,
    options: &ExportOptions,
) -> Result<Vec<u8>> {
    let t0 = std::time::Instant::now();
    let cw = pagination.container_width;
    if !cw.is_finite() || cw <= 0.0 {
        return Err(Error::ExportCapture(format!("invalid container width {cw}")));
    }

    // Phase 1: lay out every paged block with the measuring pass
    let content_width = geometry.content_width(cw);
    let mut layouts: Vec<Vec<BlockLayout>> = Vec::with_capacity(pagination.pages.len());
    for page in &pagination.pages {
        let mut page_layouts = Vec::with_capacity(page.blocks.len());
        for paged in &page.blocks {
            let block = blocks
                .get(paged.index)
                .filter(|b| b.section_id == paged.section_id)
                .ok_or_else(|| {
                    Error::ExportCapture(format!("section {} is not among the rendered blocks", paged.section_id))
                })?;
            page_layouts.push(lay_out(block, content_width, metrics));
        }
        layouts.push(page_layouts);
    }
    let t_layout = t0.elapsed();

    // Phase 2: decode photos; a failure here leaves nothing behind
    let mut photos: Vec<(&str, images::DecodedImage)> = Vec::new();
    for item in layouts.iter().flatten().flat_map(|l| l.items.iter()) {
        if let Placed::Image { photo, .. } = item {
            if photos.iter().all(|(url, _)| *url != photo.data_url) {
                photos.push((photo.data_url.as_str(), images::decode_data_url(&photo.data_url)?));
            }
        }
    }
    let t_images = t0.elapsed();

    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };
    let catalog_id = alloc();
    let pages_id = alloc();

    // Phase 3: embed the faces that are actually used
    let mut used: [HashSet<char>; 2] = [HashSet::new(), HashSet::new()];
    for item in layouts.iter().flatten().flat_map(|l| l.items.iter()) {
        if let Placed::Glyphs { text, bold, .. } = item {
            used[usize::from(*bold)].extend(text.chars());
        }
    }
    let regular: Option<EmbeddedFont> = (!used[0].is_empty())
        .then(|| embed_face(&mut pdf, &metrics.regular, "F1".into(), &used[0], &mut alloc));
    let bold: Option<EmbeddedFont> = (!used[1].is_empty())
        .then(|| embed_face(&mut pdf, &metrics.bold, "F2".into(), &used[1], &mut alloc));
    let t_fonts = t0.elapsed();

    let mut image_xobjects: HashMap<String, ImageXObject> = HashMap::new();
    let mut xobject_refs: Vec<(String, Ref)> = Vec::new();
    for (i, (url, img)) in photos.iter().enumerate() {
        let xobj_ref = images::embed_image(&mut pdf, img, &mut alloc);
        let pdf_name = format!("Im{}", i + 1);
        xobject_refs.push((pdf_name.clone(), xobj_ref));
        image_xobjects.insert(
            url.to_string(),
            ImageXObject {
                pdf_name,
                width: img.width,
                height: img.height,
            },
        );
    }

    // Phase 4: draw pages
    let page_w = geometry.width_pt();
    let page_h = geometry.height_pt();
    let k = page_w / cw;
    let ratio = geometry.container_ratio(cw);
    let (left, top) = (geometry.margin_left * ratio, geometry.margin_top * ratio);

    let mut canvases = Vec::with_capacity(layouts.len());
    for (page, page_layouts) in pagination.pages.iter().zip(&layouts) {
        let mut canvas = PageCanvas::new(k, page_h, metrics, regular.as_ref(), bold.as_ref(), &image_xobjects);
        canvas.background(options.background, page_w);
        let mut y = top;
        for (paged, layout) in page.blocks.iter().zip(page_layouts) {
            canvas.block(layout, left, y);
            y += paged.height;
        }
        canvases.push(canvas);
    }
    let t_draw = t0.elapsed();

    // Phase 5: assemble
    let n = canvases.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    let page_annot_refs: Vec<Vec<Ref>> = canvases
        .iter()
        .map(|canvas| {
            canvas
                .links
                .iter()
                .map(|link| {
                    let annot_ref = alloc();
                    let mut annot = pdf.annotation(annot_ref);
                    annot
                        .subtype(pdf_writer::types::AnnotationType::Link)
                        .rect(link.rect)
                        .border(0.0, 0.0, 0.0, None);
                    annot
                        .action()
                        .action_type(pdf_writer::types::ActionType::Uri)
                        .uri(Str(link.url.as_bytes()));
                    annot_ref
                })
                .collect()
        })
        .collect();

    for (i, canvas) in canvases.into_iter().enumerate() {
        let raw = canvas.content.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    let font_pairs: Vec<(&str, Ref)> = [regular.as_ref(), bold.as_ref()]
        .into_iter()
        .flatten()
        .map(|f| (f.pdf_name.as_str(), f.font_ref))
        .collect();

    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, page_w, page_h))
            .parent(pages_id)
            .contents(content_ids[i]);
        if !page_annot_refs[i].is_empty() {
            page.annotations(page_annot_refs[i].iter().copied());
        }
        let mut resources = page.resources();
        if !font_pairs.is_empty() {
            let mut fonts = resources.fonts();
            for (name, font_ref) in &font_pairs {
                fonts.pair(Name(name.as_bytes()), *font_ref);
            }
        }
        if !xobject_refs.is_empty() {
            let mut xobjects = resources.x_objects();
            for (name, xobj_ref) in &xobject_refs {
                xobjects.pair(Name(name.as_bytes()), *xobj_ref);
            }
        }
    }
    let t_assembly = t0.elapsed();

    log::info!(
        "Export phases: layout={:.1}ms, images={:.1}ms, font_embed={:.1}ms, draw={:.1}ms, assembly={:.1}ms ({} pages)",
        t_layout.as_secs_f64() * 1000.0,
        (t_images - t_layout).as_secs_f64() * 1000.0,
        (t_fonts - t_images).as_secs_f64() * 1000.0,
        (t_draw - t_fonts).as_secs_f64() * 1000.0,
        (t_assembly - t_draw).as_secs_f64() * 1000.0,
        n,
    );

    Ok(pdf.finish())
}
