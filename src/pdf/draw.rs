use std::collections::HashMap;

use pdf_writer::{Content, Name, Rect, Str};

use crate::fonts::{EmbeddedFont, FontMetrics};
use crate::layout::{BlockLayout, Placed};
use crate::render::Rgb;

// Control-point offset for approximating a quarter circle with a cubic Bézier.
const KAPPA: f32 = 0.552_284_8;

pub(super) struct LinkAnnotation {
    pub(super) rect: Rect,
    pub(super) url: String,
}

/// An embedded photo and its pixel size (for object-fit: cover).
pub(super) struct ImageXObject {
    pub(super) pdf_name: String,
    pub(super) width: u32,
    pub(super) height: u32,
}

/// Draws block layouts onto one PDF page. Layout coordinates are container px
/// with y down; `k` maps them to points and `page_h` flips the axis.
pub(super) struct PageCanvas<'a> {
    pub(super) content: Content,
    pub(super) links: Vec<LinkAnnotation>,
    k: f32,
    page_h: f32,
    metrics: &'a FontMetrics,
    regular: Option<&'a EmbeddedFont>,
    bold: Option<&'a EmbeddedFont>,
    images: &'a HashMap<String, ImageXObject>,
}

fn set_fill(content: &mut Content, c: Rgb) {
    content.set_fill_rgb(c[0] as f32 / 255.0, c[1] as f32 / 255.0, c[2] as f32 / 255.0);
}

impl<'a> PageCanvas<'a> {
    pub(super) fn new(
        k: f32,
        page_h: f32,
        metrics: &'a FontMetrics,
        regular: Option<&'a EmbeddedFont>,
        bold: Option<&'a EmbeddedFont>,
        images: &'a HashMap<String, ImageXObject>,
    ) -> Self {
        PageCanvas {
            content: Content::new(),
            links: Vec::new(),
            k,
            page_h,
            metrics,
            regular,
            bold,
            images,
        }
    }

    /// Opaque fill over the whole media box, painted before anything else.
    pub(super) fn background(&mut self, color: Rgb, page_w: f32) {
        set_fill(&mut self.content, color);
        self.content.rect(0.0, 0.0, page_w, self.page_h);
        self.content.fill_nonzero();
    }

    fn x(&self, x: f32) -> f32 {
        x * self.k
    }

    fn y(&self, y: f32) -> f32 {
        self.page_h - y * self.k
    }

    /// Draw a block whose top-left corner sits at (`left`, `top`) in container px.
    pub(super) fn block(&mut self, layout: &BlockLayout, left: f32, top: f32) {
        for item in &layout.items {
            match item {
                Placed::Glyphs {
                    x,
                    baseline,
                    text,
                    size,
                    bold,
                    color,
                    link,
                } => self.glyphs(left + x, top + baseline, text, *size, *bold, *color, link.as_deref()),
                Placed::Rule { x, y, w, h, color } => {
                    set_fill(&mut self.content, *color);
                    let (px, py) = (self.x(left + x), self.y(top + y + h));
                    self.content.rect(px, py, w * self.k, h * self.k);
                    self.content.fill_nonzero();
                }
                Placed::RoundRect {
                    x,
                    y,
                    w,
                    h,
                    radius,
                    color,
                } => self.round_rect(left + x, top + y, *w, *h, *radius, *color),
                Placed::Image { x, y, w, h, photo } => self.image(left + x, top + y, *w, *h, &photo.data_url),
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn glyphs(&mut self, x: f32, baseline: f32, text: &str, size: f32, bold: bool, color: Rgb, link: Option<&str>) {
        let Some(font) = (if bold { self.bold.or(self.regular) } else { self.regular.or(self.bold) }) else {
            return;
        };
        let (px, py, pt) = (self.x(x), self.y(baseline), size * self.k);

        set_fill(&mut self.content, color);
        self.content.begin_text();
        self.content.set_font(Name(font.pdf_name.as_bytes()), pt);
        self.content.next_line(px, py);
        self.content.show(Str(&font.encode(text)));
        self.content.end_text();

        if let Some(url) = link {
            let w = self.metrics.face(bold).text_width(text, size) * self.k;
            self.links.push(LinkAnnotation {
                rect: Rect::new(px, py - pt * 0.2, px + w, py + pt * 0.8),
                url: url.to_string(),
            });
        }
    }

    fn round_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32, color: Rgb) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let (x0, y0) = (self.x(x), self.y(y + h));
        let (w, h) = (w * self.k, h * self.k);
        let r = (radius * self.k).min(w / 2.0).min(h / 2.0);
        let c = r * KAPPA;
        let (x1, y1) = (x0 + w, y0 + h);

        set_fill(&mut self.content, color);
        let p = &mut self.content;
        p.move_to(x0 + r, y0);
        p.line_to(x1 - r, y0);
        p.cubic_to(x1 - r + c, y0, x1, y0 + r - c, x1, y0 + r);
        p.line_to(x1, y1 - r);
        p.cubic_to(x1, y1 - r + c, x1 - r + c, y1, x1 - r, y1);
        p.line_to(x0 + r, y1);
        p.cubic_to(x0 + r - c, y1, x0, y1 - r + c, x0, y1 - r);
        p.line_to(x0, y0 + r);
        p.cubic_to(x0, y0 + r - c, x0 + r - c, y0, x0 + r, y0);
        p.close_path();
        p.fill_nonzero();
    }

    /// Photo drawn with object-fit: cover, clipped to its box.
    fn image(&mut self, x: f32, y: f32, w: f32, h: f32, data_url: &str) {
        let Some(img) = self.images.get(data_url) else {
            return;
        };
        let (bx, by, bw, bh) = (self.x(x), self.y(y + h), w * self.k, h * self.k);
        let scale = (bw / img.width as f32).max(bh / img.height as f32);
        let (iw, ih) = (img.width as f32 * scale, img.height as f32 * scale);

        let c = &mut self.content;
        c.save_state();
        c.rect(bx, by, bw, bh);
        c.clip_nonzero();
        c.end_path();
        c.transform([iw, 0.0, 0.0, ih, bx + (bw - iw) / 2.0, by + (bh - ih) / 2.0]);
        c.x_object(Name(img.pdf_name.as_bytes()));
        c.restore_state();
    }
}
