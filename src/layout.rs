//! Geometry for a rendered block. Both the measurement service and the PDF
//! exporter read the same `BlockLayout`, so measured heights and exported pages
//! always agree.

use crate::fonts::{FaceMetrics, FontMetrics, is_wide};
use crate::render::{Align, Block, HEADING_LINE_HEIGHT, Node, PHOTO_GAP, PHOTO_SIZE, Photo, Rgb, SkillCell, Span, Tone};

pub const SKILL_COLUMN_GAP: f32 = 16.0;
pub const SKILL_ROW_GAP: f32 = 16.0;
pub const SKILL_NAME_WIDTH: f32 = 80.0;
pub const SKILL_BAR_HEIGHT: f32 = 8.0;
pub const SKILL_LABEL_GAP: f32 = 8.0;

const SPLIT_GUTTER: f32 = 8.0;
const TAG_PAD_X: f32 = 7.0;
const TAG_GAP: f32 = 8.0;
const DIVIDER_COLOR: Rgb = [0xd9, 0xd9, 0xd9];
const BAR_TRACK_COLOR: Rgb = [0xe5, 0xe7, 0xeb];
const BAR_FILL_COLOR: Rgb = [0x25, 0x63, 0xeb];
const TAG_FILL_COLOR: Rgb = [0xe6, 0xf4, 0xff];
const TAG_TEXT_COLOR: Rgb = [0x09, 0x58, 0xd9];

// Slack for float accumulation when deciding whether a word still fits.
const FIT_EPSILON: f32 = 0.01;

/// One positioned primitive. Coordinates are block-relative CSS px, y down.
#[derive(Clone, Debug, PartialEq)]
pub enum Placed {
    Glyphs {
        x: f32,
        baseline: f32,
        text: String,
        size: f32,
        bold: bool,
        color: Rgb,
        link: Option<String>,
    },
    Rule {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Rgb,
    },
    RoundRect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        radius: f32,
        color: Rgb,
    },
    Image {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        photo: Photo,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct BlockLayout {
    pub width: f32,
    pub height: f32,
    pub items: Vec<Placed>,
}

struct Chunk {
    text: String,
    bold: bool,
    color: Rgb,
    link: Option<String>,
    x: f32,
    width: f32,
}

impl Chunk {
    fn same_style(&self, span: &Span) -> bool {
        self.bold == span.bold && self.color == span.resolved_color() && self.link == link_of(span)
    }
}

fn link_of(span: &Span) -> Option<String> {
    (span.tone == Tone::Link).then(|| span.text.trim().to_string())
}

pub(crate) struct Line {
    chunks: Vec<Chunk>,
    width: f32,
}

/// Split a whitespace-free word into break opportunities: runs of ordinary
/// characters stay together, wide (CJK) characters stand alone.
fn atoms(word: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut run_start = 0;
    for (i, ch) in word.char_indices() {
        if is_wide(ch) {
            if run_start < i {
                out.push(&word[run_start..i]);
            }
            out.push(&word[i..i + ch.len_utf8()]);
            run_start = i + ch.len_utf8();
        }
    }
    if run_start < word.len() {
        out.push(&word[run_start..]);
    }
    out
}

struct Wrapper {
    size: f32,
    max_width: f32,
    lines: Vec<Line>,
    chunks: Vec<Chunk>,
    x: f32,
}

impl Wrapper {
    fn break_line(&mut self) {
        let width = self.chunks.last().map(|c| c.x + c.width).unwrap_or(0.0);
        self.lines.push(Line {
            chunks: std::mem::take(&mut self.chunks),
            width,
        });
        self.x = 0.0;
    }

    /// Place `text` after an optional joining space, wrapping first if it would overflow.
    fn place(&mut self, span: &Span, text: &str, width: f32, space_before: f32) {
        let spaced = space_before > 0.0 && !self.chunks.is_empty();
        let x = if spaced { self.x + space_before } else { self.x };
        if !self.chunks.is_empty() && x + width > self.max_width + FIT_EPSILON {
            self.break_line();
            self.push(span, text, 0.0, width, false);
        } else {
            self.push(span, text, x, width, spaced);
        }
    }

    /// Words wider than the whole line break between characters.
    fn place_by_char(&mut self, span: &Span, word: &str, face: &FaceMetrics, space_before: f32) {
        let mut buf = [0u8; 4];
        for (i, ch) in word.chars().enumerate() {
            let w = face.char_width_1000(ch) * self.size / 1000.0;
            let gap = if i == 0 { space_before } else { 0.0 };
            self.place(span, ch.encode_utf8(&mut buf), w, gap);
        }
    }

    fn push(&mut self, span: &Span, text: &str, x: f32, width: f32, spaced: bool) {
        self.x = x + width;
        if let Some(last) = self.chunks.last_mut().filter(|c| c.same_style(span)) {
            if spaced {
                last.text.push(' ');
            }
            last.text.push_str(text);
            last.width = x + width - last.x;
            return;
        }
        self.chunks.push(Chunk {
            text: text.to_string(),
            bold: span.bold,
            color: span.resolved_color(),
            link: link_of(span),
            x,
            width,
        });
    }

    fn finish(mut self) -> Vec<Line> {
        if !self.chunks.is_empty() {
            self.break_line();
        }
        self.lines
    }
}

/// Greedy word wrap across styled spans.
///
/// No space is inserted between spans unless the source text has whitespace at
/// the boundary ("bold" + ", " gives "bold,"). `\n` forces a break.
pub(crate) fn wrap_spans(spans: &[Span], size: f32, max_width: f32, metrics: &FontMetrics) -> Vec<Line> {
    let mut w = Wrapper {
        size,
        max_width,
        lines: Vec::new(),
        chunks: Vec::new(),
        x: 0.0,
    };
    let mut prev_ended_with_ws = false;
    let mut prev_space_w = 0.0;

    for span in spans {
        let face = metrics.face(span.bold);
        let space_w = face.space_width(size);

        for (seg_idx, segment) in span.text.split('\n').enumerate() {
            if seg_idx > 0 {
                w.break_line();
                prev_ended_with_ws = false;
            }
            let starts_with_ws = segment.starts_with(char::is_whitespace);
            for (i, word) in segment.split_whitespace().enumerate() {
                // the space belongs to whichever span holds the whitespace character
                let space = if i > 0 || starts_with_ws {
                    space_w
                } else if prev_ended_with_ws {
                    prev_space_w
                } else {
                    0.0
                };
                for (j, atom) in atoms(word).into_iter().enumerate() {
                    let gap = if j == 0 { space } else { 0.0 };
                    let atom_w = face.text_width(atom, size);
                    if atom_w > max_width {
                        w.place_by_char(span, atom, face, gap);
                    } else {
                        w.place(span, atom, atom_w, gap);
                    }
                }
            }
            if !segment.is_empty() {
                prev_ended_with_ws = segment.ends_with(char::is_whitespace);
            }
        }
        prev_space_w = space_w;
    }
    w.finish()
}

struct Layouter<'a> {
    metrics: &'a FontMetrics,
    items: Vec<Placed>,
}

impl Layouter<'_> {
    fn baseline(&self, line_top: f32, line_box: f32, size: f32) -> f32 {
        let face = &self.metrics.regular;
        line_top + (line_box - size * face.line_h_ratio) / 2.0 + size * face.ascender_ratio
    }

    fn emit_line(&mut self, line: &Line, x: f32, top: f32, line_box: f32, size: f32) {
        let baseline = self.baseline(top, line_box, size);
        for chunk in &line.chunks {
            self.items.push(Placed::Glyphs {
                x: x + chunk.x,
                baseline,
                text: chunk.text.clone(),
                size,
                bold: chunk.bold,
                color: chunk.color,
                link: chunk.link.clone(),
            });
        }
    }

    /// Wrapped paragraph. Returns its height without trailing space.
    #[allow(clippy::too_many_arguments)]
    fn paragraph(&mut self, spans: &[Span], size: f32, line_box: f32, align: Align, x: f32, y: f32, width: f32) -> f32 {
        let lines = wrap_spans(spans, size, width, self.metrics);
        for (i, line) in lines.iter().enumerate() {
            let offset = match align {
                Align::Left => 0.0,
                Align::Center => ((width - line.width) / 2.0).max(0.0),
            };
            self.emit_line(line, x + offset, y + i as f32 * line_box, line_box, size);
        }
        lines.len() as f32 * line_box
    }

    /// Lay out one node at (x, y). Returns the vertical advance, which is
    /// negative for negative gaps.
    fn node(&mut self, node: &Node, x: f32, y: f32, width: f32) -> f32 {
        match node {
            Node::Title { text, size } => {
                let span = Span {
                    bold: true,
                    ..Span::plain(text.clone())
                };
                self.paragraph(&[span], *size, size * HEADING_LINE_HEIGHT, Align::Left, x, y, width)
            }
            Node::Gap(h) => *h,
            Node::Divider => {
                self.items.push(Placed::Rule {
                    x,
                    y,
                    w: width,
                    h: 1.0,
                    color: DIVIDER_COLOR,
                });
                1.0
            }
            Node::Text {
                spans,
                size,
                line_height,
                align,
                space_after,
            } => self.paragraph(spans, *size, size * line_height, *align, x, y, width) + space_after,
            Node::Split {
                left,
                right,
                size,
                line_height,
                space_after,
            } => self.split(left, right, *size, size * line_height, x, y, width) + space_after,
            Node::SkillGrid {
                rows,
                size,
                line_height,
            } => self.skill_grid(rows, *size, size * line_height, x, y, width),
            Node::Tags {
                label,
                tags,
                size,
                line_height,
                color,
            } => self.tags(label, tags, *size, size * line_height, *color, x, y, width),
            Node::Header { lines, photo } => self.header(lines, photo.as_ref(), x, y, width),
        }
    }

    /// Left text with a right-aligned trailer such as a date range. The trailer
    /// wraps within half the row unless the left side is empty.
    #[allow(clippy::too_many_arguments)]
    fn split(&mut self, left: &[Span], right: &[Span], size: f32, line_box: f32, x: f32, y: f32, width: f32) -> f32 {
        let right_cap = if left.iter().all(|s| s.text.trim().is_empty()) {
            width
        } else {
            ((width - SPLIT_GUTTER) / 2.0).max(0.0)
        };
        let right_lines = wrap_spans(right, size, right_cap, self.metrics);
        let right_w = right_lines.iter().map(|l| l.width).fold(0.0, f32::max);
        let left_w = if right_lines.is_empty() {
            width
        } else {
            (width - right_w - SPLIT_GUTTER).max(0.0)
        };
        let left_h = self.paragraph(left, size, line_box, Align::Left, x, y, left_w);
        for (i, line) in right_lines.iter().enumerate() {
            self.emit_line(line, x + width - line.width, y + i as f32 * line_box, line_box, size);
        }
        left_h.max(right_lines.len() as f32 * line_box)
    }

    fn skill_grid(&mut self, rows: &[SkillCell], size: f32, line_box: f32, x: f32, y: f32, width: f32) -> f32 {
        let col_w = ((width - SKILL_COLUMN_GAP) / 2.0).max(0.0);
        let mut cursor = y;
        for (r, pair) in rows.chunks(2).enumerate() {
            if r > 0 {
                cursor += SKILL_ROW_GAP;
            }
            let mut row_h: f32 = 0.0;
            for (c, cell) in pair.iter().enumerate() {
                let cx = x + c as f32 * (col_w + SKILL_COLUMN_GAP);
                row_h = row_h.max(self.skill_cell(cell, size, line_box, cx, cursor, col_w));
            }
            cursor += row_h;
        }
        cursor - y
    }

    #[allow(clippy::too_many_arguments)]
    fn skill_cell(&mut self, cell: &SkillCell, size: f32, line_box: f32, x: f32, y: f32, width: f32) -> f32 {
        let name_h = self.paragraph(
            std::slice::from_ref(&cell.name),
            size,
            line_box,
            Align::Left,
            x,
            y,
            SKILL_NAME_WIDTH,
        );
        let label = Span::plain(cell.label.clone());
        let label_w = self.metrics.regular.text_width(&cell.label, size);
        let bar_x = x + SKILL_NAME_WIDTH;
        let bar_w = (width - SKILL_NAME_WIDTH - SKILL_LABEL_GAP - label_w).max(0.0);
        let bar_y = y + (line_box - SKILL_BAR_HEIGHT) / 2.0;
        let radius = SKILL_BAR_HEIGHT / 2.0;

        self.items.push(Placed::RoundRect {
            x: bar_x,
            y: bar_y,
            w: bar_w,
            h: SKILL_BAR_HEIGHT,
            radius,
            color: BAR_TRACK_COLOR,
        });
        if cell.fraction > 0.0 {
            self.items.push(Placed::RoundRect {
                x: bar_x,
                y: bar_y,
                w: bar_w * cell.fraction,
                h: SKILL_BAR_HEIGHT,
                radius,
                color: BAR_FILL_COLOR,
            });
        }
        let label_x = bar_x + bar_w + SKILL_LABEL_GAP;
        self.paragraph(&[label], size, line_box, Align::Left, label_x, y, label_w + FIT_EPSILON);
        name_h.max(line_box)
    }

    #[allow(clippy::too_many_arguments)]
    fn tags(
        &mut self,
        label: &Span,
        tags: &[String],
        size: f32,
        line_box: f32,
        color: Option<Rgb>,
        x: f32,
        y: f32,
        width: f32,
    ) -> f32 {
        let label_lines = wrap_spans(std::slice::from_ref(label), size, width, self.metrics);
        for (i, line) in label_lines.iter().enumerate() {
            self.emit_line(line, x, y + i as f32 * line_box, line_box, size);
        }
        // pills continue on the label's last line
        let mut row_top = y + label_lines.len().saturating_sub(1) as f32 * line_box;
        let mut row_h = if label_lines.is_empty() { 0.0 } else { line_box };
        let mut cx = label_lines.last().map(|l| l.width).unwrap_or(0.0);

        let pill_h = size * 1.4;
        let text_color = color.unwrap_or(TAG_TEXT_COLOR);
        let inner_w = (width - 2.0 * TAG_PAD_X).max(0.0);
        for tag in tags {
            let lines = wrap_spans(&[Span::plain(tag.clone())], size, inner_w, self.metrics);
            let text_w = lines.iter().map(|l| l.width).fold(0.0, f32::max);
            let pill_w = text_w + 2.0 * TAG_PAD_X;
            if cx > 0.0 && cx + pill_w > width + FIT_EPSILON {
                row_top += row_h.max(line_box) + TAG_GAP;
                row_h = 0.0;
                cx = 0.0;
            }
            let rows = lines.len().max(1) as f32;
            self.items.push(Placed::RoundRect {
                x: x + cx,
                y: row_top + (line_box - pill_h) / 2.0,
                w: pill_w,
                h: pill_h + (rows - 1.0) * line_box,
                radius: 4.0,
                color: TAG_FILL_COLOR,
            });
            for (i, line) in lines.iter().enumerate() {
                let baseline = self.baseline(row_top + i as f32 * line_box, line_box, size);
                for chunk in &line.chunks {
                    self.items.push(Placed::Glyphs {
                        x: x + cx + TAG_PAD_X + chunk.x,
                        baseline,
                        text: chunk.text.clone(),
                        size,
                        bold: false,
                        color: text_color,
                        link: None,
                    });
                }
            }
            row_h = row_h.max(rows * line_box);
            cx += pill_w + TAG_GAP;
        }
        row_top + row_h.max(line_box) - y
    }

    fn header(&mut self, lines: &[Node], photo: Option<&Photo>, x: f32, y: f32, width: f32) -> f32 {
        let column_w = match photo {
            Some(_) => (width - PHOTO_SIZE - PHOTO_GAP).max(0.0),
            None => width,
        };

        // lay the column out once to learn its height, then shift it to centre
        // against the photo
        let start = self.items.len();
        let mut cursor = y;
        for line in lines {
            cursor += self.node(line, x, cursor, column_w);
        }
        let column_h = (cursor - y).max(0.0);

        let Some(photo) = photo else {
            return column_h;
        };
        let height = column_h.max(PHOTO_SIZE);
        let shift = (height - column_h) / 2.0;
        if shift > 0.0 {
            for item in &mut self.items[start..] {
                shift_down(item, shift);
            }
        }
        self.items.push(Placed::Image {
            x: x + width - PHOTO_SIZE,
            y: y + (height - PHOTO_SIZE) / 2.0,
            w: PHOTO_SIZE,
            h: PHOTO_SIZE,
            photo: photo.clone(),
        });
        height
    }
}

fn shift_down(item: &mut Placed, dy: f32) {
    match item {
        Placed::Glyphs { baseline, .. } => *baseline += dy,
        Placed::Rule { y, .. } | Placed::RoundRect { y, .. } | Placed::Image { y, .. } => *y += dy,
    }
}

/// Lay a block out at `width`. The height is the natural height of the block's
/// content and is never negative.
pub fn lay_out(block: &Block, width: f32, metrics: &FontMetrics) -> BlockLayout {
    let mut layouter = Layouter {
        metrics,
        items: Vec::new(),
    };
    let mut y = 0.0;
    for node in &block.nodes {
        y += layouter.node(node, 0.0, y, width);
    }
    BlockLayout {
        width,
        height: y.max(0.0),
        items: layouter.items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SectionKind;

    fn block(nodes: Vec<Node>) -> Block {
        Block {
            section_id: "s".into(),
            kind: SectionKind::Custom,
            nodes,
        }
    }

    fn text(s: &str) -> Node {
        Node::Text {
            spans: vec![Span::plain(s)],
            size: 14.0,
            line_height: 1.0,
            align: Align::Left,
            space_after: 0.0,
        }
    }

    fn glyph_texts(layout: &BlockLayout) -> Vec<String> {
        layout
            .items
            .iter()
            .filter_map(|p| match p {
                Placed::Glyphs { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn titled_block_height_adds_up() {
        let b = block(vec![
            Node::Title {
                text: "Skills".into(),
                size: 20.0,
            },
            Node::Gap(16.0),
            Node::Divider,
            Node::Gap(8.0),
            Node::Text {
                spans: vec![Span::plain("Hi")],
                size: 14.0,
                line_height: 1.0,
                align: Align::Left,
                space_after: 14.0,
            },
        ]);
        let layout = lay_out(&b, 700.0, &FontMetrics::builtin());
        assert!((layout.height - 80.0).abs() < 1e-3, "{}", layout.height);
    }

    #[test]
    fn narrower_width_wraps_into_more_lines() {
        let b = block(vec![text("the quick brown fox jumps over the lazy dog")]);
        let m = FontMetrics::builtin();
        let wide = lay_out(&b, 1000.0, &m);
        let narrow = lay_out(&b, 80.0, &m);
        assert_eq!(wide.height, 14.0);
        assert!(narrow.height > wide.height);
        assert_eq!(glyph_texts(&wide), vec!["the quick brown fox jumps over the lazy dog"]);
    }

    #[test]
    fn spans_join_without_inventing_spaces() {
        let m = FontMetrics::builtin();
        let spans = vec![
            Span {
                bold: true,
                ..Span::plain("bold")
            },
            Span::plain(", rest"),
        ];
        let lines = wrap_spans(&spans, 10.0, 500.0, &m);
        assert_eq!(lines.len(), 1);
        let first = &lines[0].chunks[0];
        let second = &lines[0].chunks[1];
        assert!((second.x - (first.x + first.width)).abs() < 1e-4);
        assert_eq!(second.text, ", rest");
    }

    #[test]
    fn newline_forces_break() {
        let m = FontMetrics::builtin();
        let lines = wrap_spans(&[Span::plain("one\ntwo\n\nthree")], 10.0, 500.0, &m);
        assert_eq!(lines.len(), 4);
        assert!(lines[2].chunks.is_empty());
    }

    #[test]
    fn cjk_breaks_between_characters() {
        let m = FontMetrics::builtin();
        // each ideograph is one em (10 px); three fit per 30 px line
        let lines = wrap_spans(&[Span::plain("北京大学计算机")], 10.0, 30.0, &m);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].chunks[0].text, "北京大");
    }

    #[test]
    fn overlong_word_breaks_by_character() {
        let m = FontMetrics::builtin();
        let lines = wrap_spans(&[Span::plain("abcdefghijklmnop")], 10.0, 30.0, &m);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.width <= 30.0 + FIT_EPSILON));
    }

    #[test]
    fn negative_gap_never_yields_negative_height() {
        let b = block(vec![Node::Gap(-40.0), text("x")]);
        let layout = lay_out(&b, 300.0, &FontMetrics::builtin());
        assert_eq!(layout.height, 0.0);
    }

    #[test]
    fn split_row_puts_date_on_the_right() {
        let b = block(vec![Node::Split {
            left: vec![Span::plain("Acme")],
            right: vec![Span::plain("2020 - 2023")],
            size: 14.0,
            line_height: 1.0,
            space_after: 0.0,
        }]);
        let m = FontMetrics::builtin();
        let layout = lay_out(&b, 500.0, &m);
        let date_w = m.regular.text_width("2020 - 2023", 14.0);
        let date_x = layout.items.iter().find_map(|p| match p {
            Placed::Glyphs { x, text, .. } if text == "2020 - 2023" => Some(*x),
            _ => None,
        });
        assert!((date_x.unwrap() - (500.0 - date_w)).abs() < 1e-3);
        assert_eq!(layout.height, 14.0);
    }

    #[test]
    fn skill_grid_uses_two_columns() {
        let cell = |name: &str, fraction| SkillCell {
            name: Span::plain(name),
            fraction,
            label: "4/5".into(),
        };
        let b = block(vec![Node::SkillGrid {
            rows: vec![cell("Rust", 0.8), cell("Go", 0.6), cell("C", 0.0)],
            size: 14.0,
            line_height: 1.0,
        }]);
        let layout = lay_out(&b, 416.0, &FontMetrics::builtin());
        // two rows of 14 px with a 16 px row gap
        assert_eq!(layout.height, 44.0);
        let tracks: Vec<f32> = layout
            .items
            .iter()
            .filter_map(|p| match p {
                Placed::RoundRect { x, color, .. } if *color == BAR_TRACK_COLOR => Some(*x),
                _ => None,
            })
            .collect();
        assert_eq!(tracks, vec![80.0, 296.0, 80.0]);
        let fills = layout
            .items
            .iter()
            .filter(|p| matches!(p, Placed::RoundRect { color, .. } if *color == BAR_FILL_COLOR))
            .count();
        assert_eq!(fills, 2);
    }

    #[test]
    fn header_is_at_least_photo_tall() {
        let b = block(vec![Node::Header {
            lines: vec![text("Jane")],
            photo: Some(Photo {
                data_url: "data:image/png;base64,".into(),
            }),
        }]);
        let layout = lay_out(&b, 600.0, &FontMetrics::builtin());
        assert_eq!(layout.height, PHOTO_SIZE);
        assert!(layout.items.iter().any(|p| matches!(p, Placed::Image { x, .. } if *x == 600.0 - PHOTO_SIZE)));
    }

    #[test]
    fn link_spans_carry_their_url() {
        let link = Span {
            tone: Tone::Link,
            ..Span::plain("https://example.com")
        };
        let b = block(vec![Node::Text {
            spans: vec![Span::plain("Link: "), link],
            size: 14.0,
            line_height: 1.0,
            align: Align::Left,
            space_after: 0.0,
        }]);
        let layout = lay_out(&b, 600.0, &FontMetrics::builtin());
        let links: Vec<_> = layout
            .items
            .iter()
            .filter_map(|p| match p {
                Placed::Glyphs { link: Some(url), .. } => Some(url.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(links, vec!["https://example.com"]);
    }

    #[test]
    fn tags_wrap_onto_new_rows() {
        let tags: Vec<String> = (0..12).map(|i| format!("Tag{i}")).collect();
        let b = block(vec![Node::Tags {
            label: Span::plain("Tech stack: "),
            tags,
            size: 14.0,
            line_height: 1.0,
            color: None,
        }]);
        let layout = lay_out(&b, 200.0, &FontMetrics::builtin());
        assert!(layout.height > 14.0);
    }

    #[test]
    fn long_date_wraps_instead_of_truncating() {
        let date = "January 2020 - December 2023 and onwards";
        let b = block(vec![Node::Split {
            left: vec![Span::plain("Acme")],
            right: vec![Span::plain(date)],
            size: 14.0,
            line_height: 1.0,
            space_after: 0.0,
        }]);
        let layout = lay_out(&b, 120.0, &FontMetrics::builtin());
        let texts = glyph_texts(&layout);
        assert_eq!(texts[0], "Acme");
        let squash = |s: &str| s.split_whitespace().collect::<String>();
        assert_eq!(squash(&texts[1..].join(" ")), squash(date));
        assert!(layout.height >= 28.0);
        // every trailer line stays inside the row
        for p in &layout.items {
            if let Placed::Glyphs { x, text, .. } = p {
                let w = FontMetrics::builtin().regular.text_width(text, 14.0);
                assert!(*x >= 0.0 && x + w <= 120.0 + 0.5, "{text} at {x}");
            }
        }
    }

    #[test]
    fn wrapped_tag_label_and_wide_pills_stay_in_the_row() {
        let b = block(vec![Node::Tags {
            label: Span::plain("Technologies used on this project: "),
            tags: vec!["Rust".into(), "an unusually long technology name".into()],
            size: 14.0,
            line_height: 1.0,
            color: None,
        }]);
        let width = 120.0;
        let layout = lay_out(&b, width, &FontMetrics::builtin());
        let texts = glyph_texts(&layout);
        let all = texts.join(" ");
        for word in ["Technologies", "project:", "Rust", "unusually", "name"] {
            assert!(all.contains(word), "{word} missing from {texts:?}");
        }
        for p in &layout.items {
            if let Placed::RoundRect { x, w, .. } = p {
                assert!(x + w <= width + 1e-3, "pill at {x} is {w} wide");
            }
        }
        assert!(layout.height > 3.0 * 14.0);
    }
}
