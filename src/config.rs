use serde::{Deserialize, Serialize};

/// CSS pixels per inch. All layout happens in CSS pixels.
pub const PX_PER_INCH: f32 = 96.0;
/// PDF points per CSS pixel.
pub const PT_PER_PX: f32 = 72.0 / PX_PER_INCH;

const MM_PER_INCH: f32 = 25.4;

/// Document-wide typography and spacing. Passed by reference into every
/// render/measure/page call; nothing reads these from ambient state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutSettings {
    /// Overall zoom of the on-screen preview. Applied after measurement.
    pub scale: f32,
    pub line_height: f32,
    pub section_spacing: f32,
    pub divider_spacing: f32,
    pub first_line_spacing: f32,
    pub title_font_size: f32,
    pub content_font_size: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            scale: 1.0,
            line_height: 1.0,
            section_spacing: 1.0,
            divider_spacing: 1.0,
            first_line_spacing: 1.0,
            title_font_size: 20.0,
            content_font_size: 14.0,
        }
    }
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

impl LayoutSettings {
    /// Copy with every field forced into the range its slider allows.
    pub fn clamped(&self) -> Self {
        let d = Self::default();
        Self {
            scale: clamp_or(self.scale, 0.5, 1.5, d.scale),
            line_height: clamp_or(self.line_height, 0.5, 2.0, d.line_height),
            section_spacing: clamp_or(self.section_spacing, 0.0, 1.5, d.section_spacing),
            divider_spacing: clamp_or(self.divider_spacing, -1.5, 1.5, d.divider_spacing),
            first_line_spacing: clamp_or(self.first_line_spacing, 0.5, 1.5, d.first_line_spacing),
            title_font_size: clamp_or(self.title_font_size, 16.0, 32.0, d.title_font_size),
            content_font_size: clamp_or(self.content_font_size, 12.0, 24.0, d.content_font_size),
        }
    }

    /// Margin added after every block (2rem scaled by the spacing slider).
    pub fn section_margin(&self) -> f32 {
        32.0 * self.section_spacing
    }
}

/// Physical page size and margins, in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl PageGeometry {
    pub fn a4() -> Self {
        let mm = PX_PER_INCH / MM_PER_INCH;
        Self {
            width: 210.0 * mm,
            height: 297.0 * mm,
            margin_top: 40.0,
            margin_bottom: 40.0,
            margin_left: 40.0,
            margin_right: 40.0,
        }
    }

    /// Ratio between the hosting container's width and the physical page width.
    pub fn container_ratio(&self, container_width: f32) -> f32 {
        container_width / self.width
    }

    /// Height available to blocks on one page, at the container's resolution.
    pub fn usable_height(&self, container_width: f32) -> f32 {
        (self.height - self.margin_top - self.margin_bottom) * self.container_ratio(container_width)
    }

    /// Width blocks are laid out (and measured) at.
    pub fn content_width(&self, container_width: f32) -> f32 {
        (self.width - self.margin_left - self.margin_right) * self.container_ratio(container_width)
    }

    pub fn width_pt(&self) -> f32 {
        self.width * PT_PER_PX
    }

    pub fn height_pt(&self) -> f32 {
        self.height * PT_PER_PX
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_is_portrait_in_points() {
        let g = PageGeometry::a4();
        assert!((g.width_pt() - 595.28).abs() < 0.05);
        assert!((g.height_pt() - 841.89).abs() < 0.05);
    }

    #[test]
    fn usable_height_scales_with_container() {
        let g = PageGeometry::a4();
        let full = g.usable_height(g.width);
        assert!((full - (g.height - 80.0)).abs() < 1e-3);
        let half = g.usable_height(g.width / 2.0);
        assert!((half * 2.0 - full).abs() < 1e-3);
    }

    #[test]
    fn clamped_pins_slider_ranges() {
        let wild = LayoutSettings {
            scale: 9.0,
            line_height: 0.1,
            section_spacing: -3.0,
            divider_spacing: -4.0,
            first_line_spacing: f32::NAN,
            title_font_size: 100.0,
            content_font_size: 1.0,
        };
        let c = wild.clamped();
        assert_eq!(c.scale, 1.5);
        assert_eq!(c.line_height, 0.5);
        assert_eq!(c.section_spacing, 0.0);
        assert_eq!(c.divider_spacing, -1.5);
        assert_eq!(c.first_line_spacing, 1.0);
        assert_eq!(c.title_font_size, 32.0);
        assert_eq!(c.content_font_size, 12.0);
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let s: LayoutSettings = serde_json::from_str(r#"{"lineHeight":1.5}"#).unwrap();
        assert_eq!(s.line_height, 1.5);
        assert_eq!(s.title_font_size, 20.0);
    }
}
