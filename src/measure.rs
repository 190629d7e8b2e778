use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::fonts::FontMetrics;
use crate::layout::{BlockLayout, lay_out};
use crate::model::SectionId;
use crate::render::Block;

/// Height of a rendered block at a given container width, in CSS px.
///
/// The pager pipeline depends on nothing else. `&mut self` keeps measurements
/// within one pass strictly sequential.
pub trait Measure {
    fn measure(&mut self, block: &Block, width: f32) -> Result<f32>;
}

/// Off-screen scratch area. Only one block is ever attached at a time.
#[derive(Debug, Default)]
pub struct Surface {
    width: Option<f32>,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, width: f32) -> Result<()> {
        if !width.is_finite() || width <= 0.0 {
            return Err(Error::MeasurementUnavailable(format!("invalid surface width {width}")));
        }
        if self.width.is_some() {
            return Err(Error::MeasurementUnavailable("surface already in use".into()));
        }
        self.width = Some(width);
        Ok(())
    }

    pub fn detach(&mut self) {
        self.width = None;
    }

    pub fn is_attached(&self) -> bool {
        self.width.is_some()
    }

    pub fn width(&self) -> Result<f32> {
        self.width
            .ok_or_else(|| Error::MeasurementUnavailable("surface is detached".into()))
    }
}

/// Production measurer: lays blocks out with real font metrics.
pub struct TextMeasurer {
    metrics: FontMetrics,
    surface: Surface,
}

impl TextMeasurer {
    pub fn new(metrics: FontMetrics) -> Self {
        TextMeasurer {
            metrics,
            surface: Surface::new(),
        }
    }

    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    /// Full geometry for a block, the same pass `measure` reads its height from.
    pub fn lay_out(&mut self, block: &Block, width: f32) -> Result<BlockLayout> {
        self.surface.attach(width)?;
        let layout = self.surface.width().map(|w| lay_out(block, w, &self.metrics));
        self.surface.detach();
        layout
    }
}

impl Measure for TextMeasurer {
    fn measure(&mut self, block: &Block, width: f32) -> Result<f32> {
        let layout = self.lay_out(block, width)?;
        log::trace!("measure: {} at {width:.1}px → {:.1}px", block.section_id, layout.height);
        Ok(layout.height)
    }
}

/// Table of known heights, for tests and hosts that measure elsewhere.
#[derive(Debug, Default, Clone)]
pub struct FixedHeights {
    heights: HashMap<SectionId, f32>,
}

impl FixedHeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: impl Into<SectionId>, height: f32) -> Self {
        self.set(id, height);
        self
    }

    pub fn set(&mut self, id: impl Into<SectionId>, height: f32) {
        self.heights.insert(id.into(), height);
    }

    pub fn remove(&mut self, id: &SectionId) {
        self.heights.remove(id);
    }
}

impl Measure for FixedHeights {
    fn measure(&mut self, block: &Block, width: f32) -> Result<f32> {
        if !width.is_finite() || width <= 0.0 {
            return Err(Error::MeasurementUnavailable(format!("invalid surface width {width}")));
        }
        self.heights
            .get(&block.section_id)
            .copied()
            .ok_or_else(|| Error::MeasurementUnavailable(format!("no height for section {}", block.section_id)))
    }
}
