//! Live preview session: debounced, single-threaded recomputation of the
//! pagination whenever the document, the settings or the container width change.

use std::time::{Duration, Instant};

use crate::config::{LayoutSettings, PageGeometry};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::measure::Measure;
use crate::pager::{Pagination, paginate_document};
use crate::render::Block;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Collapses bursts of changes into one recompute once `quiet` has passed
/// without another change.
#[derive(Clone, Debug)]
pub struct Debouncer {
    quiet: Duration,
    pending_since: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Debouncer {
            quiet,
            pending_since: None,
        }
    }

    /// Record a change. Restarts the quiet window.
    pub fn touch(&mut self, now: Instant) {
        self.pending_since = Some(now);
    }

    pub fn due(&self, now: Instant) -> bool {
        self.pending_since
            .is_some_and(|since| now.saturating_duration_since(since) >= self.quiet)
    }

    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    pub fn clear(&mut self) {
        self.pending_since = None;
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

pub struct Preview<M: Measure> {
    document: Document,
    settings: LayoutSettings,
    geometry: PageGeometry,
    container_width: f32,
    measurer: M,
    debounce: Debouncer,
    /// Bumped on every change; identifies the inputs a result was computed from.
    generation: u64,
    applied: Option<u64>,
    blocks: Vec<Block>,
    pagination: Option<Pagination>,
}

impl<M: Measure> Preview<M> {
    /// A session with a pending first recompute.
    pub fn new(document: Document, settings: LayoutSettings, container_width: f32, measurer: M, now: Instant) -> Self {
        let mut debounce = Debouncer::default();
        debounce.touch(now);
        Preview {
            document,
            settings,
            geometry: PageGeometry::a4(),
            container_width,
            measurer,
            debounce,
            generation: 0,
            applied: None,
            blocks: Vec::new(),
            pagination: None,
        }
    }

    pub fn with_debounce(mut self, quiet: Duration) -> Self {
        self.debounce.quiet = quiet;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn container_width(&self) -> f32 {
        self.container_width
    }

    pub fn measurer_mut(&mut self) -> &mut M {
        &mut self.measurer
    }

    /// Last applied pagination. Survives failed recomputes.
    pub fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    /// Blocks matching the last applied pagination.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    /// Zoom for on-screen display. Applied after measurement; it never moves a
    /// page boundary.
    pub fn display_scale(&self) -> f32 {
        self.settings.clamped().scale
    }

    fn changed(&mut self, now: Instant) {
        self.generation += 1;
        self.debounce.touch(now);
    }

    /// Apply an edit through the document's own mutation API.
    pub fn edit<T>(&mut self, now: Instant, f: impl FnOnce(&mut Document) -> Result<T>) -> Result<T> {
        let out = f(&mut self.document)?;
        self.changed(now);
        Ok(out)
    }

    pub fn set_settings(&mut self, settings: LayoutSettings, now: Instant) {
        if settings != self.settings {
            self.settings = settings;
            self.changed(now);
        }
    }

    pub fn set_container_width(&mut self, width: f32, now: Instant) {
        if width != self.container_width {
            self.container_width = width;
            self.changed(now);
        }
    }

    /// Recompute if the debounce window has elapsed. Returns the new pagination
    /// when one was applied.
    pub fn poll(&mut self, now: Instant) -> Result<Option<&Pagination>> {
        if !self.debounce.due(now) {
            return Ok(None);
        }
        self.debounce.clear();
        if self.recompute()? {
            Ok(self.pagination.as_ref())
        } else {
            Ok(None)
        }
    }

    /// Run a full pass now. On `MeasurementUnavailable` the previous pages are
    /// kept and `Ok(false)` is returned; the next change schedules a retry.
    pub fn recompute(&mut self) -> Result<bool> {
        let generation = self.generation;
        match paginate_document(
            &self.document,
            &self.settings,
            &self.geometry,
            self.container_width,
            &mut self.measurer,
        ) {
            Ok((blocks, pagination)) => Ok(self.apply(generation, blocks, pagination)),
            Err(Error::MeasurementUnavailable(reason)) => {
                log::warn!(
                    "Measurement unavailable ({reason}); keeping {} previous page(s)",
                    self.pagination.as_ref().map_or(0, Pagination::page_count),
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Install a result computed for `generation`. Results older than the one
    /// already applied are dropped; returns whether this one was taken.
    pub fn apply(&mut self, generation: u64, blocks: Vec<Block>, pagination: Pagination) -> bool {
        if self.applied.is_some_and(|applied| generation < applied) {
            log::debug!(
                "Dropping stale pagination (generation {generation}, applied {:?})",
                self.applied
            );
            return false;
        }
        self.applied = Some(generation);
        self.blocks = blocks;
        self.pagination = Some(pagination);
        true
    }
}
