// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Viewport controller state machine.
//!
//! ```text
//! Empty --select--> MetadataLoading --ok--> Ready
//!   ^                   |    ^                |
//!   +------ error ------+    +--- select -----+
//! ```
//!
//! Every selection gets a fresh epoch. Metadata and tile completions carry the
//! epoch they were issued under, and anything that does not match the live
//! selection is dropped. The surface is destroyed before a replacement is
//! built and is never rebound to another slide.
//!
//! The controller performs no I/O itself: transitions return the requests the
//! caller should dispatch.

use super::addressing::TileAddressing;
use super::surface::{CompletionOutcome, Epoch, TileCompletion, ViewportSurface};
use super::view::{tile_span, ViewState};
use crate::error::ViewerError;
use crate::models::slide::{PyramidMetadata, SlideId, TileKey};
use crate::util::geometry::ImageRect;

/// Metadata fetch the caller must perform for a new selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRequest {
    pub slide: SlideId,
    pub epoch: Epoch,
}

/// A validated, not yet satisfied tile fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRequest {
    pub slide: SlideId,
    pub key: TileKey,
    pub epoch: Epoch,
    pub url: String,
}

/// Coarse controller state, for status display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    MetadataLoading,
    Ready,
}

enum ViewerState {
    Empty,
    MetadataLoading {
        slide: SlideId,
        epoch: Epoch,
    },
    Ready {
        surface: ViewportSurface,
        view: ViewState,
    },
}

pub struct ViewportController {
    addressing: TileAddressing,
    cache_capacity: usize,
    viewport: (f64, f64),
    state: ViewerState,
    last_epoch: Epoch,
}

impl ViewportController {
    pub fn new(addressing: TileAddressing, cache_capacity: usize) -> Self {
        Self {
            addressing,
            cache_capacity,
            viewport: (0.0, 0.0),
            state: ViewerState::Empty,
            last_epoch: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            ViewerState::Empty => Phase::Empty,
            ViewerState::MetadataLoading { .. } => Phase::MetadataLoading,
            ViewerState::Ready { .. } => Phase::Ready,
        }
    }

    /// Slide currently selected, loading or displayed.
    pub fn slide(&self) -> Option<&SlideId> {
        match &self.state {
            ViewerState::Empty => None,
            ViewerState::MetadataLoading { slide, .. } => Some(slide),
            ViewerState::Ready { surface, .. } => Some(surface.slide()),
        }
    }

    /// Epoch of the live selection.
    pub fn epoch(&self) -> Option<Epoch> {
        match &self.state {
            ViewerState::Empty => None,
            ViewerState::MetadataLoading { epoch, .. } => Some(*epoch),
            ViewerState::Ready { surface, .. } => Some(surface.epoch()),
        }
    }

    pub fn surface(&self) -> Option<&ViewportSurface> {
        match &self.state {
            ViewerState::Ready { surface, .. } => Some(surface),
            _ => None,
        }
    }

    pub fn view(&self) -> Option<&ViewState> {
        match &self.state {
            ViewerState::Ready { view, .. } => Some(view),
            _ => None,
        }
    }

    pub fn view_mut(&mut self) -> Option<&mut ViewState> {
        match &mut self.state {
            ViewerState::Ready { view, .. } => Some(view),
            _ => None,
        }
    }

    /// Record the size of the rendering area in screen pixels.
    pub fn set_viewport(&mut self, viewport: (f64, f64)) {
        if self.viewport == viewport {
            return;
        }
        self.viewport = viewport;
        if let Some(view) = self.view_mut() {
            view.resize(viewport);
        }
    }

    /// Back to the fitted home view.
    pub fn home(&mut self) {
        let viewport = self.viewport;
        if let ViewerState::Ready { surface, view } = &mut self.state {
            *view = ViewState::fit(surface.metadata(), viewport);
        }
    }

    /// User selected a slide. Returns the metadata fetch to dispatch, or
    /// `None` if that slide is already selected.
    pub fn select_slide(&mut self, slide: SlideId) -> Option<MetadataRequest> {
        if self.slide() == Some(&slide) {
            return None;
        }
        self.teardown();
        self.last_epoch += 1;
        let epoch = self.last_epoch;
        log::info!("Selected slide {} (epoch {})", slide, epoch);
        self.state = ViewerState::MetadataLoading {
            slide: slide.clone(),
            epoch,
        };
        Some(MetadataRequest { slide, epoch })
    }

    /// Selection cleared.
    pub fn deselect(&mut self) {
        self.teardown();
        self.state = ViewerState::Empty;
    }

    /// Apply a metadata fetch result.
    ///
    /// Returns `Ok(true)` when a surface was built and `Ok(false)` when the
    /// result belonged to an older selection and was dropped. A failure for
    /// the live selection returns the controller to `Empty` and hands the
    /// error back.
    pub fn metadata_loaded(
        &mut self,
        epoch: Epoch,
        result: Result<PyramidMetadata, ViewerError>,
    ) -> Result<bool, ViewerError> {
        let slide = match &self.state {
            ViewerState::MetadataLoading { slide, epoch: live } if *live == epoch => slide.clone(),
            _ => {
                log::debug!("Dropped metadata for stale epoch {}", epoch);
                return Ok(false);
            }
        };

        match result {
            Ok(metadata) => {
                self.teardown();
                log::info!(
                    "Building surface for {}: {}x{} px, {} levels, {} px tiles",
                    slide,
                    metadata.width(),
                    metadata.height(),
                    metadata.level_count(),
                    metadata.tile_size()
                );
                let view = ViewState::fit(&metadata, self.viewport);
                let surface = ViewportSurface::new(slide, metadata, epoch, self.cache_capacity);
                self.state = ViewerState::Ready { surface, view };
                Ok(true)
            }
            Err(e) => {
                log::error!("No surface for {}: {}", slide, e);
                self.state = ViewerState::Empty;
                Err(e)
            }
        }
    }

    /// Requests for the tiles covering the current view that are not yet
    /// cached or in flight, nearest to the centre first.
    pub fn visible_requests(&mut self) -> Vec<TileRequest> {
        let Some(view) = self.view() else {
            return Vec::new();
        };
        let Some(surface) = self.surface() else {
            return Vec::new();
        };
        let level = surface.metadata().level_for_zoom(view.zoom());
        let region = view.visible_region();
        self.request_region(&region, level)
    }

    /// Requests for the tiles of `level` touching `region` (full-resolution
    /// pixels). Positions outside the tile grid are dropped.
    pub fn request_region(&mut self, region: &ImageRect, level: u32) -> Vec<TileRequest> {
        let ViewerState::Ready { surface, .. } = &mut self.state else {
            return Vec::new();
        };
        let metadata = *surface.metadata();
        let (Some(grid), Some((columns, rows))) = (metadata.grid(level), tile_span(&metadata, region, level)) else {
            return Vec::new();
        };

        let first_col = (*columns.start()).max(0);
        let last_col = (*columns.end()).min(grid.columns as i64 - 1);
        let first_row = (*rows.start()).max(0);
        let last_row = (*rows.end()).min(grid.rows as i64 - 1);
        if first_col > last_col || first_row > last_row {
            return Vec::new();
        }

        let mut keys: Vec<TileKey> = (first_row..=last_row)
            .flat_map(|row| (first_col..=last_col).map(move |col| TileKey::new(level, col as u32, row as u32)))
            .collect();

        let mid_col = (*columns.start() + *columns.end()) as f64 / 2.0;
        let mid_row = (*rows.start() + *rows.end()) as f64 / 2.0;
        keys.sort_by(|a, b| {
            let da = (a.column as f64 - mid_col).powi(2) + (a.row as f64 - mid_row).powi(2);
            let db = (b.column as f64 - mid_col).powi(2) + (b.row as f64 - mid_row).powi(2);
            da.total_cmp(&db)
        });

        let mut requests = Vec::new();
        for key in keys {
            if surface.tile(&key).is_some() {
                surface.touch(&key);
            } else if surface.claim(key) {
                requests.push(TileRequest {
                    slide: surface.slide().clone(),
                    key,
                    epoch: surface.epoch(),
                    url: self.addressing.tile_url(surface.slide(), &key),
                });
            }
        }
        requests
    }

    /// Request a single tile. Positions outside the grid, and tiles already
    /// cached or in flight, yield `None`.
    pub fn request_tile(&mut self, key: TileKey) -> Option<TileRequest> {
        let ViewerState::Ready { surface, .. } = &mut self.state else {
            return None;
        };
        if !surface.metadata().contains(&key) {
            log::debug!("Dropped out-of-range tile {:?} for {}", key, surface.slide());
            return None;
        }
        if !surface.claim(key) {
            return None;
        }
        Some(TileRequest {
            slide: surface.slide().clone(),
            key,
            epoch: surface.epoch(),
            url: self.addressing.tile_url(surface.slide(), &key),
        })
    }

    /// Route a tile completion to the live surface.
    pub fn tile_completed(&mut self, completion: TileCompletion) -> CompletionOutcome {
        let outcome = match &mut self.state {
            ViewerState::Ready { surface, .. } => surface.complete(completion),
            _ => CompletionOutcome::Stale,
        };
        if outcome == CompletionOutcome::Stale {
            log::debug!("Discarded stale tile completion");
        }
        outcome
    }

    /// Destroy the active surface unconditionally.
    pub fn shutdown(&mut self) {
        self.teardown();
        self.state = ViewerState::Empty;
    }

    fn teardown(&mut self) {
        if let ViewerState::Ready { surface, .. } = &mut self.state {
            let released = surface.destroy();
            log::info!(
                "Destroyed surface for {} (epoch {}, {} requests released)",
                surface.slide(),
                surface.epoch(),
                released
            );
        }
        if matches!(self.state, ViewerState::Ready { .. }) {
            self.state = ViewerState::Empty;
        }
    }
}

impl Drop for ViewportController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::media::DecodedTile;

    fn controller() -> ViewportController {
        let mut c = ViewportController::new(TileAddressing::new("http://localhost:8000", "jpeg"), 100_000);
        c.set_viewport((1000.0, 800.0));
        c
    }

    fn slide42() -> PyramidMetadata {
        PyramidMetadata::new(100_000, 80_000, 256, 10).unwrap()
    }

    fn ok(epoch: Epoch, key: TileKey) -> TileCompletion {
        TileCompletion {
            epoch,
            key,
            result: Ok(DecodedTile::filled(1, 1, 0)),
        }
    }

    fn ready(c: &mut ViewportController, slide: &str) -> Epoch {
        let req = c.select_slide(SlideId::new(slide)).unwrap();
        assert_eq!(c.metadata_loaded(req.epoch, Ok(slide42())), Ok(true));
        req.epoch
    }

    #[test]
    fn test_select_transitions_to_loading() {
        let mut c = controller();
        assert_eq!(c.phase(), Phase::Empty);

        let req = c.select_slide(SlideId::new("slide42")).unwrap();
        assert_eq!(req.slide.as_str(), "slide42");
        assert_eq!(c.phase(), Phase::MetadataLoading);
        assert!(c.surface().is_none());
        // No tiles before metadata
        assert!(c.visible_requests().is_empty());
        assert!(c.request_tile(TileKey::new(0, 0, 0)).is_none());
    }

    #[test]
    fn test_metadata_builds_surface() {
        let mut c = controller();
        let epoch = ready(&mut c, "slide42");
        assert_eq!(c.phase(), Phase::Ready);
        assert_eq!(c.surface().unwrap().epoch(), epoch);
        assert_eq!(c.view().unwrap().zoom(), 0.01);
    }

    #[test]
    fn test_metadata_failure_returns_to_empty() {
        let mut c = controller();
        let req = c.select_slide(SlideId::new("missing.svs")).unwrap();
        let err = c
            .metadata_loaded(req.epoch, Err(ViewerError::metadata("missing.svs", "404")))
            .unwrap_err();
        assert!(matches!(err, ViewerError::MetadataUnavailable { .. }));
        assert_eq!(c.phase(), Phase::Empty);
        assert!(c.surface().is_none());
    }

    #[test]
    fn test_stale_metadata_is_dropped() {
        let mut c = controller();
        let first = c.select_slide(SlideId::new("a")).unwrap();
        let second = c.select_slide(SlideId::new("b")).unwrap();
        assert!(second.epoch > first.epoch);

        assert_eq!(c.metadata_loaded(first.epoch, Ok(slide42())), Ok(false));
        assert_eq!(c.phase(), Phase::MetadataLoading);

        // A late failure for the old selection must not reset the new one
        assert_eq!(
            c.metadata_loaded(first.epoch, Err(ViewerError::metadata("a", "timeout"))),
            Ok(false)
        );
        assert_eq!(c.slide().unwrap().as_str(), "b");
    }

    #[test]
    fn test_reselecting_same_slide_is_noop() {
        let mut c = controller();
        let epoch = ready(&mut c, "slide42");
        assert!(c.select_slide(SlideId::new("slide42")).is_none());
        assert_eq!(c.epoch(), Some(epoch));
    }

    #[test]
    fn test_switching_slides_discards_old_tiles() {
        let mut c = controller();
        let epoch_a = ready(&mut c, "a");
        let requests_a = c.visible_requests();
        assert!(!requests_a.is_empty());

        // Switch to B while A's tiles are in flight
        let req_b = c.select_slide(SlideId::new("b")).unwrap();
        assert_eq!(c.phase(), Phase::MetadataLoading);
        for r in &requests_a {
            assert_eq!(c.tile_completed(ok(r.epoch, r.key)), CompletionOutcome::Stale);
        }

        c.metadata_loaded(req_b.epoch, Ok(slide42())).unwrap();
        for r in &requests_a {
            assert_eq!(r.epoch, epoch_a);
            assert_eq!(c.tile_completed(ok(r.epoch, r.key)), CompletionOutcome::Stale);
        }
        assert_eq!(c.surface().unwrap().loaded_count(), 0);

        // B's own tiles still land
        let requests_b = c.visible_requests();
        assert_eq!(requests_b.len(), requests_a.len());
        let r = &requests_b[0];
        assert_eq!(c.tile_completed(ok(r.epoch, r.key)), CompletionOutcome::Rendered);
        assert_eq!(c.surface().unwrap().loaded_count(), 1);
    }

    #[test]
    fn test_visible_requests_are_deduplicated() {
        let mut c = controller();
        ready(&mut c, "slide42");
        let first = c.visible_requests();
        assert!(!first.is_empty());
        assert!(c.visible_requests().is_empty());

        for r in &first {
            c.tile_completed(ok(r.epoch, r.key));
        }
        assert!(c.visible_requests().is_empty());
    }

    #[test]
    fn test_home_view_requests_coarse_level() {
        let mut c = controller();
        ready(&mut c, "slide42");
        // zoom 0.01: level 3 (1/64) is the coarsest that does not undersample
        let requests = c.visible_requests();
        assert!(requests.iter().all(|r| r.key.level == 3));
        let grid = slide42().grid(3).unwrap();
        assert_eq!(grid, crate::models::slide::TileGrid { columns: 7, rows: 5 });
        assert_eq!(requests.len() as u64, grid.tile_count());
    }

    #[test]
    fn test_full_coverage_at_finest_level() {
        let mut c = controller();
        ready(&mut c, "slide42");
        let meta = slide42();
        let requests = c.request_region(&meta.full_rect(), 9);
        assert_eq!(requests.len(), 391 * 313);
        assert!(requests.iter().all(|r| meta.contains(&r.key)));
        let max_col = requests.iter().map(|r| r.key.column).max().unwrap();
        let max_row = requests.iter().map(|r| r.key.row).max().unwrap();
        assert_eq!((max_col, max_row), (390, 312));
    }

    #[test]
    fn test_out_of_range_tile_is_dropped() {
        let mut c = controller();
        ready(&mut c, "slide42");
        assert!(c.request_tile(TileKey::new(9, 391, 0)).is_none());
        assert!(c.request_tile(TileKey::new(10, 0, 0)).is_none());

        let req = c.request_tile(TileKey::new(9, 390, 0)).unwrap();
        assert_eq!(req.url, "http://localhost:8000/tiles/slide42/9/390_0.jpeg");
        assert!(c.request_tile(TileKey::new(9, 390, 0)).is_none());
    }

    #[test]
    fn test_region_past_bounds_is_clamped() {
        let mut c = controller();
        ready(&mut c, "slide42");
        let region = ImageRect::new(-5000.0, -5000.0, 300.0, 300.0);
        let mut keys: Vec<TileKey> = c.request_region(&region, 9).into_iter().map(|r| r.key).collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                TileKey::new(9, 0, 0),
                TileKey::new(9, 0, 1),
                TileKey::new(9, 1, 0),
                TileKey::new(9, 1, 1)
            ]
        );
    }

    #[test]
    fn test_shutdown_destroys_surface() {
        let mut c = controller();
        let epoch = ready(&mut c, "slide42");
        let requests = c.visible_requests();
        c.shutdown();
        assert_eq!(c.phase(), Phase::Empty);
        assert_eq!(c.tile_completed(ok(epoch, requests[0].key)), CompletionOutcome::Stale);

        // Idempotent
        c.shutdown();
        c.deselect();
        assert_eq!(c.phase(), Phase::Empty);
    }

    #[test]
    fn test_epochs_never_repeat() {
        let mut c = controller();
        let a = ready(&mut c, "a");
        c.deselect();
        let b = ready(&mut c, "a");
        assert!(b > a);
    }

    #[test]
    fn test_home_restores_fitted_view() {
        let mut c = controller();
        ready(&mut c, "slide42");
        let fitted = *c.view().unwrap();

        let view = c.view_mut().unwrap();
        view.zoom_by(8.0);
        view.pan_by(120.0, -40.0);
        assert_ne!(*c.view().unwrap(), fitted);

        c.home();
        assert_eq!(*c.view().unwrap(), fitted);
    }

    #[test]
    fn test_surface_built_without_area_fits_once_sized() {
        let mut c = ViewportController::new(TileAddressing::new("http://localhost:8000", "jpeg"), 100_000);
        ready(&mut c, "slide42");
        assert!(c.visible_requests().is_empty());

        c.set_viewport((1000.0, 800.0));
        assert_eq!(*c.view().unwrap(), ViewState::fit(&slide42(), (1000.0, 800.0)));
        assert!(c.visible_requests().iter().all(|r| r.key.level == 3));
    }
}
