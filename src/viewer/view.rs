// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Continuous pan/zoom state of the viewport.
//!
//! Positions are in full-resolution image pixels and `zoom` is screen pixels
//! per image pixel. The state is independent of any surface; the controller
//! turns it into tile requests.

use crate::models::slide::PyramidMetadata;
use crate::util::geometry::{screen_to_image, ImageRect};
use std::ops::RangeInclusive;

/// Deepest zoom: four screen pixels per native pixel.
pub const MAX_ZOOM: f64 = 4.0;

/// How far out the user may zoom, relative to the fitted home view.
const MIN_ZOOM_FRACTION: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    center: (f64, f64),
    zoom: f64,
    viewport: (f64, f64),
    image: (f64, f64),
    min_zoom: f64,
    /// False until the view has been fitted to a non-empty viewport.
    fitted: bool,
}

impl ViewState {
    /// Home view: whole image visible and centred.
    pub fn fit(metadata: &PyramidMetadata, viewport: (f64, f64)) -> Self {
        Self::fit_image((metadata.width() as f64, metadata.height() as f64), viewport)
    }

    fn fit_image(image: (f64, f64), viewport: (f64, f64)) -> Self {
        let fit = fit_zoom(image, viewport);
        Self {
            center: (image.0 / 2.0, image.1 / 2.0),
            zoom: fit,
            viewport,
            image,
            min_zoom: (fit * MIN_ZOOM_FRACTION).min(MAX_ZOOM),
            fitted: !is_empty(viewport),
        }
    }

    pub fn center(&self) -> (f64, f64) {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn viewport(&self) -> (f64, f64) {
        self.viewport
    }

    /// Track a new viewport size, keeping centre and zoom.
    ///
    /// An empty viewport only records its size. A view built before the
    /// viewport had any area is fitted on the first real size.
    pub fn resize(&mut self, viewport: (f64, f64)) {
        self.viewport = viewport;
        if is_empty(viewport) {
            return;
        }
        if !self.fitted {
            *self = Self::fit_image(self.image, viewport);
            return;
        }
        self.min_zoom = (fit_zoom(self.image, viewport) * MIN_ZOOM_FRACTION).min(MAX_ZOOM);
        self.zoom = self.zoom.clamp(self.min_zoom, MAX_ZOOM);
    }

    /// Drag by a screen-space delta; the image follows the pointer.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.center.0 -= dx / self.zoom;
        self.center.1 -= dy / self.zoom;
        self.clamp_center();
    }

    /// Zoom by `factor`, keeping the image point under `anchor` fixed.
    ///
    /// `anchor` is relative to the viewport's top-left corner.
    pub fn zoom_at(&mut self, factor: f64, anchor: (f64, f64)) {
        if !(factor > 0.0) {
            return;
        }
        let pinned = screen_to_image(anchor, (0.0, 0.0), self.viewport, self.center, self.zoom);
        self.zoom = (self.zoom * factor).clamp(self.min_zoom, MAX_ZOOM);
        self.center = (
            pinned.0 - (anchor.0 - self.viewport.0 / 2.0) / self.zoom,
            pinned.1 - (anchor.1 - self.viewport.1 / 2.0) / self.zoom,
        );
        self.clamp_center();
    }

    /// Zoom about the viewport centre.
    pub fn zoom_by(&mut self, factor: f64) {
        self.zoom_at(factor, (self.viewport.0 / 2.0, self.viewport.1 / 2.0));
    }

    /// Image area currently on screen; may extend past the image bounds.
    pub fn visible_region(&self) -> ImageRect {
        let half_w = self.viewport.0 / (2.0 * self.zoom);
        let half_h = self.viewport.1 / (2.0 * self.zoom);
        ImageRect::new(
            self.center.0 - half_w,
            self.center.1 - half_h,
            self.center.0 + half_w,
            self.center.1 + half_h,
        )
    }

    fn clamp_center(&mut self) {
        self.center.0 = self.center.0.clamp(0.0, self.image.0);
        self.center.1 = self.center.1.clamp(0.0, self.image.1);
    }
}

fn is_empty(viewport: (f64, f64)) -> bool {
    !(viewport.0 > 0.0 && viewport.1 > 0.0)
}

fn fit_zoom(image: (f64, f64), viewport: (f64, f64)) -> f64 {
    if is_empty(viewport) {
        return 1.0;
    }
    (viewport.0 / image.0).min(viewport.1 / image.1)
}

/// Column and row positions touching `region` at `level`.
///
/// The ranges are not clamped to the tile grid; they can be negative or run
/// past the last tile while the view extends beyond the image.
pub fn tile_span(
    metadata: &PyramidMetadata,
    region: &ImageRect,
    level: u32,
) -> Option<(RangeInclusive<i64>, RangeInclusive<i64>)> {
    if region.is_empty() {
        return None;
    }
    let span = metadata.tile_size() as f64 / metadata.level_scale(level);
    let columns = (region.x0 / span).floor() as i64..=(region.x1 / span).ceil() as i64 - 1;
    let rows = (region.y0 / span).floor() as i64..=(region.y1 / span).ceil() as i64 - 1;
    Some((columns, rows))
}
