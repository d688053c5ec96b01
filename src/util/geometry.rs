// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides the rectangle type shared by the viewport and the
//! pyramid model, plus coordinate transformations between screen space and
//! full-resolution image space.

/// Axis-aligned rectangle in full-resolution image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl ImageRect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    pub fn intersects(&self, other: &ImageRect) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }
}

/// Convert a screen position to image coordinates.
///
/// `origin` is the screen position of the viewport's top-left corner, `center`
/// the image point shown at the viewport centre, and `zoom` the number of
/// screen pixels per image pixel.
pub fn screen_to_image(
    screen: (f64, f64),
    origin: (f64, f64),
    viewport: (f64, f64),
    center: (f64, f64),
    zoom: f64,
) -> (f64, f64) {
    (
        center.0 + (screen.0 - origin.0 - viewport.0 / 2.0) / zoom,
        center.1 + (screen.1 - origin.1 - viewport.1 / 2.0) / zoom,
    )
}

/// Convert image coordinates to a screen position.
pub fn image_to_screen(
    image: (f64, f64),
    origin: (f64, f64),
    viewport: (f64, f64),
    center: (f64, f64),
    zoom: f64,
) -> (f64, f64) {
    (
        origin.0 + viewport.0 / 2.0 + (image.0 - center.0) * zoom,
        origin.1 + viewport.1 / 2.0 + (image.1 - center.1) * zoom,
    )
}
