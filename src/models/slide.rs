// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Slide identity and pyramid metadata.
//!
//! Level 0 is the coarsest level and `level_count - 1` is native resolution.
//! Each coarser level halves the linear dimensions of the one above it, so
//! level `L` has width `ceil(width / 2^(level_count - 1 - L))`.

use crate::error::ViewerError;
use crate::util::geometry::ImageRect;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a whole-slide image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlideId(String);

impl SlideId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Position of one tile in the pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    pub level: u32,
    pub column: u32,
    pub row: u32,
}

impl TileKey {
    pub fn new(level: u32, column: u32, row: u32) -> Self {
        Self { level, column, row }
    }
}

/// Tile grid dimensions of a single level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    pub columns: u32,
    pub rows: u32,
}

impl TileGrid {
    pub fn tile_count(&self) -> u64 {
        self.columns as u64 * self.rows as u64
    }
}

/// Immutable description of a slide's resolution pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PyramidMetadata {
    width: u64,
    height: u64,
    tile_size: u32,
    level_count: u32,
}

impl PyramidMetadata {
    /// Build metadata, rejecting shapes that cannot be tiled.
    pub fn new(width: u64, height: u64, tile_size: u32, level_count: u32) -> Result<Self, &'static str> {
        if level_count == 0 {
            return Err("level count must be at least 1");
        }
        if tile_size == 0 {
            return Err("tile size must be positive");
        }
        if width == 0 || height == 0 {
            return Err("image dimensions must be positive");
        }
        Ok(Self {
            width,
            height,
            tile_size,
            level_count,
        })
    }

    pub fn width(&self) -> u64 {
        self.width
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn level_count(&self) -> u32 {
        self.level_count
    }

    /// Finest (native resolution) level.
    pub fn max_level(&self) -> u32 {
        self.level_count - 1
    }

    /// Number of halvings between `level` and native resolution.
    fn shift(&self, level: u32) -> u32 {
        self.max_level().saturating_sub(level).min(63)
    }

    /// Level pixels per full-resolution pixel.
    pub fn level_scale(&self, level: u32) -> f64 {
        1.0 / (1u64 << self.shift(level)) as f64
    }

    pub fn level_width(&self, level: u32) -> u64 {
        self.width.div_ceil(1u64 << self.shift(level))
    }

    pub fn level_height(&self, level: u32) -> u64 {
        self.height.div_ceil(1u64 << self.shift(level))
    }

    /// Valid tile grid of `level`, or `None` past the finest level.
    pub fn grid(&self, level: u32) -> Option<TileGrid> {
        if level >= self.level_count {
            return None;
        }
        let tile = self.tile_size as u64;
        let clamp = |n: u64| u32::try_from(n).unwrap_or(u32::MAX);
        Some(TileGrid {
            columns: clamp(self.level_width(level).div_ceil(tile)),
            rows: clamp(self.level_height(level).div_ceil(tile)),
        })
    }

    /// Whether `key` addresses a tile that exists.
    pub fn contains(&self, key: &TileKey) -> bool {
        self.grid(key.level)
            .is_some_and(|grid| key.column < grid.columns && key.row < grid.rows)
    }

    /// Coarsest level whose resolution is not below the display resolution.
    ///
    /// `zoom` is screen pixels per full-resolution pixel.
    pub fn level_for_zoom(&self, zoom: f64) -> u32 {
        if !(zoom > 0.0) || zoom >= 1.0 {
            return self.max_level();
        }
        let halvings = (1.0 / zoom).log2().floor();
        if halvings >= self.max_level() as f64 {
            0
        } else {
            self.max_level() - halvings as u32
        }
    }

    /// Area covered by `key`, in full-resolution pixels, clipped to the image.
    pub fn tile_rect(&self, key: &TileKey) -> ImageRect {
        let span = self.tile_size as f64 / self.level_scale(key.level);
        let x0 = key.column as f64 * span;
        let y0 = key.row as f64 * span;
        ImageRect::new(
            x0,
            y0,
            (x0 + span).min(self.width as f64),
            (y0 + span).min(self.height as f64),
        )
    }

    pub fn full_rect(&self) -> ImageRect {
        ImageRect::new(0.0, 0.0, self.width as f64, self.height as f64)
    }
}

/// `GET /info/{slide}` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideInfo {
    pub width: u64,
    pub height: u64,
    pub tile_size: u32,
    pub levels: u32,
}

impl SlideInfo {
    pub fn into_metadata(self, slide: &SlideId) -> Result<PyramidMetadata, ViewerError> {
        PyramidMetadata::new(self.width, self.height, self.tile_size, self.levels)
            .map_err(|reason| ViewerError::metadata(slide, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide42() -> PyramidMetadata {
        PyramidMetadata::new(100_000, 80_000, 256, 10).unwrap()
    }

    #[test]
    fn test_finest_level_is_native_size() {
        let meta = slide42();
        assert_eq!(meta.level_width(9), 100_000);
        assert_eq!(meta.level_height(9), 80_000);
    }

    #[test]
    fn test_coarsest_level_dimensions() {
        let meta = slide42();
        // 100000 / 512 = 195.3, 80000 / 512 = 156.25
        assert_eq!(meta.level_width(0), 196);
        assert_eq!(meta.level_height(0), 157);
        assert_eq!(meta.grid(0), Some(TileGrid { columns: 1, rows: 1 }));
    }

    #[test]
    fn test_level_widths_halve() {
        let meta = PyramidMetadata::new(1000, 1000, 256, 4).unwrap();
        let widths: Vec<u64> = (0..4).map(|l| meta.level_width(l)).collect();
        assert_eq!(widths, vec![125, 250, 500, 1000]);
    }

    #[test]
    fn test_full_resolution_grid() {
        let grid = slide42().grid(9).unwrap();
        assert_eq!(grid.columns, 391);
        assert_eq!(grid.rows, 313);
        assert_eq!(grid.tile_count(), 391 * 313);
    }

    #[test]
    fn test_contains_rejects_out_of_range() {
        let meta = slide42();
        assert!(meta.contains(&TileKey::new(9, 390, 312)));
        assert!(!meta.contains(&TileKey::new(9, 391, 0)));
        assert!(!meta.contains(&TileKey::new(9, 0, 313)));
        assert!(!meta.contains(&TileKey::new(10, 0, 0)));
    }

    #[test]
    fn test_single_level_pyramid() {
        let meta = PyramidMetadata::new(300, 200, 256, 1).unwrap();
        assert_eq!(meta.max_level(), 0);
        assert_eq!(meta.level_width(0), 300);
        assert_eq!(meta.grid(0), Some(TileGrid { columns: 2, rows: 1 }));
        assert_eq!(meta.level_for_zoom(0.01), 0);
    }

    #[test]
    fn test_rejects_invalid_shapes() {
        assert!(PyramidMetadata::new(100, 100, 256, 0).is_err());
        assert!(PyramidMetadata::new(100, 100, 0, 3).is_err());
        assert!(PyramidMetadata::new(0, 100, 256, 3).is_err());
    }

    #[test]
    fn test_level_for_zoom() {
        let meta = slide42();
        assert_eq!(meta.level_for_zoom(1.0), 9);
        assert_eq!(meta.level_for_zoom(2.0), 9);
        assert_eq!(meta.level_for_zoom(0.5), 8);
        // Between 1/4 and 1/2 the 1/4 level would undersample, so stay at 1/2
        assert_eq!(meta.level_for_zoom(0.3), 8);
        assert_eq!(meta.level_for_zoom(0.25), 7);
        assert_eq!(meta.level_for_zoom(1e-9), 0);
    }

    #[test]
    fn test_tile_rect_is_clipped() {
        let meta = slide42();
        let rect = meta.tile_rect(&TileKey::new(9, 390, 0));
        assert_eq!(rect.x0, 390.0 * 256.0);
        assert_eq!(rect.x1, 100_000.0);

        // One level-8 tile spans 512 full-resolution pixels
        let coarse = meta.tile_rect(&TileKey::new(8, 1, 1));
        assert_eq!(coarse, ImageRect::new(512.0, 512.0, 1024.0, 1024.0));
    }

    #[test]
    fn test_slide_info_conversion() {
        let json = r#"{"width": 100000, "height": 80000, "tile_size": 256, "levels": 10,
                       "level_dimensions": [[100000, 80000]]}"#;
        let info: SlideInfo = serde_json::from_str(json).unwrap();
        let meta = info.into_metadata(&SlideId::new("slide42")).unwrap();
        assert_eq!(meta, slide42());

        let bad = SlideInfo { width: 10, height: 10, tile_size: 256, levels: 0 };
        let err = bad.into_metadata(&SlideId::new("broken")).unwrap_err();
        assert!(matches!(err, ViewerError::MetadataUnavailable { .. }));
    }

    #[test]
    fn test_deep_pyramid_saturates_at_one_pixel() {
        let meta = PyramidMetadata::new(100_000, 80_000, 256, 200).unwrap();
        assert_eq!(meta.level_width(0), 1);
        assert_eq!(meta.level_height(0), 1);
        assert_eq!(meta.grid(0), Some(TileGrid { columns: 1, rows: 1 }));
        assert_eq!(meta.grid(120), Some(TileGrid { columns: 1, rows: 1 }));
        assert_eq!(meta.level_width(199), 100_000);
        assert_eq!(meta.grid(199), Some(TileGrid { columns: 391, rows: 313 }));
        assert_eq!(meta.level_for_zoom(1e-300), 0);
        assert_eq!(meta.level_for_zoom(0.5), 198);
        assert!(meta.contains(&TileKey::new(0, 0, 0)));
        assert!(!meta.contains(&TileKey::new(0, 1, 0)));
    }
}
