// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Tile image decoding.
//!
//! This module turns tile bytes fetched from the backend into RGBA pixels
//! suitable for uploading as egui textures.

use crate::error::ViewerError;

/// A decoded tile, ready for texture upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTile {
    pub width: u32,
    pub height: u32,
    /// RGBA8, row-major, unpremultiplied.
    pub pixels: Vec<u8>,
}

impl DecodedTile {
    /// Uniform grey tile.
    #[cfg(test)]
    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        let mut pixels = vec![value; (width * height * 4) as usize];
        for alpha in pixels.iter_mut().skip(3).step_by(4) {
            *alpha = 255;
        }
        Self { width, height, pixels }
    }
}

/// Decode any format the `image` crate recognises (JPEG and PNG from the tile server).
pub fn decode_tile(bytes: &[u8]) -> Result<DecodedTile, ViewerError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| ViewerError::TileUnavailable(format!("decode failed: {}", e)))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedTile {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}
