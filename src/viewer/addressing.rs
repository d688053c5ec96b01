// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Tile addressing scheme.
//!
//! Maps `(slide, level, column, row)` to the tile URL served by the backend:
//! `<endpoint>/tiles/{slide}/{level}/{column}_{row}.<format>`. The mapping is
//! total and does no bounds checking; the viewport controller validates keys
//! against the pyramid before it asks for a URL.

use crate::models::slide::{SlideId, TileKey};

/// Immutable URL builder, safe to share between threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileAddressing {
    endpoint: String,
    format: String,
}

impl TileAddressing {
    pub fn new(endpoint: impl Into<String>, format: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            format: format.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn tile_url(&self, slide: &SlideId, key: &TileKey) -> String {
        format!(
            "{}/tiles/{}/{}/{}_{}.{}",
            self.endpoint, slide, key.level, key.column, key.row, self.format
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_url_layout() {
        let scheme = TileAddressing::new("http://localhost:8000", "jpeg");
        let url = scheme.tile_url(&SlideId::new("slide42"), &TileKey::new(9, 12, 3));
        assert_eq!(url, "http://localhost:8000/tiles/slide42/9/12_3.jpeg");
    }

    #[test]
    fn test_tile_url_is_deterministic() {
        let scheme = TileAddressing::new("http://pathology.local:8000/", "jpeg");
        let slide = SlideId::new("CMU-1.svs");
        for level in 0..4 {
            for col in 0..8 {
                for row in 0..8 {
                    let key = TileKey::new(level, col, row);
                    assert_eq!(scheme.tile_url(&slide, &key), scheme.tile_url(&slide, &key));
                }
            }
        }
    }

    #[test]
    fn test_trailing_slash_is_stripped() {
        let scheme = TileAddressing::new("http://host:8000//", "png");
        assert_eq!(scheme.endpoint(), "http://host:8000");
        let url = scheme.tile_url(&SlideId::new("s"), &TileKey::new(0, 0, 0));
        assert_eq!(url, "http://host:8000/tiles/s/0/0_0.png");
    }

    #[test]
    fn test_addressing_is_shareable_across_threads() {
        let scheme = std::sync::Arc::new(TileAddressing::new("http://h", "jpeg"));
        let slide = SlideId::new("slide42");
        let handles: Vec<_> = (0..4)
            .map(|col| {
                let scheme = scheme.clone();
                let slide = slide.clone();
                std::thread::spawn(move || scheme.tile_url(&slide, &TileKey::new(1, col, 0)))
            })
            .collect();
        let urls: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(urls[3], "http://h/tiles/slide42/1/3_0.jpeg");
    }
}
