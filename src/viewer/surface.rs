// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Live rendering surface bound to one slide generation.
//!
//! A surface is created for exactly one `(slide, metadata, epoch)` triple and
//! is never rebound. Completions are accepted only while the surface is alive
//! and only when they carry its epoch; everything else is reported as stale
//! and dropped.

use crate::error::ViewerError;
use crate::io::media::DecodedTile;
use crate::models::slide::{PyramidMetadata, SlideId, TileKey};
use std::collections::{HashMap, VecDeque};

/// Generation number of a slide selection.
pub type Epoch = u64;

/// Result of a tile fetch, tagged with the epoch it was issued under.
#[derive(Debug)]
pub struct TileCompletion {
    pub epoch: Epoch,
    pub key: TileKey,
    pub result: Result<DecodedTile, ViewerError>,
}

/// State of one tile position on the surface.
#[derive(Debug)]
pub enum TileSlot {
    Pending,
    Loaded(DecodedTile),
    /// Fetch failed; the area stays blank for this surface's lifetime.
    Failed,
}

/// What a completion did to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    Rendered,
    Blank,
    Stale,
}

pub struct ViewportSurface {
    slide: SlideId,
    metadata: PyramidMetadata,
    epoch: Epoch,
    tiles: HashMap<TileKey, TileSlot>,
    /// Loaded tiles, least recently used first.
    recency: VecDeque<TileKey>,
    capacity: usize,
    destroyed: bool,
}

impl ViewportSurface {
    pub fn new(slide: SlideId, metadata: PyramidMetadata, epoch: Epoch, capacity: usize) -> Self {
        Self {
            slide,
            metadata,
            epoch,
            tiles: HashMap::new(),
            recency: VecDeque::new(),
            capacity: capacity.max(1),
            destroyed: false,
        }
    }

    pub fn slide(&self) -> &SlideId {
        &self.slide
    }

    pub fn metadata(&self) -> &PyramidMetadata {
        &self.metadata
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Whether a request for `key` would be new work.
    pub fn needs(&self, key: &TileKey) -> bool {
        !self.destroyed && !self.tiles.contains_key(key)
    }

    /// Mark `key` as in flight. Returns `false` if it is cached, pending or failed.
    pub fn claim(&mut self, key: TileKey) -> bool {
        if !self.needs(&key) {
            return false;
        }
        self.tiles.insert(key, TileSlot::Pending);
        true
    }

    /// Apply a fetch result.
    pub fn complete(&mut self, completion: TileCompletion) -> CompletionOutcome {
        if self.destroyed || completion.epoch != self.epoch {
            return CompletionOutcome::Stale;
        }
        match self.tiles.get(&completion.key) {
            Some(TileSlot::Pending) => {}
            _ => return CompletionOutcome::Stale,
        }

        match completion.result {
            Ok(tile) => {
                self.tiles.insert(completion.key, TileSlot::Loaded(tile));
                self.recency.push_back(completion.key);
                self.evict();
                CompletionOutcome::Rendered
            }
            Err(e) => {
                log::debug!("Tile {:?} of {} left blank: {}", completion.key, self.slide, e);
                self.tiles.insert(completion.key, TileSlot::Failed);
                CompletionOutcome::Blank
            }
        }
    }

    pub fn slot(&self, key: &TileKey) -> Option<&TileSlot> {
        self.tiles.get(key)
    }

    pub fn tile(&self, key: &TileKey) -> Option<&DecodedTile> {
        match self.tiles.get(key) {
            Some(TileSlot::Loaded(tile)) => Some(tile),
            _ => None,
        }
    }

    /// Mark a loaded tile as recently used so eviction spares it.
    pub fn touch(&mut self, key: &TileKey) {
        if matches!(self.tiles.get(key), Some(TileSlot::Loaded(_))) {
            self.recency.retain(|k| k != key);
            self.recency.push_back(*key);
        }
    }

    pub fn loaded(&self) -> impl Iterator<Item = (&TileKey, &DecodedTile)> {
        self.tiles.iter().filter_map(|(key, slot)| match slot {
            TileSlot::Loaded(tile) => Some((key, tile)),
            _ => None,
        })
    }

    pub fn loaded_count(&self) -> usize {
        self.recency.len()
    }

    pub fn pending_count(&self) -> usize {
        self.tiles
            .values()
            .filter(|slot| matches!(slot, TileSlot::Pending))
            .count()
    }

    /// Release every tile and stop accepting completions.
    ///
    /// Returns the number of requests that were still in flight. Calling it
    /// again is a no-op.
    pub fn destroy(&mut self) -> usize {
        if self.destroyed {
            return 0;
        }
        let pending = self.pending_count();
        self.tiles.clear();
        self.recency.clear();
        self.destroyed = true;
        pending
    }

    fn evict(&mut self) {
        while self.recency.len() > self.capacity {
            if let Some(oldest) = self.recency.pop_front() {
                self.tiles.remove(&oldest);
            }
        }
    }
}
