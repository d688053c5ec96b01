// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application configuration.
//!
//! Read from an optional YAML file (`PATHVIEW_CONFIG`, else `pathview.yaml`
//! in the working directory), then overridden by `PATHVIEW_*` environment
//! variables.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

const DEFAULT_FILE: &str = "pathview.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL.
    pub endpoint: String,
    /// Tile image extension requested from the backend.
    pub tile_format: String,
    /// Background fetch threads.
    pub fetch_workers: usize,
    /// Decoded tiles kept per slide.
    pub tile_cache_capacity: usize,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000".to_string(),
            tile_format: "jpeg".to_string(),
            fetch_workers: 6,
            tile_cache_capacity: 512,
            window_width: 1400.0,
            window_height: 900.0,
        }
    }
}

impl Config {
    /// Load file and environment, then validate.
    pub fn load() -> Result<Self> {
        let path = env::var_os("PATHVIEW_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE));
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply `PATHVIEW_*` overrides from `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(endpoint) = non_empty("PATHVIEW_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(format) = non_empty("PATHVIEW_TILE_FORMAT") {
            self.tile_format = format;
        }
        if let Some(workers) = non_empty("PATHVIEW_FETCH_WORKERS") {
            self.fetch_workers = workers
                .trim()
                .parse()
                .with_context(|| format!("PATHVIEW_FETCH_WORKERS is not a number: {}", workers))?;
        }
        Ok(())
    }

    /// Reject unusable values and normalise the endpoint.
    pub fn validate(&mut self) -> Result<()> {
        self.endpoint = self.endpoint.trim().trim_end_matches('/').to_string();
        self.tile_format = self.tile_format.trim().to_string();
        if self.endpoint.is_empty() {
            bail!("endpoint must not be empty");
        }
        if self.tile_format.is_empty() {
            bail!("tile_format must not be empty");
        }
        if self.fetch_workers == 0 {
            bail!("fetch_workers must be at least 1");
        }
        if self.tile_cache_capacity == 0 {
            bail!("tile_cache_capacity must be at least 1");
        }
        Ok(())
    }
}
