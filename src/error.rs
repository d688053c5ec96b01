// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error taxonomy for the viewer and report subsystem.
//!
//! None of these are fatal to the process. Each is scoped to the slide,
//! tile, session or upload it concerns, and the owning state machine decides
//! whether it is surfaced to the user or absorbed locally.

use thiserror::Error;

/// Failures produced by backend round-trips and session misuse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewerError {
    /// Slide info could not be fetched or was malformed.
    #[error("slide metadata unavailable for {slide}: {reason}")]
    MetadataUnavailable { slide: String, reason: String },

    /// A single tile could not be fetched or decoded.
    #[error("tile unavailable: {0}")]
    TileUnavailable(String),

    /// Report list for a slide could not be loaded.
    #[error("reports unavailable: {0}")]
    ReportsUnavailable(String),

    /// Saving a report failed; the editing session keeps its buffers.
    #[error("report save failed: {0}")]
    ReportSaveFailed(String),

    /// Folder or slide listing failed.
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// Upload was rejected or interrupted.
    #[error("upload failed: {0}")]
    UploadFailed(String),

    /// Operation is not valid in the current session state.
    #[error("invalid session state: {0}")]
    InvalidSession(&'static str),
}

impl ViewerError {
    pub fn metadata(slide: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        Self::MetadataUnavailable {
            slide: slide.to_string(),
            reason: reason.to_string(),
        }
    }
}
