// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Folder and slide catalog records.

use super::slide::SlideId;
use super::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderId(pub i64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub slide_count: u32,
}

/// `POST /folders` and `PUT /folders/{id}` body.
#[derive(Debug, Clone, Serialize)]
pub struct FolderRequest {
    pub name: String,
}

/// One row of `GET /slides`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideSummary {
    pub id: i64,
    pub filename: String,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub folder_id: Option<FolderId>,
    #[serde(default)]
    pub folder_name: Option<String>,
}

impl SlideSummary {
    /// The tile and info endpoints address slides by file name.
    pub fn slide_id(&self) -> SlideId {
        SlideId::new(self.filename.clone())
    }
}

/// `POST /upload` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub slide_id: i64,
}

/// Column the slide table is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Filename,
    CreatedAt,
}

/// Slide table ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideSort {
    pub field: SortField,
    pub ascending: bool,
}

impl Default for SlideSort {
    /// Newest uploads first.
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            ascending: false,
        }
    }
}

impl SlideSort {
    /// Clicking the active column flips direction; another column starts ascending.
    pub fn toggle(&mut self, field: SortField) {
        if self.field == field {
            self.ascending = !self.ascending;
        } else {
            self.field = field;
            self.ascending = true;
        }
    }

    fn compare(&self, a: &SlideSummary, b: &SlideSummary) -> Ordering {
        let ord = match self.field {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Filename => a.filename.cmp(&b.filename),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        if self.ascending {
            ord
        } else {
            ord.reverse()
        }
    }

    pub fn apply(&self, slides: &mut [SlideSummary]) {
        slides.sort_by(|a, b| self.compare(a, b));
    }
}
