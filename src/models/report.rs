// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Report records and save payloads.
//!
//! A persisted report always carries a [`ReportId`]. Drafts exist only as
//! editing-session buffers and reach the backend as a [`SaveReportRequest`]
//! without an id.

use super::slide::SlideId;
use super::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Server-assigned report identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub i64);

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A report as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub title: String,
    /// Rich-text markup (HTML).
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// `POST /report/{slide}` body.
///
/// `id` is omitted, not null, for drafts: the backend decides between
/// create and update by the presence of the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReportRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ReportId>,
    pub title: String,
    pub content: String,
}

/// `POST /report/{slide}` response body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SaveReportResponse {
    pub id: ReportId,
}

/// All reports of one slide, as written by the export menu.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportExport {
    pub slide: SlideId,
    #[serde(with = "timestamp::option")]
    pub exported_at: Option<DateTime<Utc>>,
    pub reports: Vec<Report>,
}
