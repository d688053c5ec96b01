// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Reports of the selected slide, as last fetched from the backend.

use crate::error::ViewerError;
use crate::io::backend::ReportStore;
use crate::models::report::{Report, ReportId};
use crate::models::slide::SlideId;

use super::session::Ticket;

/// A list fetch to dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub slide: SlideId,
    pub ticket: Ticket,
}

#[derive(Debug, Default)]
pub struct ReportList {
    slide: Option<SlideId>,
    reports: Vec<Report>,
    ticket: Ticket,
    loading: bool,
    error: Option<String>,
}

impl ReportList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slide(&self) -> Option<&SlideId> {
        self.slide.as_ref()
    }

    /// Reports in backend order.
    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn find(&self, id: ReportId) -> Option<&Report> {
        self.reports.iter().find(|r| r.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Switch to another slide (or none), clearing the current list.
    pub fn select(&mut self, slide: Option<SlideId>) -> Option<ListRequest> {
        if self.slide == slide {
            return None;
        }
        self.slide = slide;
        self.reports.clear();
        self.error = None;
        self.loading = false;
        self.ticket += 1;
        self.refresh()
    }

    /// Request a fresh copy of the list. Older in-flight fetches become stale.
    pub fn refresh(&mut self) -> Option<ListRequest> {
        let slide = self.slide.clone()?;
        self.ticket += 1;
        self.loading = true;
        Some(ListRequest {
            slide,
            ticket: self.ticket,
        })
    }

    /// Apply a fetch result. Returns `false` if the fetch was superseded.
    pub fn loaded(&mut self, ticket: Ticket, result: Result<Vec<Report>, ViewerError>) -> bool {
        if ticket != self.ticket {
            log::debug!("Dropping stale report list (ticket {} != {})", ticket, self.ticket);
            return false;
        }
        self.loading = false;
        match result {
            Ok(reports) => {
                log::debug!("Loaded {} reports", reports.len());
                self.reports = reports;
                self.error = None;
            }
            Err(e) => {
                log::warn!("{}", e);
                self.error = Some(e.to_string());
            }
        }
        true
    }

    /// Show a failed save whose editor is no longer open.
    ///
    /// Ignored when the list has moved on to another slide.
    pub fn save_failed(&mut self, slide: &SlideId, error: &ViewerError) {
        if self.slide.as_ref() == Some(slide) {
            self.error = Some(format!("Report not saved: {}", error));
        }
    }

    /// Refresh synchronously from `store`.
    pub fn refresh_from(&mut self, store: &dyn ReportStore) -> bool {
        match self.refresh() {
            Some(request) => {
                let result = store.list_reports(&request.slide);
                self.loaded(request.ticket, result)
            }
            None => false,
        }
    }
}
