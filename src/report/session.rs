// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Report editing session.
//!
//! At most one session is open. Opening a report copies its title and content
//! into the session buffers; nothing reaches the backend until `save`. A save
//! sends `id` only when editing an existing report, so a new report is always
//! a create and an existing one is always an update of the same id.
//!
//! Every open bumps a ticket. A save completion for an older ticket never
//! closes or modifies the session that replaced it.

use super::print::render_printable;
use crate::error::ViewerError;
use crate::io::backend::ReportStore;
use crate::models::report::{Report, ReportId, SaveReportRequest};
use crate::models::slide::SlideId;

/// Identifies one opening of the session.
pub type Ticket = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    New,
    Edit(ReportId),
}

/// Buffers of the open session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub mode: SessionMode,
    pub title: String,
    /// Rich-text markup.
    pub content: String,
    /// Buffers as they were when the session opened.
    opened_with: (String, String),
    saving: bool,
    last_error: Option<String>,
}

impl Draft {
    fn new(mode: SessionMode, title: String, content: String) -> Self {
        Self {
            mode,
            opened_with: (title.clone(), content.clone()),
            title,
            content,
            saving: false,
            last_error: None,
        }
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Whether either buffer differs from what the session opened with.
    pub fn is_modified(&self) -> bool {
        self.title != self.opened_with.0 || self.content != self.opened_with.1
    }

    /// Message of the last failed save, kept until the next attempt.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

/// A save handed to the backend, to be passed back to `finish_save`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSave {
    pub ticket: Ticket,
    pub request: SaveReportRequest,
}

/// Result of a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    pub id: ReportId,
    pub created: bool,
}

#[derive(Debug, Default)]
pub struct ReportSession {
    draft: Option<Draft>,
    ticket: Ticket,
}

impl ReportSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.draft.is_some()
    }

    pub fn mode(&self) -> Option<SessionMode> {
        self.draft.as_ref().map(|d| d.mode)
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut Draft> {
        self.draft.as_mut()
    }

    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// Whether `pending` was started by the session that is open now.
    pub fn owns(&self, pending: &PendingSave) -> bool {
        pending.ticket == self.ticket && self.draft.is_some()
    }

    /// Start a blank report, discarding any open buffers.
    pub fn open_new(&mut self) {
        self.replace(Draft::new(SessionMode::New, String::new(), String::new()));
    }

    /// Edit a copy of `report`, discarding any open buffers.
    pub fn open_edit(&mut self, report: &Report) {
        self.replace(Draft::new(
            SessionMode::Edit(report.id),
            report.title.clone(),
            report.content.clone(),
        ));
    }

    /// Discard the buffers without saving.
    pub fn close(&mut self) {
        if self.draft.take().is_some() {
            self.ticket += 1;
        }
    }

    fn replace(&mut self, draft: Draft) {
        if let Some(old) = &self.draft {
            log::debug!("Discarding open report buffers ({:?})", old.mode);
        }
        self.ticket += 1;
        self.draft = Some(draft);
    }

    /// Build the save payload and mark a save in flight.
    pub fn begin_save(&mut self) -> Result<PendingSave, ViewerError> {
        let draft = self
            .draft
            .as_mut()
            .ok_or(ViewerError::InvalidSession("no report is open"))?;
        if draft.saving {
            return Err(ViewerError::InvalidSession("a save is already in progress"));
        }
        draft.saving = true;
        draft.last_error = None;

        let id = match draft.mode {
            SessionMode::New => None,
            SessionMode::Edit(id) => Some(id),
        };
        Ok(PendingSave {
            ticket: self.ticket,
            request: SaveReportRequest {
                id,
                title: draft.title.clone(),
                content: draft.content.clone(),
            },
        })
    }

    /// Apply the backend's answer to `pending`.
    ///
    /// Success closes the session if it is still the one that started the
    /// save. Failure leaves the buffers in place for a retry. Either way the
    /// result is returned so the caller can refresh the report list.
    pub fn finish_save(
        &mut self,
        pending: PendingSave,
        result: Result<ReportId, ViewerError>,
    ) -> Result<SaveOutcome, ViewerError> {
        let current = self.owns(&pending);
        if !current {
            log::debug!("Save for ticket {} finished after the session moved on", pending.ticket);
        }

        match result {
            Ok(id) => {
                let outcome = SaveOutcome {
                    id,
                    created: pending.request.id.is_none(),
                };
                log::info!(
                    "Saved report {} ({})",
                    id,
                    if outcome.created { "created" } else { "updated" }
                );
                if current {
                    self.close();
                }
                Ok(outcome)
            }
            Err(e) => {
                log::error!("Report save failed: {}", e);
                if current {
                    if let Some(draft) = self.draft.as_mut() {
                        draft.saving = false;
                        draft.last_error = Some(e.to_string());
                    }
                }
                Err(e)
            }
        }
    }

    /// Save synchronously through `store`.
    pub fn save(&mut self, store: &dyn ReportStore, slide: &SlideId) -> Result<SaveOutcome, ViewerError> {
        let pending = self.begin_save()?;
        let result = store.save_report(slide, &pending.request);
        self.finish_save(pending, result)
    }

    /// Printable rendering of the open buffers. Does not touch session state.
    pub fn printable_document(&self) -> Option<String> {
        self.draft
            .as_ref()
            .map(|d| render_printable(&d.title, &d.content))
    }
}
