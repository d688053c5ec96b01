// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Slide catalog panel.
//!
//! Upload dialog, folder list with create/rename, and the sortable slide
//! table. The panel only records what the user asked for; the app turns
//! actions into worker jobs and feeds results back.

use crate::error::ViewerError;
use crate::models::catalog::{Folder, FolderId, SlideSort, SlideSummary, SortField};
use crate::models::slide::SlideId;
use crate::report::session::Ticket;
use std::path::PathBuf;

/// Result of sidebar interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum SidebarAction {
    None,
    /// Folder filter changed; the slide list must be refetched.
    FilterChanged,
    SelectSlide(SlideId),
    CreateFolder(String),
    RenameFolder(FolderId, String),
    Upload(PathBuf, Option<FolderId>),
}

#[derive(Debug, Default)]
struct FolderDialog {
    editing: Option<FolderId>,
    name: String,
}

#[derive(Debug, Default)]
struct UploadDialog {
    open: bool,
    file: Option<PathBuf>,
    folder: Option<FolderId>,
    /// Percent sent while an upload is running.
    progress: Option<u8>,
    error: Option<String>,
}

#[derive(Debug, Default)]
pub struct CatalogPanel {
    folders: Vec<Folder>,
    filter: Option<FolderId>,
    slides: Vec<SlideSummary>,
    sort: SlideSort,
    slides_ticket: Ticket,
    error: Option<String>,
    folder_dialog: Option<FolderDialog>,
    upload: UploadDialog,
}

impl CatalogPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&self) -> Option<FolderId> {
        self.filter
    }

    pub fn slides(&self) -> &[SlideSummary] {
        &self.slides
    }

    /// Start a slide list fetch for the current filter.
    pub fn begin_slides(&mut self) -> (Option<FolderId>, Ticket) {
        self.slides_ticket += 1;
        (self.filter, self.slides_ticket)
    }

    pub fn set_filter(&mut self, filter: Option<FolderId>) -> bool {
        if self.filter == filter {
            return false;
        }
        self.filter = filter;
        true
    }

    pub fn folders_loaded(&mut self, result: Result<Vec<Folder>, ViewerError>) {
        match result {
            Ok(folders) => {
                self.folders = folders;
                if self.filter.is_some_and(|id| !self.folders.iter().any(|f| f.id == id)) {
                    self.filter = None;
                }
            }
            Err(e) => {
                log::warn!("{}", e);
                self.error = Some(e.to_string());
            }
        }
    }

    /// Apply a slide list. Lists fetched for an older filter are dropped.
    pub fn slides_loaded(&mut self, ticket: Ticket, result: Result<Vec<SlideSummary>, ViewerError>) {
        if ticket != self.slides_ticket {
            log::debug!("Dropping stale slide list (ticket {})", ticket);
            return;
        }
        match result {
            Ok(mut slides) => {
                self.sort.apply(&mut slides);
                self.slides = slides;
                self.error = None;
            }
            Err(e) => {
                log::warn!("{}", e);
                self.error = Some(e.to_string());
            }
        }
    }

    pub fn folder_changed(&mut self, result: Result<(), ViewerError>) {
        if let Err(e) = result {
            log::warn!("{}", e);
            self.error = Some(e.to_string());
        }
    }

    pub fn sort_by(&mut self, field: SortField) {
        self.sort.toggle(field);
        self.sort.apply(&mut self.slides);
    }

    pub fn upload_progress(&mut self, percent: u8) {
        if self.upload.progress.is_some() {
            self.upload.progress = Some(percent);
        }
    }

    /// Upload finished. Success resets the dialog; failure keeps the chosen
    /// file for a retry. Returns `true` on success.
    pub fn upload_finished(&mut self, result: Result<i64, ViewerError>) -> bool {
        self.upload.progress = None;
        match result {
            Ok(_) => {
                self.upload = UploadDialog::default();
                true
            }
            Err(e) => {
                self.upload.error = Some(e.to_string());
                false
            }
        }
    }

    pub fn is_uploading(&self) -> bool {
        self.upload.progress.is_some()
    }

    fn start_upload(&mut self) -> Option<SidebarAction> {
        let file = self.upload.file.clone()?;
        if self.is_uploading() {
            return None;
        }
        self.upload.progress = Some(0);
        self.upload.error = None;
        Some(SidebarAction::Upload(file, self.upload.folder))
    }

    fn folder_name(&self, id: Option<FolderId>) -> String {
        match id {
            None => "All Slides".to_string(),
            Some(id) => self
                .folders
                .iter()
                .find(|f| f.id == id)
                .map(|f| f.name.clone())
                .unwrap_or_else(|| format!("Folder {}", id.0)),
        }
    }
}

/// Display the catalog panel.
pub fn show(ui: &mut egui::Ui, panel: &mut CatalogPanel, selected: Option<&SlideId>) -> SidebarAction {
    let mut action = SidebarAction::None;

    ui.heading("Slides");
    if ui.add_enabled(!panel.is_uploading(), egui::Button::new("⬆ Upload Slide...")).clicked() {
        panel.upload.open = true;
    }
    ui.separator();

    ui.horizontal(|ui| {
        ui.strong("Folders");
        if ui.small_button("+").on_hover_text("New folder").clicked() {
            panel.folder_dialog = Some(FolderDialog::default());
        }
    });

    let mut filter = panel.filter;
    ui.selectable_value(&mut filter, None, "All Slides");
    for folder in &panel.folders {
        ui.horizontal(|ui| {
            ui.selectable_value(
                &mut filter,
                Some(folder.id),
                format!("{} ({})", folder.name, folder.slide_count),
            );
            if ui.small_button("✏").on_hover_text("Rename folder").clicked() {
                panel.folder_dialog = Some(FolderDialog {
                    editing: Some(folder.id),
                    name: folder.name.clone(),
                });
            }
        });
    }
    if panel.set_filter(filter) {
        action = SidebarAction::FilterChanged;
    }

    ui.separator();
    if let Some(error) = &panel.error {
        ui.colored_label(egui::Color32::LIGHT_RED, error);
    }

    ui.horizontal(|ui| {
        for (field, label) in [
            (SortField::Id, "ID"),
            (SortField::Filename, "Filename"),
            (SortField::CreatedAt, "Created"),
        ] {
            let text = if panel.sort.field == field {
                format!("{} {}", label, if panel.sort.ascending { "⏶" } else { "⏷" })
            } else {
                label.to_string()
            };
            if ui.selectable_label(panel.sort.field == field, text).clicked() {
                panel.sort_by(field);
            }
        }
    });

    egui::ScrollArea::vertical().id_source("slide_table").show(ui, |ui| {
        if panel.slides.is_empty() {
            ui.label(egui::RichText::new("No slides").italics().weak());
        }
        for slide in &panel.slides {
            let id = slide.slide_id();
            let created = slide
                .created_at
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            let label = format!("{:>4}  {}  {}", slide.id, slide.filename, created);
            if ui.selectable_label(selected == Some(&id), label).clicked() {
                action = SidebarAction::SelectSlide(id);
            }
        }
    });

    if let Some(next) = show_folder_dialog(ui.ctx(), panel) {
        action = next;
    }
    if let Some(next) = show_upload_dialog(ui.ctx(), panel) {
        action = next;
    }

    action
}

fn show_folder_dialog(ctx: &egui::Context, panel: &mut CatalogPanel) -> Option<SidebarAction> {
    let dialog = panel.folder_dialog.as_mut()?;
    let title = if dialog.editing.is_some() { "Edit Folder" } else { "New Folder" };
    let mut action = None;
    let mut close = false;

    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.label("Name");
            ui.text_edit_singleline(&mut dialog.name);
            ui.horizontal(|ui| {
                let name = dialog.name.trim().to_string();
                if ui.add_enabled(!name.is_empty(), egui::Button::new("Save")).clicked() {
                    action = Some(match dialog.editing {
                        Some(id) => SidebarAction::RenameFolder(id, name),
                        None => SidebarAction::CreateFolder(name),
                    });
                    close = true;
                }
                if ui.button("Cancel").clicked() {
                    close = true;
                }
            });
        });

    if close {
        panel.folder_dialog = None;
    }
    action
}

fn show_upload_dialog(ctx: &egui::Context, panel: &mut CatalogPanel) -> Option<SidebarAction> {
    if !panel.upload.open {
        return None;
    }
    let mut action = None;
    let mut open = true;
    let folder_names: Vec<(Option<FolderId>, String)> = std::iter::once(None)
        .chain(panel.folders.iter().map(|f| Some(f.id)))
        .map(|id| (id, panel.folder_name(id)))
        .collect();

    egui::Window::new("Upload Slide")
        .collapsible(false)
        .resizable(false)
        .open(&mut open)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                let name = panel
                    .upload
                    .file
                    .as_ref()
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "No file chosen".to_string());
                ui.label(name);
                if ui.add_enabled(!panel.is_uploading(), egui::Button::new("Browse...")).clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Whole-slide images", &["svs", "ndpi"])
                        .pick_file()
                    {
                        panel.upload.file = Some(path);
                    }
                }
            });

            egui::ComboBox::from_label("Folder")
                .selected_text(panel.folder_name(panel.upload.folder))
                .show_ui(ui, |ui| {
                    for (id, name) in &folder_names {
                        ui.selectable_value(&mut panel.upload.folder, *id, name);
                    }
                });

            if let Some(percent) = panel.upload.progress {
                ui.add(egui::ProgressBar::new(percent as f32 / 100.0).show_percentage());
            }
            if let Some(error) = &panel.upload.error {
                ui.colored_label(egui::Color32::LIGHT_RED, error);
            }

            let ready = panel.upload.file.is_some() && !panel.is_uploading();
            if ui.add_enabled(ready, egui::Button::new("Upload")).clicked() {
                action = panel.start_upload();
            }
        });

    if !open && !panel.is_uploading() {
        panel.upload.open = false;
    }
    action
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, name: &str) -> SlideSummary {
        SlideSummary {
            id,
            filename: name.to_string(),
            created_at: None,
            folder_id: None,
            folder_name: None,
        }
    }

    #[test]
    fn test_stale_slide_list_is_dropped() {
        let mut panel = CatalogPanel::new();
        let (_, first) = panel.begin_slides();
        panel.set_filter(Some(FolderId(2)));
        let (filter, second) = panel.begin_slides();
        assert_eq!(filter, Some(FolderId(2)));

        panel.slides_loaded(first, Ok(vec![row(1, "a.svs")]));
        assert!(panel.slides().is_empty());
        panel.slides_loaded(second, Ok(vec![row(2, "b.svs")]));
        assert_eq!(panel.slides()[0].filename, "b.svs");
    }

    #[test]
    fn test_sort_toggle_reorders() {
        let mut panel = CatalogPanel::new();
        let (_, ticket) = panel.begin_slides();
        panel.slides_loaded(ticket, Ok(vec![row(2, "b.svs"), row(1, "c.svs"), row(3, "a.svs")]));

        panel.sort_by(SortField::Filename);
        let names: Vec<_> = panel.slides().iter().map(|s| s.filename.as_str()).collect();
        assert_eq!(names, vec!["a.svs", "b.svs", "c.svs"]);

        panel.sort_by(SortField::Filename);
        assert_eq!(panel.slides()[0].filename, "c.svs");
    }

    #[test]
    fn test_upload_failure_keeps_file() {
        let mut panel = CatalogPanel::new();
        panel.upload.file = Some(PathBuf::from("scan.svs"));
        panel.upload.folder = Some(FolderId(1));

        let action = panel.start_upload().unwrap();
        assert_eq!(action, SidebarAction::Upload(PathBuf::from("scan.svs"), Some(FolderId(1))));
        assert!(panel.is_uploading());
        assert!(panel.start_upload().is_none());

        panel.upload_progress(40);
        assert_eq!(panel.upload.progress, Some(40));

        assert!(!panel.upload_finished(Err(ViewerError::UploadFailed("500".to_string()))));
        assert!(!panel.is_uploading());
        assert_eq!(panel.upload.file, Some(PathBuf::from("scan.svs")));
        assert!(panel.upload.error.is_some());
    }

    #[test]
    fn test_upload_success_resets_dialog() {
        let mut panel = CatalogPanel::new();
        panel.upload.open = true;
        panel.upload.file = Some(PathBuf::from("scan.ndpi"));
        panel.start_upload();
        assert!(panel.upload_finished(Ok(12)));
        assert!(panel.upload.file.is_none());
        assert!(!panel.upload.open);
    }

    #[test]
    fn test_filter_cleared_when_folder_disappears() {
        let mut panel = CatalogPanel::new();
        panel.set_filter(Some(FolderId(9)));
        panel.folders_loaded(Ok(Vec::new()));
        assert_eq!(panel.filter(), None);
    }
}
