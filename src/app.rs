// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! The app owns the viewer controller, the report list and session, and the
//! catalog panel. Each frame it drains worker events into those state
//! machines, draws the panels, and dispatches whatever requests the
//! interaction produced.

use crate::config::Config;
use crate::io::backend::HttpBackend;
use crate::io::serialization;
use crate::io::worker::{Dispatcher, Job, WorkerEvent};
use crate::models::report::ReportExport;
use crate::models::slide::SlideId;
use crate::report::list::ReportList;
use crate::report::session::ReportSession;
use crate::ui::canvas::{self, TileTextures};
use crate::ui::editor::{self, EditorAction};
use crate::ui::reports::{self, ReportsAction};
use crate::ui::sidebar::{self, CatalogPanel, SidebarAction};
use crate::viewer::addressing::TileAddressing;
use crate::viewer::controller::ViewportController;
use std::path::PathBuf;
use std::sync::Arc;

/// Main application state.
pub struct PathViewApp {
    /// Slide viewer state machine
    controller: ViewportController,

    /// Textures mirroring the controller's loaded tiles
    textures: TileTextures,

    /// Reports of the selected slide
    reports: ReportList,

    /// Open report editor, if any
    session: ReportSession,

    /// Folders, slide table and upload dialog
    catalog: CatalogPanel,

    /// Background workers
    dispatcher: Dispatcher,

    /// Message shown on the canvas when a slide failed to open
    viewer_notice: Option<String>,

    show_about: bool,
}

impl PathViewApp {
    /// Create the application and request the initial catalog.
    pub fn new(cc: &eframe::CreationContext<'_>, config: &Config) -> Self {
        let ctx = cc.egui_ctx.clone();
        let backend = Arc::new(HttpBackend::new(config.endpoint.clone()));
        let dispatcher = Dispatcher::new(backend, config.fetch_workers, Arc::new(move || ctx.request_repaint()));
        let addressing = TileAddressing::new(config.endpoint.clone(), config.tile_format.clone());
        log::info!("Using backend {}", addressing.endpoint());

        let mut app = Self {
            controller: ViewportController::new(addressing, config.tile_cache_capacity),
            textures: TileTextures::default(),
            reports: ReportList::new(),
            session: ReportSession::new(),
            catalog: CatalogPanel::new(),
            dispatcher,
            viewer_notice: None,
            show_about: false,
        };
        app.refresh_catalog();
        app
    }

    fn refresh_catalog(&mut self) {
        self.dispatcher.submit(Job::Folders);
        self.refresh_slides();
    }

    fn refresh_slides(&mut self) {
        let (folder, ticket) = self.catalog.begin_slides();
        self.dispatcher.submit(Job::Slides { folder, ticket });
    }

    /// Open `slide` in the viewer and load its reports.
    fn select_slide(&mut self, slide: SlideId) {
        if let Some(request) = self.controller.select_slide(slide.clone()) {
            self.viewer_notice = None;
            self.dispatcher.set_live_epoch(request.epoch);
            self.dispatcher.submit(Job::Metadata(request));
        }
        if let Some(request) = self.reports.select(Some(slide)) {
            self.dispatcher.submit(Job::Reports(request));
        }
    }

    fn refresh_reports(&mut self) {
        if let Some(request) = self.reports.refresh() {
            self.dispatcher.submit(Job::Reports(request));
        }
    }

    /// Apply every worker result that arrived since the last frame.
    fn handle_events(&mut self) {
        for event in self.dispatcher.poll() {
            match event {
                WorkerEvent::Metadata { epoch, result } => {
                    if let Err(e) = self.controller.metadata_loaded(epoch, result) {
                        self.viewer_notice = Some(e.to_string());
                    }
                }
                WorkerEvent::Tile(completion) => {
                    self.controller.tile_completed(completion);
                }
                WorkerEvent::Reports { ticket, result } => {
                    self.reports.loaded(ticket, result);
                }
                WorkerEvent::Saved { slide, pending, result } => {
                    // The editor shows its own errors; a closed or replaced one cannot
                    let owned = self.session.owns(&pending);
                    match self.session.finish_save(pending, result) {
                        Ok(_) if self.reports.slide() == Some(&slide) => self.refresh_reports(),
                        Ok(_) => {}
                        Err(e) if !owned => self.reports.save_failed(&slide, &e),
                        Err(_) => {}
                    }
                }
                WorkerEvent::Folders(result) => self.catalog.folders_loaded(result),
                WorkerEvent::Slides { ticket, result } => self.catalog.slides_loaded(ticket, result),
                WorkerEvent::FolderChanged(result) => {
                    self.catalog.folder_changed(result);
                    self.dispatcher.submit(Job::Folders);
                }
                WorkerEvent::UploadProgress(percent) => self.catalog.upload_progress(percent),
                WorkerEvent::UploadFinished(result) => {
                    if self.catalog.upload_finished(result) {
                        self.refresh_catalog();
                    }
                }
            }
        }
    }

    fn save_report(&mut self) {
        let Some(slide) = self.reports.slide().cloned() else {
            return;
        };
        match self.session.begin_save() {
            Ok(pending) => self.dispatcher.submit(Job::SaveReport { slide, pending }),
            Err(e) => log::warn!("{}", e),
        }
    }

    /// Write the open report as a standalone HTML document.
    fn print_report(&self) {
        let Some(document) = self.session.printable_document() else {
            return;
        };
        let name = self
            .session
            .draft()
            .map(|d| d.title.trim())
            .filter(|t| !t.is_empty())
            .unwrap_or("report");
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("HTML", &["html", "htm"])
            .set_file_name(format!("{}.html", name))
            .save_file()
        {
            match std::fs::write(&path, document) {
                Ok(()) => log::info!("Printed report to {}", path.display()),
                Err(e) => log::error!("Failed to write {}: {}", path.display(), e),
            }
        }
    }

    /// Export the loaded reports of the current slide.
    fn export_reports(&self, path: PathBuf) {
        let Some(slide) = self.reports.slide() else {
            return;
        };
        let data = ReportExport {
            slide: slide.clone(),
            exported_at: Some(chrono::Utc::now()),
            reports: self.reports.reports().to_vec(),
        };
        let extension = path.extension().and_then(|s| s.to_str());
        let result = match extension {
            Some("yaml") | Some("yml") => serialization::export_yaml(&data, &path),
            Some("json") => serialization::export_json(&data, &path),
            _ => Err(anyhow::anyhow!("Unsupported file extension: {:?}", extension)),
        };
        if let Err(e) = result {
            log::error!("Failed to export reports: {:#}", e);
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    let has_slide = self.reports.slide().is_some();
                    ui.add_enabled_ui(has_slide, |ui| {
                        ui.menu_button("Export Reports", |ui| {
                            if ui.button("Export as YAML...").clicked() {
                                if let Some(path) = rfd::FileDialog::new()
                                    .add_filter("YAML", &["yaml", "yml"])
                                    .set_file_name("reports.yaml")
                                    .save_file()
                                {
                                    self.export_reports(path);
                                }
                                ui.close_menu();
                            }
                            if ui.button("Export as JSON...").clicked() {
                                if let Some(path) = rfd::FileDialog::new()
                                    .add_filter("JSON", &["json"])
                                    .set_file_name("reports.json")
                                    .save_file()
                                {
                                    self.export_reports(path);
                                }
                                ui.close_menu();
                            }
                        });
                    });
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui.button("Zoom In").clicked() {
                        if let Some(view) = self.controller.view_mut() {
                            view.zoom_by(2.0);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Zoom Out").clicked() {
                        if let Some(view) = self.controller.view_mut() {
                            view.zoom_by(0.5);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Home").clicked() {
                        self.controller.home();
                        ui.close_menu();
                    }
                });

                ui.menu_button("Help", |ui| {
                    if ui.button("About").clicked() {
                        self.show_about = true;
                        ui.close_menu();
                    }
                });
            });
        });

        egui::Window::new("About")
            .open(&mut self.show_about)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.heading("PathView");
                ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
                ui.label("Whole-slide image viewer with per-slide pathology reports.");
            });
    }
}

impl eframe::App for PathViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_events();
        self.menu_bar(ctx);

        let editing = self.session.is_open();

        // Slide catalog (left side)
        let sidebar_action = egui::SidePanel::left("catalog")
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.add_enabled_ui(!editing, |ui| {
                    sidebar::show(ui, &mut self.catalog, self.controller.slide())
                })
                .inner
            })
            .inner;

        match sidebar_action {
            SidebarAction::FilterChanged => self.refresh_slides(),
            SidebarAction::SelectSlide(slide) => self.select_slide(slide),
            SidebarAction::CreateFolder(name) => self.dispatcher.submit(Job::CreateFolder(name)),
            SidebarAction::RenameFolder(id, name) => self.dispatcher.submit(Job::RenameFolder { id, name }),
            SidebarAction::Upload(path, folder) => self.dispatcher.upload(path, folder),
            SidebarAction::None => {}
        }

        // Report list (right side)
        let reports_action = egui::SidePanel::right("reports")
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.add_enabled_ui(!editing, |ui| reports::show(ui, &self.reports)).inner
            })
            .inner;

        match reports_action {
            ReportsAction::New => self.session.open_new(),
            ReportsAction::Edit(id) => {
                if let Some(report) = self.reports.find(id).cloned() {
                    self.session.open_edit(&report);
                }
            }
            ReportsAction::Refresh => self.refresh_reports(),
            ReportsAction::None => {}
        }

        // Slide canvas (center)
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                canvas::show(ui, &mut self.controller, &mut self.textures, self.viewer_notice.as_deref());
            });

        for request in self.controller.visible_requests() {
            self.dispatcher.submit(Job::Tile(request));
        }

        match editor::show(ctx, &mut self.session) {
            EditorAction::Save => self.save_report(),
            EditorAction::Print => self.print_report(),
            EditorAction::Close => self.session.close(),
            EditorAction::None => {}
        }
    }
}
