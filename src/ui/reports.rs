// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Report list panel for the selected slide.

use crate::models::report::ReportId;
use crate::report::list::ReportList;

/// Result of report panel interaction.
pub enum ReportsAction {
    None,
    New,
    Edit(ReportId),
    Refresh,
}

/// Display the report list.
pub fn show(ui: &mut egui::Ui, list: &ReportList) -> ReportsAction {
    let mut action = ReportsAction::None;

    ui.horizontal(|ui| {
        ui.heading("Reports");
        if list.is_loading() {
            ui.spinner();
        }
    });

    let Some(slide) = list.slide() else {
        ui.label(egui::RichText::new("No slide selected").italics().weak());
        return action;
    };
    ui.label(egui::RichText::new(slide.as_str()).weak());

    ui.horizontal(|ui| {
        if ui.button("+ New Report").clicked() {
            action = ReportsAction::New;
        }
        if ui.button("⟳").on_hover_text("Reload reports").clicked() {
            action = ReportsAction::Refresh;
        }
    });
    ui.separator();

    if let Some(error) = list.error() {
        ui.colored_label(egui::Color32::LIGHT_RED, error);
    }

    egui::ScrollArea::vertical().id_source("report_list").show(ui, |ui| {
        if list.reports().is_empty() && !list.is_loading() {
            ui.label(egui::RichText::new("No reports yet").italics().weak());
        }
        for report in list.reports() {
            ui.group(|ui| {
                ui.set_width(ui.available_width());
                ui.horizontal(|ui| {
                    ui.strong(&report.title);
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("Edit").clicked() {
                            action = ReportsAction::Edit(report.id);
                        }
                    });
                });
                if let Some(updated) = report.updated_at {
                    ui.label(
                        egui::RichText::new(format!("Updated {}", updated.format("%Y-%m-%d %H:%M")))
                            .small()
                            .weak(),
                    );
                }
            });
        }
    });

    action
}
