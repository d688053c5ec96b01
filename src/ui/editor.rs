// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Report editor window.
//!
//! Edits the open session's buffers directly. Save and print are handed back
//! to the app, which owns the backend and the file dialogs. Changed buffers
//! are only discarded through the Close button.

use crate::report::markup::{self, Format};
use crate::report::session::{ReportSession, SessionMode};

/// Result of editor interaction.
pub enum EditorAction {
    None,
    Save,
    Print,
    Close,
}

/// Display the editor if a session is open.
pub fn show(ctx: &egui::Context, session: &mut ReportSession) -> EditorAction {
    let Some(draft) = session.draft_mut() else {
        return EditorAction::None;
    };
    let mut action = EditorAction::None;
    let heading = match draft.mode {
        SessionMode::New => "New Report".to_string(),
        SessionMode::Edit(id) => format!("Edit Report {}", id),
    };

    egui::Window::new("report_editor")
        .title_bar(false)
        .collapsible(false)
        .default_size([640.0, 480.0])
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .show(ctx, |ui| {
            ui.heading(heading);
            ui.separator();

            let saving = draft.is_saving();
            ui.add_enabled_ui(!saving, |ui| {
                ui.label("Title");
                ui.add(egui::TextEdit::singleline(&mut draft.title).desired_width(f32::INFINITY));
                let content_id = ui.make_persistent_id("report_content");
                ui.horizontal(|ui| {
                    ui.label("Content");
                    ui.separator();
                    let buttons = [
                        (egui::RichText::new("B").strong(), Format::Bold, "Bold"),
                        (egui::RichText::new("I").italics(), Format::Italic, "Italic"),
                        (egui::RichText::new("•"), Format::List, "List"),
                    ];
                    for (label, format, hint) in buttons {
                        if ui.small_button(label).on_hover_text(hint).clicked() {
                            let selection = egui::text_edit::TextEditState::load(ui.ctx(), content_id)
                                .and_then(|state| state.cursor.char_range())
                                .map(|range| range.primary.index..range.secondary.index);
                            markup::apply(&mut draft.content, selection, format);
                        }
                    }
                });
                egui::ScrollArea::vertical().max_height(320.0).show(ui, |ui| {
                    ui.add(
                        egui::TextEdit::multiline(&mut draft.content)
                            .id(content_id)
                            .code_editor()
                            .desired_rows(16)
                            .desired_width(f32::INFINITY),
                    );
                });
            });

            if draft.is_modified() {
                ui.label(egui::RichText::new("Unsaved changes").small().weak());
            }
            if let Some(error) = draft.last_error() {
                ui.colored_label(egui::Color32::LIGHT_RED, error);
            }

            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("🖶 Print").clicked() {
                    action = EditorAction::Print;
                }
                if ui.add_enabled(!saving, egui::Button::new("Save")).clicked() {
                    action = EditorAction::Save;
                }
                if saving {
                    ui.spinner();
                }
                if ui.button("Close").clicked() {
                    action = EditorAction::Close;
                }
            });
        });

    // Escape only dismisses an untouched report
    let modified = draft.is_modified();
    if matches!(action, EditorAction::None)
        && !modified
        && ctx.input(|i| i.key_pressed(egui::Key::Escape))
    {
        action = EditorAction::Close;
    }
    action
}
