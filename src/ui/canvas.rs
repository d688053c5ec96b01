// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Slide canvas.
//!
//! Draws the loaded tiles of the active surface, coarse levels first so finer
//! tiles paint over them as they arrive, and turns drag and scroll input into
//! pan and zoom.

use crate::models::slide::TileKey;
use crate::util::geometry::image_to_screen;
use crate::viewer::controller::{Phase, ViewportController};
use crate::viewer::surface::{Epoch, ViewportSurface};
use std::collections::HashMap;

/// Scroll distance (points) that doubles or halves the zoom.
const SCROLL_PER_DOUBLING: f32 = 240.0;

/// GPU textures for the loaded tiles of one surface.
#[derive(Default)]
pub struct TileTextures {
    epoch: Option<Epoch>,
    textures: HashMap<TileKey, egui::TextureHandle>,
}

impl TileTextures {
    /// Mirror the surface: upload new tiles, drop evicted ones, and start
    /// over when the surface was replaced.
    fn sync(&mut self, ctx: &egui::Context, surface: &ViewportSurface) {
        if self.epoch != Some(surface.epoch()) {
            self.textures.clear();
            self.epoch = Some(surface.epoch());
        }
        self.textures.retain(|key, _| surface.tile(key).is_some());
        for (key, tile) in surface.loaded() {
            if self.textures.contains_key(key) {
                continue;
            }
            let size = [tile.width as usize, tile.height as usize];
            let image = egui::ColorImage::from_rgba_unmultiplied(size, &tile.pixels);
            let name = format!("tile-{}-{}-{}-{}", surface.epoch(), key.level, key.column, key.row);
            let texture = ctx.load_texture(name, image, egui::TextureOptions::LINEAR);
            self.textures.insert(*key, texture);
        }
    }

    pub fn clear(&mut self) {
        self.textures.clear();
        self.epoch = None;
    }
}

/// Display the canvas and apply drag and scroll to the view.
///
/// `notice` replaces the placeholder text while no slide is shown, e.g. after
/// a metadata failure.
pub fn show(
    ui: &mut egui::Ui,
    controller: &mut ViewportController,
    textures: &mut TileTextures,
    notice: Option<&str>,
) {
    let (rect, response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
    ui.painter().rect_filled(rect, 0.0, egui::Color32::from_gray(40));
    controller.set_viewport((rect.width() as f64, rect.height() as f64));

    match controller.phase() {
        Phase::Empty => {
            textures.clear();
            let (text, color) = match notice {
                Some(notice) => (notice, egui::Color32::LIGHT_RED),
                None => ("Select a slide to view", egui::Color32::from_gray(160)),
            };
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                text,
                egui::FontId::proportional(16.0),
                color,
            );
            return;
        }
        Phase::MetadataLoading => {
            textures.clear();
            ui.put(
                egui::Rect::from_center_size(rect.center(), egui::vec2(32.0, 32.0)),
                egui::Spinner::new(),
            );
            return;
        }
        Phase::Ready => {}
    }

    if let Some(view) = controller.view_mut() {
        if response.dragged() {
            let delta = response.drag_delta();
            view.pan_by(delta.x as f64, delta.y as f64);
        }
        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                let anchor = ui
                    .input(|i| i.pointer.hover_pos())
                    .map(|p| p - rect.min)
                    .unwrap_or(rect.size() / 2.0);
                let factor = 2f64.powf((scroll / SCROLL_PER_DOUBLING) as f64);
                view.zoom_at(factor, (anchor.x as f64, anchor.y as f64));
            }
        }
    }

    let (Some(surface), Some(view)) = (controller.surface(), controller.view()) else {
        return;
    };
    textures.sync(ui.ctx(), surface);

    let origin = (rect.min.x as f64, rect.min.y as f64);
    let viewport = view.viewport();
    let visible = view.visible_region();
    let level = surface.metadata().level_for_zoom(view.zoom());

    let mut keys: Vec<&TileKey> = textures
        .textures
        .keys()
        .filter(|key| key.level <= level)
        .collect();
    keys.sort();

    let painter = ui.painter_at(rect);
    for key in keys {
        let area = surface.metadata().tile_rect(key);
        if !area.intersects(&visible) {
            continue;
        }
        let Some(texture) = textures.textures.get(key) else {
            continue;
        };
        let min = image_to_screen((area.x0, area.y0), origin, viewport, view.center(), view.zoom());
        let max = image_to_screen((area.x1, area.y1), origin, viewport, view.center(), view.zoom());
        painter.image(
            texture.id(),
            egui::Rect::from_min_max(
                egui::pos2(min.0 as f32, min.1 as f32),
                egui::pos2(max.0 as f32, max.1 as f32),
            ),
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );
    }

    let status = format!(
        "{}  |  level {}/{}  |  zoom {:.1}%  |  {} tiles loaded, {} pending",
        surface.slide(),
        level,
        surface.metadata().max_level(),
        view.zoom() * 100.0,
        surface.loaded_count(),
        surface.pending_count(),
    );
    painter.text(
        rect.left_bottom() + egui::vec2(8.0, -8.0),
        egui::Align2::LEFT_BOTTOM,
        status,
        egui::FontId::monospace(12.0),
        egui::Color32::from_gray(220),
    );
}
