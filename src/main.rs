// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! PathView - whole-slide image viewer
//!
//! A cross-platform desktop application for browsing tiled whole-slide
//! images served by a slide backend and writing per-slide pathology reports.

mod app;
mod config;
mod error;
mod io;
mod models;
mod report;
mod ui;
mod util;
mod viewer;

use anyhow::{Context, Result};
use app::PathViewApp;
use config::Config;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let config = Config::load().context("loading configuration")?;

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_min_inner_size([900.0, 600.0])
            .with_title("PathView"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "PathView",
        options,
        Box::new(move |cc| Ok(Box::new(PathViewApp::new(cc, &config)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
