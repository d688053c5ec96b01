// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! UI components for the slide viewer.

pub mod canvas;
pub mod editor;
pub mod reports;
pub mod sidebar;
