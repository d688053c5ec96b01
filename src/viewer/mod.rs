// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Tile-pyramid viewer: addressing, view geometry, surface and controller.

pub mod addressing;
pub mod controller;
pub mod surface;
pub mod view;
