// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model shared by the viewer, the report session and the backend client.

pub mod catalog;
pub mod report;
pub mod slide;
pub mod timestamp;
