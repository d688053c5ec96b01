// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Per-slide pathology reports: listing, editing, markup helpers and the
//! printable rendering.

pub mod list;
pub mod markup;
pub mod print;
pub mod session;
