// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Backend access, background workers, tile decoding and report export.

pub mod backend;
pub mod media;
pub mod serialization;
pub mod worker;
