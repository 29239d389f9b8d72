// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations: image files, annotation/settings files and folder watching.

pub mod media;
pub mod serialization;
pub mod watcher;
