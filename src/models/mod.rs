// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model: annotations, annotated images and workspace settings.

pub mod annotation;
pub mod collection;
pub mod image;
pub mod settings;
