// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Visio Annotate - bounding box annotation workspace
//!
//! Opens a folder of images, keeps the image list in sync with the folder,
//! tracks labeled bounding boxes per image and persists them to an
//! `annotations.json` sidecar. Export can re-encode the images into a
//! separate output folder together with a matching annotations file.
//!
//! Drawing and gesture handling belong to the front end, which calls the
//! [`Workspace`] commands with rectangles already converted to image space.

pub mod error;
pub mod io;
pub mod models;
pub mod util;
pub mod workspace;

pub use error::{Error, Result};
pub use models::{
    annotation::{Annotation, AnnotationId},
    collection::ImageCollection,
    image::AnnotatedImage,
    settings::WorkspaceSettings,
};
pub use util::geometry::{Point, Rect, Size};
pub use workspace::{ExportOutcome, ReconcileReport, Workspace, WorkspaceOptions};
