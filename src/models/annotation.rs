// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! An annotation is a labeled bounding box in the image's native pixel
//! space. Only the label and the four coordinate numbers are persisted;
//! the id and the transient selection flags live for a single session.

use crate::util::geometry::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Session-scoped identity of an annotation.
///
/// Ids are not persisted, so annotations reloaded from disk get fresh ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnnotationId(Uuid);

impl AnnotationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnnotationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A labeled bounding box.
///
/// In memory `coordinates` is read with a centered origin by the drawing and
/// movement code, while the annotations file calls the same `x`/`y` a
/// top-left origin. The numbers are never converted between the two, so
/// a load followed by a save reproduces them exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(skip, default = "AnnotationId::new")]
    pub id: AnnotationId,
    pub label: String,
    pub coordinates: Rect,
    #[serde(skip)]
    pub is_selected: bool,
    #[serde(skip)]
    pub is_moving: bool,
}

impl Annotation {
    /// Create an unselected annotation with a fresh id.
    pub fn new(label: impl Into<String>, coordinates: Rect) -> Self {
        Self {
            id: AnnotationId::new(),
            label: label.into(),
            coordinates,
            is_selected: false,
            is_moving: false,
        }
    }

    pub fn origin(&self) -> Point {
        self.coordinates.origin()
    }

    pub fn size(&self) -> Size {
        self.coordinates.size()
    }

    pub fn width(&self) -> f64 {
        self.coordinates.width
    }

    pub fn height(&self) -> f64 {
        self.coordinates.height
    }
}

/// Identity comparison: two annotations are equal only if they share an id.
impl PartialEq for Annotation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Annotation {}
