// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! An image file and the annotations drawn on it.
//!
//! The mutation methods keep at most one annotation selected and at most one
//! moving per image. Callers pass coordinates already in image space.

use super::annotation::{Annotation, AnnotationId};
use crate::error::{Error, Result};
use crate::io::media::{self, OutputFormat};
use crate::util::geometry::{Point, Rect, Size};
use std::path::{Path, PathBuf};

/// An image in the workspace, identified by its file path.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedImage {
    pub path: PathBuf,
    /// In creation order.
    pub annotations: Vec<Annotation>,
    pub is_enabled: bool,
    pub is_active: bool,
    pub is_marked: bool,
}

impl AnnotatedImage {
    /// Create an entry with no annotations and default flags.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_annotations(path, Vec::new())
    }

    pub fn with_annotations(path: impl Into<PathBuf>, annotations: Vec<Annotation>) -> Self {
        Self {
            path: path.into(),
            annotations,
            is_enabled: true,
            is_active: false,
            is_marked: false,
        }
    }

    /// File name component of the path.
    pub fn short_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn file_exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn has_active_annotation(&self) -> bool {
        self.active_annotation().is_some()
    }

    /// The first selected annotation, if any.
    pub fn active_annotation(&self) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.is_selected)
    }

    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    /// Pixel dimensions as displayed, or `None` when the file cannot be read.
    pub fn size(&self) -> Option<Size> {
        match media::read_metadata(&self.path) {
            Ok(meta) => Some(meta.display_size()),
            Err(e) => {
                log::debug!("No size for {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Append an annotation labeled `label_<n>` (smallest free `n`) and select it.
    pub fn add_annotation(&mut self, coordinates: Rect) -> AnnotationId {
        let label = self.next_free_label();
        let annotation = Annotation::new(label, coordinates);
        let id = annotation.id;
        log::debug!("Added {} to {}", annotation.label, self.short_name());
        self.annotations.push(annotation);
        self.toggle(id);
        id
    }

    fn next_free_label(&self) -> String {
        (1..)
            .map(|n| format!("label_{}", n))
            .find(|label| !self.annotations.iter().any(|a| &a.label == label))
            .unwrap_or_default()
    }

    /// Select the annotation with `id` and deselect every other one.
    pub fn toggle(&mut self, id: AnnotationId) {
        for annotation in &mut self.annotations {
            annotation.is_selected = annotation.id == id;
        }
    }

    /// Select the annotation and mark it as the only one being moved.
    pub fn begin_moving(&mut self, id: AnnotationId) {
        self.toggle(id);
        for annotation in &mut self.annotations {
            annotation.is_moving = annotation.id == id;
        }
    }

    /// Finish a move: clear every moving flag and set the new origin as given.
    pub fn move_annotation(&mut self, id: AnnotationId, new_origin: Point) {
        for annotation in &mut self.annotations {
            annotation.is_moving = false;
            if annotation.id == id {
                annotation.coordinates.set_origin(new_origin);
            }
        }
    }

    pub fn relabel(&mut self, id: AnnotationId, label: impl Into<String>) -> Result<()> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(Error::EmptyLabel);
        }
        if let Some(annotation) = self.annotations.iter_mut().find(|a| a.id == id) {
            annotation.label = label;
        }
        Ok(())
    }

    pub fn remove(&mut self, id: AnnotationId) {
        self.annotations.retain(|a| a.id != id);
    }

    /// Remove the selected annotation; no-op when nothing is selected.
    pub fn remove_active_annotation(&mut self) {
        if let Some(index) = self.annotations.iter().position(|a| a.is_selected) {
            let removed = self.annotations.remove(index);
            log::debug!("Removed {} from {}", removed.label, self.short_name());
        }
    }

    /// Re-encode the image to `destination` with the codec matching the
    /// source extension.
    ///
    /// With `max_dimension` set, larger images are downsized first. The
    /// returned entry points at `destination` and carries the annotations
    /// scaled per axis by the same factors as the pixels.
    pub fn export_image(
        &self,
        destination: &Path,
        max_dimension: Option<u32>,
    ) -> Result<AnnotatedImage> {
        let format = OutputFormat::for_source(&self.path);
        let decoded = media::decode(&self.path)?;
        let (image, (fx, fy)) = match max_dimension {
            Some(max) => media::fit_within(decoded, max),
            None => (decoded, (1.0, 1.0)),
        };
        media::encode(&image, destination, format)?;

        let mut exported = self.clone();
        exported.path = destination.to_path_buf();
        if (fx, fy) != (1.0, 1.0) {
            for annotation in &mut exported.annotations {
                annotation.coordinates = annotation.coordinates.scaled_xy(fx, fy);
            }
        }
        Ok(exported)
    }
}
