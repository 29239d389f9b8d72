// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotations file and workspace settings serialization.
//!
//! The annotations file is a pretty-printed JSON array with one record per
//! image:
//!
//! ```json
//! [
//!   {
//!     "imagefilename": "cat and dog.png",
//!     "annotation": [
//!       { "label": "cat", "coordinates": { "x": 3.9, "y": 2.0, "width": 20.0, "height": 40.1 } }
//!     ]
//!   }
//! ]
//! ```
//!
//! Records store only the file name; paths are rebuilt against the folder
//! the file is loaded from.

use crate::error::{Error, Result};
use crate::models::{annotation::Annotation, image::AnnotatedImage, settings::WorkspaceSettings};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the annotations file in the working or output folder.
pub const ANNOTATIONS_FILE: &str = "annotations.json";

/// Hidden directory holding per-workspace state.
pub const SETTINGS_DIR: &str = ".visioannotate";

pub const SETTINGS_FILE: &str = "workspace.json";

/// One entry of the annotations file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    pub imagefilename: String,
    pub annotation: Vec<Annotation>,
}

impl From<&AnnotatedImage> for ImageRecord {
    fn from(image: &AnnotatedImage) -> Self {
        Self {
            imagefilename: image.short_name(),
            annotation: image.annotations.clone(),
        }
    }
}

impl ImageRecord {
    pub fn into_image(self, folder: &Path) -> AnnotatedImage {
        AnnotatedImage::with_annotations(folder.join(self.imagefilename), self.annotation)
    }
}

pub fn annotations_path(folder: &Path) -> PathBuf {
    folder.join(ANNOTATIONS_FILE)
}

pub fn settings_path(folder: &Path) -> PathBuf {
    folder.join(SETTINGS_DIR).join(SETTINGS_FILE)
}

/// Serialize images to the pretty-printed annotations format.
pub fn encode_annotations(images: &[AnnotatedImage]) -> Result<String> {
    let records: Vec<ImageRecord> = images.iter().map(ImageRecord::from).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

/// Parse an annotations document, resolving file names against `folder`.
///
/// Later duplicates of a file name are dropped.
pub fn decode_annotations(json: &str, folder: &Path) -> Result<Vec<AnnotatedImage>> {
    let records: Vec<ImageRecord> = serde_json::from_str(json)?;
    let mut seen = HashSet::new();
    let mut images = Vec::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.imagefilename.clone()) {
            log::warn!("Duplicate entry for {} ignored", record.imagefilename);
            continue;
        }
        images.push(record.into_image(folder));
    }
    Ok(images)
}

pub fn save_annotations(path: &Path, images: &[AnnotatedImage]) -> Result<()> {
    let json = encode_annotations(images)?;
    fs::write(path, json)?;
    log::info!("Saved {} image records to {}", images.len(), path.display());
    Ok(())
}

pub fn load_annotations(path: &Path, folder: &Path) -> Result<Vec<AnnotatedImage>> {
    let json = fs::read_to_string(path)?;
    decode_annotations(&json, folder)
}

/// Load workspace settings, falling back to defaults when the file is
/// absent, unreadable or malformed.
pub fn load_settings(folder: &Path) -> WorkspaceSettings {
    let path = settings_path(folder);
    if !path.is_file() {
        return WorkspaceSettings::default();
    }
    let parsed: Result<WorkspaceSettings> = fs::read_to_string(&path)
        .map_err(Error::from)
        .and_then(|json| serde_json::from_str(&json).map_err(Error::from));
    match parsed {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("Ignoring settings at {}: {}", path.display(), e);
            WorkspaceSettings::default()
        }
    }
}

/// Write settings pretty-printed, creating the settings directory if needed.
pub fn save_settings(folder: &Path, settings: &WorkspaceSettings) -> Result<()> {
    let dir = folder.join(SETTINGS_DIR);
    if !dir.is_dir() {
        fs::create_dir(&dir)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(dir.join(SETTINGS_FILE), json)?;
    Ok(())
}
