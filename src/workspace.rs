// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Workspace state and the commands the front end drives it with.
//!
//! A [`Workspace`] owns the working folder, the optional output folder, the
//! image collection, the workspace settings and the view parameters. All
//! mutation happens through `&mut self`, so a single owner serializes user
//! commands and folder change handling. The folder watcher runs on its own
//! thread but only sends events; they are applied when the owner calls
//! [`Workspace::process_watch_events`] or [`Workspace::wait_for_changes`].

use crate::error::{Error, Result};
use crate::io::media;
use crate::io::serialization;
use crate::io::watcher::{FolderWatcher, WatchEvent};
use crate::models::{
    annotation::AnnotationId, collection::ImageCollection, image::AnnotatedImage,
    settings::WorkspaceSettings,
};
use crate::util::geometry::{Point, Rect, Size};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Duration;

/// Runtime options that are not persisted with the workspace.
#[derive(Debug, Clone)]
pub struct WorkspaceOptions {
    /// Watch the working folder for changes.
    pub watch: bool,
    /// Polling interval of the folder watcher.
    pub watch_interval: Duration,
}

impl Default for WorkspaceOptions {
    fn default() -> Self {
        Self {
            watch: true,
            watch_interval: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationState {
    pub is_navigator_visible: bool,
}

/// Changes made by one folder reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: usize,
    pub removed: usize,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// Result of a successful [`Workspace::export`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// No output folder: only the annotations file was written.
    AnnotationsSaved(PathBuf),
    /// Every image was re-encoded into the output folder.
    ImagesExported { count: usize, annotations: PathBuf },
}

/// List recognized, non-hidden image files in `folder`, sorted by name.
pub fn list_images(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        if path.is_file() && media::is_image(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub struct Workspace {
    options: WorkspaceOptions,
    working_folder: Option<PathBuf>,
    output_folder: Option<PathBuf>,
    images: Vec<AnnotatedImage>,
    output_images: Vec<AnnotatedImage>,
    settings: WorkspaceSettings,

    pub navigation: NavigationState,
    pub viewport_size: Size,
    /// Rectangle being dragged out, in viewport space.
    pub draft_coords: Option<Rect>,
    pub drag_from_centre: bool,
    pub show_images_in_sidebar: bool,
    pub cancel_synthetics_process: bool,

    watcher: Option<FolderWatcher>,
    events_tx: Sender<WatchEvent>,
    events_rx: Receiver<WatchEvent>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(WorkspaceOptions::default())
    }
}

impl Workspace {
    pub fn new(options: WorkspaceOptions) -> Self {
        let (events_tx, events_rx) = channel();
        Self {
            options,
            working_folder: None,
            output_folder: None,
            images: Vec::new(),
            output_images: Vec::new(),
            settings: WorkspaceSettings::default(),
            navigation: NavigationState::default(),
            viewport_size: Size::default(),
            draft_coords: None,
            drag_from_centre: true,
            show_images_in_sidebar: true,
            cancel_synthetics_process: false,
            watcher: None,
            events_tx,
            events_rx,
        }
    }

    pub fn working_folder(&self) -> Option<&Path> {
        self.working_folder.as_deref()
    }

    pub fn output_folder(&self) -> Option<&Path> {
        self.output_folder.as_deref()
    }

    pub fn images(&self) -> &[AnnotatedImage] {
        &self.images
    }

    /// Images written by the last successful export to an output folder.
    pub fn output_images(&self) -> &[AnnotatedImage] {
        &self.output_images
    }

    pub fn settings(&self) -> &WorkspaceSettings {
        &self.settings
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    /// Open `path` as the working folder.
    ///
    /// Loads settings and any saved annotations, reconciles with the files
    /// on disk and activates the first image. Returns
    /// [`Error::NotADirectory`] without touching state if `path` is not a
    /// directory.
    pub fn set_working_folder(&mut self, path: &Path) -> Result<()> {
        if !path.is_dir() {
            return Err(Error::NotADirectory(path.to_path_buf()));
        }
        let folder = fs::canonicalize(path)?;

        let watcher = if self.options.watch {
            Some(FolderWatcher::spawn(
                &folder,
                self.options.watch_interval,
                self.events_tx.clone(),
            )?)
        } else {
            None
        };
        self.watcher = watcher;
        self.drain_events();

        self.working_folder = Some(folder.clone());
        self.settings = serialization::load_settings(&folder);
        self.images = load_saved_annotations(&folder);
        self.output_images.clear();
        self.reconcile()?;

        self.navigation.is_navigator_visible = true;
        if let Some(first) = self.images.first_mut() {
            first.is_active = true;
        }
        log::info!(
            "Opened {} with {} images",
            folder.display(),
            self.images.len()
        );
        Ok(())
    }

    /// Close the workspace: clears images, settings and both folders.
    pub fn unset_working_folder(&mut self) {
        self.watcher = None;
        self.drain_events();
        self.images.clear();
        self.output_images.clear();
        self.settings = WorkspaceSettings::default();
        self.working_folder = None;
        self.output_folder = None;
        log::info!("Closed working folder");
    }

    pub fn set_output_folder(&mut self, path: &Path) -> Result<()> {
        if !path.is_dir() {
            return Err(Error::NotADirectory(path.to_path_buf()));
        }
        let folder = fs::canonicalize(path)?;
        if self.working_folder.as_ref() == Some(&folder) {
            log::warn!("Output folder is the working folder; export will overwrite sources");
        }
        log::info!("Output folder set to {}", folder.display());
        self.output_folder = Some(folder);
        Ok(())
    }

    pub fn unset_output_folder(&mut self) {
        self.output_folder = None;
    }

    /// Mutate the settings and write them to the workspace.
    pub fn update_settings(&mut self, update: impl FnOnce(&mut WorkspaceSettings)) {
        update(&mut self.settings);
        self.persist_settings();
    }

    pub fn set_settings(&mut self, settings: WorkspaceSettings) {
        self.update_settings(|current| *current = settings);
    }

    fn persist_settings(&self) {
        let Some(folder) = &self.working_folder else {
            return;
        };
        if let Err(e) = serialization::save_settings(folder, &self.settings) {
            log::error!(
                "Failed to save settings to {}: {}",
                serialization::settings_path(folder).display(),
                e
            );
        }
    }

    /// Bring the collection in line with the working folder's image files.
    ///
    /// Entries whose file is gone are dropped and new files are appended
    /// with no annotations. Existing entries keep their order and content,
    /// so running this again without filesystem changes does nothing.
    pub fn reconcile(&mut self) -> Result<ReconcileReport> {
        let Some(folder) = &self.working_folder else {
            return Ok(ReconcileReport::default());
        };
        let files = list_images(folder)?;

        let on_disk: HashSet<&PathBuf> = files.iter().collect();
        let before = self.images.len();
        self.images.retain(|image| on_disk.contains(&image.path));
        let removed = before - self.images.len();

        let known: HashSet<PathBuf> = self.images.iter().map(|i| i.path.clone()).collect();
        let mut added = 0;
        for file in files {
            if !known.contains(&file) {
                self.images.push(AnnotatedImage::new(file));
                added += 1;
            }
        }

        let report = ReconcileReport { added, removed };
        if !report.is_empty() {
            log::info!(
                "Reconciled {}: {} added, {} removed",
                folder.display(),
                added,
                removed
            );
        }
        Ok(report)
    }

    /// Apply pending folder change events without blocking.
    ///
    /// A burst of events results in one reconciliation. Returns `None` when
    /// there was nothing to do.
    pub fn process_watch_events(&mut self) -> Option<ReconcileReport> {
        self.handle_events(None)
    }

    /// Block up to `timeout` for a folder change, then apply it.
    pub fn wait_for_changes(&mut self, timeout: Duration) -> Option<ReconcileReport> {
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => self.handle_events(Some(event)),
            Err(_) => None,
        }
    }

    fn handle_events(&mut self, first: Option<WatchEvent>) -> Option<ReconcileReport> {
        let mut relevant = false;
        for event in first.into_iter().chain(self.events_rx.try_iter()) {
            if self.working_folder.as_deref() == Some(event.folder.as_path()) {
                relevant = true;
            } else {
                log::debug!("Dropping stale event for {}", event.folder.display());
            }
        }
        if !relevant {
            return None;
        }
        match self.reconcile() {
            Ok(report) => Some(report),
            Err(e) => {
                log::error!("Folder rescan failed: {}", e);
                None
            }
        }
    }

    fn drain_events(&self) {
        for event in self.events_rx.try_iter() {
            log::debug!("Discarding event for {}", event.folder.display());
        }
    }

    /// Write `annotations.json` for the whole collection to the working folder.
    pub fn save_annotations(&self) -> Result<PathBuf> {
        let folder = self.working_folder.as_ref().ok_or(Error::NoWorkingFolder)?;
        let path = serialization::annotations_path(folder);
        serialization::save_annotations(&path, &self.images).inspect_err(|e| {
            log::error!("Failed to save {}: {}", path.display(), e);
        })?;
        Ok(path)
    }

    /// Export the workspace.
    ///
    /// Without an output folder this only saves the annotations file. With
    /// one, every image is re-encoded into it and an annotations file
    /// covering the exported copies is written next to them. The first
    /// image that fails aborts the export before the annotations file is
    /// written, and the error names that image.
    pub fn export(&mut self) -> Result<ExportOutcome> {
        if self.working_folder.is_none() {
            return Err(Error::NoWorkingFolder);
        }
        let Some(out) = self.output_folder.clone() else {
            log::info!("No output folder set, saving annotations only");
            return self.save_annotations().map(ExportOutcome::AnnotationsSaved);
        };

        let max_dimension = self.settings.export_max_dimension;
        let mut exported = Vec::with_capacity(self.images.len());
        for image in &self.images {
            let destination = out.join(image.short_name());
            match image.export_image(&destination, max_dimension) {
                Ok(copy) => exported.push(copy),
                Err(e) => {
                    log::error!("Export of {} failed: {}", image.short_name(), e);
                    return Err(Error::Export {
                        image: image.short_name(),
                        source: Box::new(e),
                    });
                }
            }
        }

        let annotations = serialization::annotations_path(&out);
        serialization::save_annotations(&annotations, &exported).inspect_err(|e| {
            log::error!("Failed to save {}: {}", annotations.display(), e);
        })?;
        let count = exported.len();
        self.output_images = exported;
        log::info!("Exported {} images to {}", count, out.display());
        Ok(ExportOutcome::ImagesExported { count, annotations })
    }

    pub fn active_image_index(&self) -> Option<usize> {
        self.images.active_index()
    }

    pub fn active_image(&self) -> Option<&AnnotatedImage> {
        self.images.active()
    }

    /// Viewport width over the active image's width.
    pub fn current_scale_factor(&self) -> Option<f64> {
        let size = self.active_image()?.size()?;
        if size.width <= 0.0 {
            return None;
        }
        Some(self.viewport_size.width / size.width)
    }

    /// Images with `is_enabled` cleared, counted in the export list when an
    /// output folder is set.
    pub fn pending_images(&self) -> usize {
        let images = if self.output_folder.is_some() {
            &self.output_images
        } else {
            &self.images
        };
        images.iter().filter(|image| !image.is_enabled).count()
    }

    pub fn toggle_navigator(&mut self) {
        self.navigation.is_navigator_visible = !self.navigation.is_navigator_visible;
    }

    pub fn activate_image(&mut self, path: &Path) -> bool {
        self.images.activate(path)
    }

    /// Flip the marked flag of the image at `path`.
    pub fn toggle_marked(&mut self, path: &Path) -> bool {
        match self.image_mut(path) {
            Some(image) => {
                image.is_marked = !image.is_marked;
                true
            }
            None => false,
        }
    }

    pub fn set_enabled(&mut self, path: &Path, enabled: bool) -> bool {
        match self.image_mut(path) {
            Some(image) => {
                image.is_enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn activate_next_image(&mut self) {
        self.images.activate_next(false);
    }

    pub fn activate_previous_image(&mut self) {
        self.images.activate_next(true);
    }

    pub fn marked_images(&self) -> Vec<&AnnotatedImage> {
        self.images.marked()
    }

    fn image_mut(&mut self, path: &Path) -> Option<&mut AnnotatedImage> {
        self.images.iter_mut().find(|image| image.path == path)
    }

    /// Add an annotation in image space to the active image.
    pub fn add_annotation(&mut self, coordinates: Rect) -> Option<AnnotationId> {
        self.images
            .active_mut()
            .map(|image| image.add_annotation(coordinates))
    }

    /// Add an annotation to a specific image, whether or not it is active.
    pub fn add_annotation_to(&mut self, path: &Path, coordinates: Rect) -> Result<AnnotationId> {
        let image = self
            .image_mut(path)
            .ok_or_else(|| Error::ImageNotFound(path.to_path_buf()))?;
        Ok(image.add_annotation(coordinates))
    }

    pub fn toggle_annotation(&mut self, id: AnnotationId) {
        if let Some(image) = self.images.active_mut() {
            image.toggle(id);
        }
    }

    pub fn begin_moving_annotation(&mut self, id: AnnotationId) {
        if let Some(image) = self.images.active_mut() {
            image.begin_moving(id);
        }
    }

    pub fn move_annotation(&mut self, id: AnnotationId, new_origin: Point) {
        if let Some(image) = self.images.active_mut() {
            image.move_annotation(id, new_origin);
        }
    }

    pub fn remove_annotation(&mut self, id: AnnotationId) {
        if let Some(image) = self.images.active_mut() {
            image.remove(id);
        }
    }

    pub fn relabel_annotation(&mut self, id: AnnotationId, label: &str) -> Result<()> {
        match self.images.active_mut() {
            Some(image) => image.relabel(id, label),
            None => Ok(()),
        }
    }

    pub fn remove_active_annotation(&mut self) {
        self.images.remove_active_annotation();
    }
}

fn load_saved_annotations(folder: &Path) -> Vec<AnnotatedImage> {
    let path = serialization::annotations_path(folder);
    if !path.is_file() {
        return Vec::new();
    }
    match serialization::load_annotations(&path, folder) {
        Ok(images) => images,
        Err(e) => {
            log::warn!("Ignoring unreadable {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unwatched() -> Workspace {
        Workspace::new(WorkspaceOptions {
            watch: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_new_workspace_defaults() {
        let workspace = unwatched();
        assert!(workspace.working_folder().is_none());
        assert!(workspace.images().is_empty());
        assert!(workspace.drag_from_centre);
        assert!(workspace.show_images_in_sidebar);
        assert!(!workspace.navigation.is_navigator_visible);
        assert_eq!(workspace.current_scale_factor(), None);
    }

    #[test]
    fn test_invalid_folders_leave_state_alone() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.png");
        fs::write(&file, b"x").unwrap();

        let mut workspace = unwatched();
        assert!(matches!(
            workspace.set_working_folder(&file),
            Err(Error::NotADirectory(_))
        ));
        assert!(workspace.set_output_folder(&dir.path().join("missing")).is_err());
        assert!(workspace.working_folder().is_none());
        assert!(workspace.output_folder().is_none());
    }

    #[test]
    fn test_commands_without_workspace_are_noops() {
        let mut workspace = unwatched();
        assert_eq!(workspace.add_annotation(Rect::new(0.0, 0.0, 1.0, 1.0)), None);
        workspace.activate_next_image();
        workspace.remove_active_annotation();
        assert_eq!(workspace.reconcile().unwrap(), ReconcileReport::default());
        assert_eq!(workspace.process_watch_events(), None);
        assert!(matches!(workspace.export(), Err(Error::NoWorkingFolder)));
        assert!(matches!(workspace.save_annotations(), Err(Error::NoWorkingFolder)));
    }

    #[test]
    fn test_settings_without_folder_are_not_written() {
        let mut workspace = unwatched();
        workspace.update_settings(|s| s.labels.push("cat".into()));
        assert_eq!(workspace.settings().labels, ["cat"]);
    }

    #[test]
    fn test_toggle_navigator() {
        let mut workspace = unwatched();
        workspace.toggle_navigator();
        assert!(workspace.navigation.is_navigator_visible);
        workspace.toggle_navigator();
        assert!(!workspace.navigation.is_navigator_visible);
    }
}
