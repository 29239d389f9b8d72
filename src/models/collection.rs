// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Operations over the ordered image collection.
//!
//! At most one image in a collection is active. Navigation moves that flag
//! to a neighbour and stops at either end.

use super::image::AnnotatedImage;
use std::path::Path;

/// Cursor and filtering helpers for a slice of images.
pub trait ImageCollection {
    /// Images with `is_marked` set, in collection order.
    fn marked(&self) -> Vec<&AnnotatedImage>;

    fn active_index(&self) -> Option<usize>;

    fn active(&self) -> Option<&AnnotatedImage>;

    fn active_mut(&mut self) -> Option<&mut AnnotatedImage>;

    fn position_of(&self, path: &Path) -> Option<usize>;

    /// Remove the selected annotation of the active image, if there is one.
    fn remove_active_annotation(&mut self);

    /// Move the active flag one step forward (or back with `reverse`).
    fn activate_next(&mut self, reverse: bool);

    /// Make the image at `path` the only active one. Returns false if absent.
    fn activate(&mut self, path: &Path) -> bool;
}

impl ImageCollection for [AnnotatedImage] {
    fn marked(&self) -> Vec<&AnnotatedImage> {
        self.iter().filter(|image| image.is_marked).collect()
    }

    fn active_index(&self) -> Option<usize> {
        self.iter().position(|image| image.is_active)
    }

    fn active(&self) -> Option<&AnnotatedImage> {
        self.iter().find(|image| image.is_active)
    }

    fn active_mut(&mut self) -> Option<&mut AnnotatedImage> {
        self.iter_mut().find(|image| image.is_active)
    }

    fn position_of(&self, path: &Path) -> Option<usize> {
        self.iter().position(|image| image.path == path)
    }

    fn remove_active_annotation(&mut self) {
        if let Some(image) = self.active_mut() {
            image.remove_active_annotation();
        }
    }

    fn activate_next(&mut self, reverse: bool) {
        let Some(i) = self.active_index() else {
            return;
        };
        let target = if reverse {
            i.checked_sub(1)
        } else {
            Some(i + 1).filter(|&next| next < self.len())
        };
        if let Some(target) = target {
            self[i].is_active = false;
            self[target].is_active = true;
        }
    }

    fn activate(&mut self, path: &Path) -> bool {
        let Some(target) = self.position_of(path) else {
            return false;
        };
        for (i, image) in self.iter_mut().enumerate() {
            image.is_active = i == target;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::geometry::Rect;

    fn collection(names: &[&str]) -> Vec<AnnotatedImage> {
        names.iter().map(|n| AnnotatedImage::new(*n)).collect()
    }

    fn active_name(images: &[AnnotatedImage]) -> Option<String> {
        images.active().map(|i| i.short_name())
    }

    #[test]
    fn test_marked_preserves_order() {
        let mut images = collection(&["a.png", "b.png", "c.png", "d.png"]);
        images[3].is_marked = true;
        images[1].is_marked = true;

        let names: Vec<String> = images.marked().iter().map(|i| i.short_name()).collect();
        assert_eq!(names, ["b.png", "d.png"]);
    }

    #[test]
    fn test_activate_next_forward_and_back() {
        let mut images = collection(&["a.png", "b.png", "c.png"]);
        images[0].is_active = true;

        images.activate_next(false);
        assert_eq!(active_name(&images).as_deref(), Some("b.png"));
        images.activate_next(false);
        assert_eq!(active_name(&images).as_deref(), Some("c.png"));
        images.activate_next(true);
        assert_eq!(active_name(&images).as_deref(), Some("b.png"));
        assert_eq!(images.iter().filter(|i| i.is_active).count(), 1);
    }

    #[test]
    fn test_activate_next_stops_at_boundaries() {
        let mut images = collection(&["a.png", "b.png"]);
        images[1].is_active = true;
        images.activate_next(false);
        assert_eq!(images.active_index(), Some(1));

        images[1].is_active = false;
        images[0].is_active = true;
        images.activate_next(true);
        assert_eq!(images.active_index(), Some(0));
    }

    #[test]
    fn test_activate_next_without_active_is_noop() {
        let mut images = collection(&["a.png", "b.png"]);
        images.activate_next(false);
        images.activate_next(true);
        assert_eq!(images.active_index(), None);

        let mut empty: Vec<AnnotatedImage> = Vec::new();
        empty.activate_next(false);
        empty.activate_next(true);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_activate_by_path() {
        let mut images = collection(&["a.png", "b.png", "c.png"]);
        images[0].is_active = true;

        assert!(images.activate(Path::new("c.png")));
        assert_eq!(images.active_index(), Some(2));
        assert_eq!(images.iter().filter(|i| i.is_active).count(), 1);

        assert!(!images.activate(Path::new("zzz.png")));
        assert_eq!(images.active_index(), Some(2));
    }

    #[test]
    fn test_remove_active_annotation_targets_active_image() {
        let mut images = collection(&["a.png", "b.png"]);
        images[0].add_annotation(Rect::new(0.0, 0.0, 1.0, 1.0));
        images[1].add_annotation(Rect::new(0.0, 0.0, 1.0, 1.0));

        images.remove_active_annotation();
        assert_eq!(images[0].annotations.len(), 1);
        assert_eq!(images[1].annotations.len(), 1);

        images[1].is_active = true;
        images.remove_active_annotation();
        assert_eq!(images[0].annotations.len(), 1);
        assert!(images[1].annotations.is_empty());
    }
}
