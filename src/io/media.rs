// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image file metadata, decoding and re-encoding.
//!
//! This module wraps the `image` crate for the three things the workspace
//! needs: reading pixel dimensions (with EXIF orientation), decoding for
//! export, and encoding to the codec matching the source extension.

use crate::error::{Error, Result};
use crate::util::geometry::Size;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::path::Path;

/// File extensions recognized as images, compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "heic"];

/// Check whether a path has one of the recognized image extensions.
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Stored pixel dimensions plus the orientation tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub orientation: Orientation,
}

impl ImageMetadata {
    /// True for the EXIF orientations 5-8, which turn the image a quarter.
    pub fn is_rotated(&self) -> bool {
        matches!(
            self.orientation,
            Orientation::Rotate90
                | Orientation::Rotate270
                | Orientation::Rotate90FlipH
                | Orientation::Rotate270FlipH
        )
    }

    /// Dimensions as displayed, with width and height swapped for rotations.
    pub fn display_size(&self) -> Size {
        let (width, height) = if self.is_rotated() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        };
        Size::new(width as f64, height as f64)
    }
}

/// Read dimensions and orientation without decoding pixel data.
pub fn read_metadata(path: &Path) -> Result<ImageMetadata> {
    let mut decoder = ImageReader::open(path)?
        .with_guessed_format()?
        .into_decoder()?;
    let (width, height) = decoder.dimensions();
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    Ok(ImageMetadata {
        width,
        height,
        orientation,
    })
}

/// Decode an image with its orientation applied, so the pixels match
/// [`ImageMetadata::display_size`].
pub fn decode(path: &Path) -> Result<DynamicImage> {
    let mut decoder = ImageReader::open(path)?
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);
    Ok(image)
}

/// Codec used when re-encoding an exported image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Heic,
    Png,
    Jpeg,
}

impl OutputFormat {
    /// Pick the output codec from the source file's extension; PNG otherwise.
    pub fn for_source(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("heic") => OutputFormat::Heic,
            Some("png") => OutputFormat::Png,
            Some("jpg") | Some("jpeg") => OutputFormat::Jpeg,
            _ => OutputFormat::Png,
        }
    }
}

/// Encode `image` to `destination`. A partially written file is removed on failure.
pub fn encode(image: &DynamicImage, destination: &Path, format: OutputFormat) -> Result<()> {
    let result = match format {
        OutputFormat::Heic => return Err(Error::UnsupportedFormat("heic".to_string())),
        OutputFormat::Png => image.save_with_format(destination, ImageFormat::Png),
        // The JPEG encoder rejects alpha channels.
        OutputFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8())
            .save_with_format(destination, ImageFormat::Jpeg),
    };

    if let Err(e) = result {
        if destination.exists() {
            if let Err(remove_err) = std::fs::remove_file(destination) {
                log::warn!(
                    "Failed to remove partial export {}: {}",
                    destination.display(),
                    remove_err
                );
            }
        }
        return Err(e.into());
    }
    Ok(())
}

/// Downsize so the longest side is at most `max_dimension`.
///
/// Returns the (possibly unchanged) image and the `(x, y)` factors applied
/// to it. Output dimensions are rounded to whole pixels, so the two factors
/// differ unless the aspect ratio divides evenly.
pub fn fit_within(image: DynamicImage, max_dimension: u32) -> (DynamicImage, (f64, f64)) {
    let (width, height) = (image.width(), image.height());
    if max_dimension == 0 || width.max(height) <= max_dimension {
        return (image, (1.0, 1.0));
    }
    let resized = image.resize(max_dimension, max_dimension, FilterType::Lanczos3);
    let factors = (
        resized.width() as f64 / width as f64,
        resized.height() as f64 / height as f64,
    );
    (resized, factors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn test_is_image_extensions() {
        assert!(is_image(Path::new("/tmp/a.png")));
        assert!(is_image(Path::new("/tmp/b.JPG")));
        assert!(is_image(Path::new("c.jpeg")));
        assert!(is_image(Path::new("d.HeIc")));
        assert!(!is_image(Path::new("annotations.json")));
        assert!(!is_image(Path::new("no_extension")));
        assert!(!is_image(Path::new("e.gif")));
    }

    #[test]
    fn test_output_format_for_source() {
        assert_eq!(OutputFormat::for_source(Path::new("a.heic")), OutputFormat::Heic);
        assert_eq!(OutputFormat::for_source(Path::new("a.PNG")), OutputFormat::Png);
        assert_eq!(OutputFormat::for_source(Path::new("a.jpg")), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::for_source(Path::new("a.JPEG")), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::for_source(Path::new("a.tiff")), OutputFormat::Png);
        assert_eq!(OutputFormat::for_source(Path::new("a")), OutputFormat::Png);
    }

    #[test]
    fn test_display_size_swaps_for_rotation() {
        let mut meta = ImageMetadata {
            width: 40,
            height: 30,
            orientation: Orientation::NoTransforms,
        };
        assert_eq!(meta.display_size(), Size::new(40.0, 30.0));

        for orientation in [
            Orientation::Rotate90,
            Orientation::Rotate270,
            Orientation::Rotate90FlipH,
            Orientation::Rotate270FlipH,
        ] {
            meta.orientation = orientation;
            assert_eq!(meta.display_size(), Size::new(30.0, 40.0));
        }

        meta.orientation = Orientation::Rotate180;
        assert_eq!(meta.display_size(), Size::new(40.0, 30.0));
    }

    #[test]
    fn test_read_metadata_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.png");
        RgbImage::from_pixel(12, 7, Rgb([10, 20, 30])).save(&path).unwrap();

        let meta = read_metadata(&path).unwrap();
        assert_eq!((meta.width, meta.height), (12, 7));
        assert!(!meta.is_rotated());
    }

    #[test]
    fn test_read_metadata_garbage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(read_metadata(&path).is_err());
        assert!(read_metadata(&dir.path().join("missing.png")).is_err());
    }

    #[test]
    fn test_encode_jpeg_drops_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.jpg");
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 128])));

        encode(&image, &dest, OutputFormat::Jpeg).unwrap();
        let meta = read_metadata(&dest).unwrap();
        assert_eq!((meta.width, meta.height), (8, 8));
    }

    #[test]
    fn test_encode_heic_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.heic");
        let image = DynamicImage::ImageRgb8(RgbImage::new(2, 2));

        let err = encode(&image, &dest, OutputFormat::Heic).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
        assert!(!dest.exists());
    }

    #[test]
    fn test_fit_within() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(200, 100));

        let (same, factors) = fit_within(image.clone(), 500);
        assert_eq!(same.width(), 200);
        assert_eq!(factors, (1.0, 1.0));

        let (small, (fx, fy)) = fit_within(image, 50);
        assert_eq!((small.width(), small.height()), (50, 25));
        assert!((fx - 0.25).abs() < 1e-9);
        assert!((fy - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_fit_within_uneven_aspect_uses_per_axis_factors() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(1000, 333));

        let (small, (fx, fy)) = fit_within(image, 7);
        assert_eq!((small.width(), small.height()), (7, 2));
        assert!((fx - 7.0 / 1000.0).abs() < 1e-12);
        assert!((fy - 2.0 / 333.0).abs() < 1e-12);
        // The bottom edge lands on the bottom pixel row, not past it.
        assert!((333.0 * fy - 2.0).abs() < 1e-9);
    }
}
