// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric primitives and scaling helpers.
//!
//! Annotation rectangles are stored in the image's native pixel space. The
//! view works in viewport space, so everything crossing that boundary goes
//! through [`Rect::scaled`] with the current scale factor (or its inverse).

use serde::{Deserialize, Serialize, Serializer};

/// A 2D point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Largest magnitude below which every integer is exactly representable (2^53).
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Write integral coordinates without a fraction (`10`, not `10.0`).
fn serialize_coordinate<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// An axis-aligned rectangle: an origin plus full extents.
///
/// The serialized field order (`x`, `y`, `width`, `height`) is the wire
/// format of the annotations file.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    #[serde(serialize_with = "serialize_coordinate")]
    pub x: f64,
    #[serde(serialize_with = "serialize_coordinate")]
    pub y: f64,
    #[serde(serialize_with = "serialize_coordinate")]
    pub width: f64,
    #[serde(serialize_with = "serialize_coordinate")]
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn set_origin(&mut self, origin: Point) {
        self.x = origin.x;
        self.y = origin.y;
    }

    /// Scale origin and extents by the same factor.
    pub fn scaled(self, factor: f64) -> Self {
        self.scaled_xy(factor, factor)
    }

    /// Scale `x`/`width` by `fx` and `y`/`height` by `fy`.
    pub fn scaled_xy(self, fx: f64, fy: f64) -> Self {
        Self::new(self.x * fx, self.y * fy, self.width * fx, self.height * fy)
    }
}

/// Convert a rectangle drawn in viewport space to image space.
///
/// `scale_factor` is viewport width over image width. A non-positive or
/// non-finite factor leaves the rectangle untouched.
pub fn viewport_to_image(rect: Rect, scale_factor: f64) -> Rect {
    if scale_factor.is_finite() && scale_factor > 0.0 {
        rect.scaled(1.0 / scale_factor)
    } else {
        rect
    }
}

/// Convert an image-space rectangle to viewport space for drawing.
pub fn image_to_viewport(rect: Rect, scale_factor: f64) -> Rect {
    if scale_factor.is_finite() && scale_factor > 0.0 {
        rect.scaled(scale_factor)
    } else {
        rect
    }
}
