//! Value types shared by the header and geometry: bounding box, labels,
//! user data, and hatch segments.
//!
//! All coordinates are stored in millimeters. Constructors that take raw
//! values apply the header's unit factor exactly once.

use std::fmt;

use clif_math::{format_fixed, strictly_less, to_mm, Point2, Point3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Encoding of the geometry section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    /// Line-oriented text records.
    Ascii,
    /// Packed little-endian opcode stream.
    Binary,
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::Ascii => write!(f, "ASCII"),
            FileType::Binary => write!(f, "Binary"),
        }
    }
}

/// A bounding box whose corners are not ordered.
#[derive(Debug, Error, PartialEq)]
#[error("dimension point1 {point1:?} is not strictly below point2 {point2:?} on every axis")]
pub struct DimensionError {
    /// Offending first corner.
    pub point1: [f64; 3],
    /// Offending second corner.
    pub point2: [f64; 3],
}

/// Part bounding box declared in the header (mm).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimension {
    point1: Point3,
    point2: Point3,
}

impl Dimension {
    /// Create a bounding box from its two corners.
    ///
    /// Fails unless `point1` is strictly below `point2` on all three axes.
    pub fn new(point1: Point3, point2: Point3) -> Result<Self, DimensionError> {
        if !strictly_less(&point1, &point2) {
            return Err(DimensionError {
                point1: [point1.x, point1.y, point1.z],
                point2: [point2.x, point2.y, point2.z],
            });
        }
        Ok(Self { point1, point2 })
    }

    /// Minimum corner.
    pub fn point1(&self) -> Point3 {
        self.point1
    }

    /// Maximum corner.
    pub fn point2(&self) -> Point3 {
        self.point2
    }

    /// Extent along each axis.
    pub fn size(&self) -> [f64; 3] {
        let d = self.point2 - self.point1;
        [d.x, d.y, d.z]
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}) - ({}, {}, {})",
            format_fixed(self.point1.x),
            format_fixed(self.point1.y),
            format_fixed(self.point1.z),
            format_fixed(self.point2.x),
            format_fixed(self.point2.y),
            format_fixed(self.point2.z),
        )
    }
}

/// Text label attached to a model ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Model ID this label names.
    pub id: i32,
    /// Label text.
    pub text: String,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.text)
    }
}

/// Vendor-specific payload from the `$$USERDATA` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserData {
    /// Vendor identifier.
    pub uid: String,
    /// Declared payload length in bytes.
    pub length: usize,
    /// Payload bytes as they appear in the file.
    pub data: Vec<u8>,
}

impl fmt::Display for UserData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} bytes): {}",
            self.uid,
            self.length,
            String::from_utf8_lossy(&self.data)
        )
    }
}

/// One hatch segment (mm).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointHatch {
    /// Segment start.
    pub start: Point2,
    /// Segment end.
    pub end: Point2,
}

impl PointHatch {
    /// Build a segment from a raw `(xs, xe, ys, ye)` quad.
    pub fn from_raw(quad: [f64; 4], units: f64) -> Self {
        let [xs, xe, ys, ye] = quad;
        Self {
            start: Point2::new(to_mm(xs, units), to_mm(ys, units)),
            end: Point2::new(to_mm(xe, units), to_mm(ye, units)),
        }
    }

    /// Segment length.
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }
}

/// Build a layer point from a raw `(x, y)` pair.
pub fn point_from_raw(x: f64, y: f64, units: f64) -> Point2 {
    Point2::new(to_mm(x, units), to_mm(y, units))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dimension_valid() {
        let dim = Dimension::new(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 20.0, 5.0)).unwrap();
        assert_eq!(dim.size(), [10.0, 20.0, 5.0]);
        assert_eq!(dim.to_string(), "(0.000, 0.000, 0.000) - (10.000, 20.000, 5.000)");
    }

    #[test]
    fn test_dimension_rejects_unordered_axis() {
        // z is equal, not strictly less
        let result = Dimension::new(Point3::new(0.0, 0.0, 1.0), Point3::new(10.0, 10.0, 1.0));
        assert!(result.is_err());

        let result = Dimension::new(Point3::new(5.0, 0.0, 0.0), Point3::new(1.0, 10.0, 10.0));
        assert!(result.is_err());
    }

    #[test]
    fn test_hatch_from_raw_order() {
        let seg = PointHatch::from_raw([0.0, 10.0, 2.0, 4.0], 0.5);
        assert_relative_eq!(seg.start.x, 0.0);
        assert_relative_eq!(seg.end.x, 5.0);
        assert_relative_eq!(seg.start.y, 1.0);
        assert_relative_eq!(seg.end.y, 2.0);
        assert_relative_eq!(seg.length(), (25.0f64 + 1.0).sqrt());
    }

    #[test]
    fn test_point_from_raw_scales_once() {
        let p = point_from_raw(1234.0, -500.0, 0.001);
        assert_eq!(p.x, 1234.0 * 0.001);
        assert_eq!(p.y, -500.0 * 0.001);
    }

    #[test]
    fn test_user_data_display() {
        let ud = UserData {
            uid: "ACME".into(),
            length: 3,
            data: b"abc".to_vec(),
        };
        assert_eq!(ud.to_string(), "ACME (3 bytes): abc");
    }
}
