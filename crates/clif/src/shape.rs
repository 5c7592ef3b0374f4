//! Layer shapes: polylines (contours) and hatches (fill segments).

use std::sync::OnceLock;

use clif_math::Point2;
use serde::{Deserialize, Serialize};

use crate::primitives::PointHatch;

/// Contour orientation as encoded in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Internal contour (hole), subtracts material. Encoded as 0.
    Clockwise,
    /// External contour, adds material. Encoded as 1.
    CounterClockwise,
    /// Not a closed region. Encoded as 2.
    OpenLine,
}

impl Direction {
    /// Decode the numeric direction field.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Direction::Clockwise),
            1 => Some(Direction::CounterClockwise),
            2 => Some(Direction::OpenLine),
            _ => None,
        }
    }

    /// Numeric value used in the file.
    pub fn code(self) -> u8 {
        match self {
            Direction::Clockwise => 0,
            Direction::CounterClockwise => 1,
            Direction::OpenLine => 2,
        }
    }

    /// Whether the contour bounds a region.
    pub fn is_closed(self) -> bool {
        !matches!(self, Direction::OpenLine)
    }
}

/// Area and perimeter of a shape.
///
/// Returns `None` for quantities a shape does not define. Layer totals are
/// built from [`PolyLine`] only; hatches report `None` for both.
pub trait Measure {
    /// Enclosed area (mm²).
    fn area(&self) -> Option<f64>;
    /// Outline length (mm).
    fn perimeter(&self) -> Option<f64>;
}

#[derive(Debug, Clone, Copy)]
struct Metrics {
    area: f64,
    perimeter: f64,
}

/// An ordered 2D contour.
///
/// Points are in millimeters. Area and perimeter are computed on first use
/// and cached; the points never change after construction, so the cache is
/// never invalidated.
#[derive(Debug, Clone)]
pub struct PolyLine {
    points: Vec<Point2>,
    direction: Direction,
    units: f64,
    metrics: OnceLock<Metrics>,
}

impl PolyLine {
    /// Create a polyline from normalized points.
    ///
    /// `units` records the scale the points were normalized with; it is not
    /// applied again.
    pub fn new(points: Vec<Point2>, direction: Direction, units: f64) -> Self {
        Self {
            points,
            direction,
            units,
            metrics: OnceLock::new(),
        }
    }

    /// Vertices in file order.
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    /// Declared orientation.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Unit scale the points were normalized with (mm per raw unit).
    pub fn units(&self) -> f64 {
        self.units
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the polyline has no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Shoelace area of the wrap-around point sequence.
    /// Positive for counter-clockwise point order, negative for clockwise.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut area = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            area += self.points[i].x * self.points[j].y;
            area -= self.points[j].x * self.points[i].y;
        }
        area / 2.0
    }

    /// Area contributed to the layer (mm²).
    ///
    /// Counter-clockwise contours are positive, clockwise contours negative,
    /// open lines zero. The magnitude is the same for both closed directions.
    pub fn area(&self) -> f64 {
        self.metrics().area
    }

    /// Sum of the wrap-around edge lengths (mm), whatever the direction.
    pub fn perimeter(&self) -> f64 {
        self.metrics().perimeter
    }

    fn metrics(&self) -> &Metrics {
        self.metrics.get_or_init(|| Metrics {
            area: self.compute_area(),
            perimeter: self.compute_perimeter(),
        })
    }

    fn compute_area(&self) -> f64 {
        let magnitude = self.signed_area().abs();
        match self.direction {
            Direction::CounterClockwise => magnitude,
            Direction::Clockwise => -magnitude,
            Direction::OpenLine => 0.0,
        }
    }

    fn compute_perimeter(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        let mut length = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            length += (self.points[j] - self.points[i]).norm();
        }
        length
    }
}

impl Measure for PolyLine {
    fn area(&self) -> Option<f64> {
        Some(PolyLine::area(self))
    }

    fn perimeter(&self) -> Option<f64> {
        Some(PolyLine::perimeter(self))
    }
}

/// A set of fill segments.
#[derive(Debug, Clone)]
pub struct Hatch {
    segments: Vec<PointHatch>,
}

impl Hatch {
    /// Create a hatch from normalized segments.
    pub fn new(segments: Vec<PointHatch>) -> Self {
        Self { segments }
    }

    /// Segments in file order.
    pub fn segments(&self) -> &[PointHatch] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if the hatch has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

// Hatch metrics are not defined by the format; both stay `None`.
impl Measure for Hatch {
    fn area(&self) -> Option<f64> {
        None
    }

    fn perimeter(&self) -> Option<f64> {
        None
    }
}
