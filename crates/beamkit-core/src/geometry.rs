//! Geometric primitives produced by tracing and fill generation.
//!
//! A [`Curve`] is either a straight segment or a cubic bezier; a
//! [`CurvePath`] is one continuous pen-down stroke made of contiguous
//! curves. Paths are created upstream (by the contour tracer or a fill
//! generator) and consumed read-only by the optimizer and emitters.

use serde::{Deserialize, Serialize};

/// A point in 2D image space. Coordinates stay in pixel units until the
/// emitters scale them into machine units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared euclidean distance to `other`.
    pub fn squared_distance(self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    /// Squared euclidean distance to the machine origin.
    pub fn squared_distance_to_origin(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Point) -> f64 {
        self.squared_distance(other).sqrt()
    }
}

/// Discriminates the two primitive shapes a motion path is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveKind {
    /// Straight segment from `a` to `b`.
    Line,
    /// Cubic bezier with two interior control points.
    Bezier,
}

/// A directed geometric primitive. Immutable once created; owned by
/// exactly one path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub kind: CurveKind,
    /// Start point.
    pub a: Point,
    /// First control point (equals `a` for lines).
    pub control_a: Point,
    /// Second control point (equals `b` for lines).
    pub control_b: Point,
    /// End point.
    pub b: Point,
}

impl Curve {
    /// Creates a straight segment.
    pub fn line(a: Point, b: Point) -> Self {
        Self {
            kind: CurveKind::Line,
            a,
            control_a: a,
            control_b: b,
            b,
        }
    }

    /// Creates a cubic bezier.
    pub fn bezier(a: Point, control_a: Point, control_b: Point, b: Point) -> Self {
        Self {
            kind: CurveKind::Bezier,
            a,
            control_a,
            control_b,
            b,
        }
    }

    /// Straight-line distance between the endpoints. For beziers this is
    /// only a coarse sanity value, not the true arc length.
    pub fn linear_length(&self) -> f64 {
        self.a.distance(self.b)
    }
}

/// One continuous pen-down stroke: an ordered, non-empty sequence of
/// curves where `curves[i].b == curves[i + 1].a` within floating
/// tolerance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CurvePath {
    curves: Vec<Curve>,
}

impl CurvePath {
    /// Wraps an ordered curve sequence. Contiguity is the producer's
    /// contract and is only checked in debug builds.
    pub fn new(curves: Vec<Curve>) -> Self {
        debug_assert!(
            curves.windows(2).all(|w| w[0].b.distance(w[1].a) < 1e-6),
            "path curves must be contiguous"
        );
        Self { curves }
    }

    /// The curves in stroke order.
    pub fn curves(&self) -> &[Curve] {
        &self.curves
    }

    /// Start point of the stroke.
    pub fn first_point(&self) -> Option<Point> {
        self.curves.first().map(|c| c.a)
    }

    /// End point of the stroke.
    pub fn last_point(&self) -> Option<Point> {
        self.curves.last().map(|c| c.b)
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }
}

impl FromIterator<Curve> for CurvePath {
    fn from_iter<T: IntoIterator<Item = Curve>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// An unordered collection of independent paths awaiting travel-order
/// optimization. The optimizer's output is always a permutation of its
/// input.
pub type PathSet = Vec<CurvePath>;
