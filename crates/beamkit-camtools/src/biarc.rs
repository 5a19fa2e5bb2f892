//! Cubic bezier to biarc approximation.
//!
//! Motion controllers only interpolate straight lines and circular arcs,
//! so cubic curves are approximated by biarcs: pairs of arcs that share
//! a tangent at their join. The fit splits the bezier at its inflection
//! points, anchors a candidate biarc on the incenter of the triangle
//! formed by the endpoints and the tangent intersection, measures the
//! deviation at sampled parameters, and bisects until the candidate is
//! within tolerance or the subdivision budget runs out.

use beamkit_core::geometry::Point;

/// Subdivision budget: fits that would process more sub-curves than this
/// give up and report [`BiarcApproximation::TooComplex`].
const MAX_CURVES_PROCESSED: usize = 4096;

/// Distances below this collapse to coincident points.
const GEOMETRY_EPSILON: f64 = 1e-9;

/// A circular arc with explicit endpoints and a signed sweep. Positive
/// sweeps run counterclockwise.
#[derive(Debug, Clone, Copy)]
pub struct CircularArc {
    pub center: Point,
    pub radius: f64,
    pub start_angle: f64,
    pub sweep_angle: f64,
    pub start: Point,
    pub end: Point,
}

impl CircularArc {
    /// Length along the circumference.
    pub fn length(&self) -> f64 {
        self.radius * self.sweep_angle.abs()
    }

    /// Straight-line distance between the endpoints (the chord).
    pub fn linear_length(&self) -> f64 {
        self.start.distance(self.end)
    }

    pub fn is_counterclockwise(&self) -> bool {
        self.sweep_angle > 0.0
    }

    fn point_at(&self, t: f64) -> Point {
        let angle = self.start_angle + self.sweep_angle * t;
        Point::new(
            self.center.x + self.radius * angle.cos(),
            self.center.y + self.radius * angle.sin(),
        )
    }
}

/// Two arcs jointly approximating one bezier span, sharing a tangent at
/// the join point.
#[derive(Debug, Clone, Copy)]
pub struct Biarc {
    pub first: CircularArc,
    pub second: CircularArc,
}

impl Biarc {
    fn length(&self) -> f64 {
        self.first.length() + self.second.length()
    }

    /// Point at arc-length fraction `t` across both arcs.
    fn point_at(&self, t: f64) -> Point {
        let total = self.length();
        if !(total > 0.0) {
            return self.first.start;
        }
        let s = t * total;
        let first_len = self.first.length();
        if s < first_len && first_len > 0.0 {
            self.first.point_at(s / first_len)
        } else if self.second.length() > 0.0 {
            self.second.point_at((s - first_len) / self.second.length())
        } else {
            self.second.end
        }
    }
}

/// A cubic bezier span in pixel space.
#[derive(Debug, Clone, Copy)]
pub struct CubicBezier {
    pub p1: Point,
    pub c1: Point,
    pub c2: Point,
    pub p2: Point,
}

impl CubicBezier {
    pub fn new(p1: Point, c1: Point, c2: Point, p2: Point) -> Self {
        Self { p1, c1, c2, p2 }
    }

    /// De Casteljau evaluation.
    pub fn point_at(&self, t: f64) -> Point {
        let u = 1.0 - t;
        let b0 = u * u * u;
        let b1 = 3.0 * u * u * t;
        let b2 = 3.0 * u * t * t;
        let b3 = t * t * t;
        Point::new(
            b0 * self.p1.x + b1 * self.c1.x + b2 * self.c2.x + b3 * self.p2.x,
            b0 * self.p1.y + b1 * self.c1.y + b2 * self.c2.y + b3 * self.p2.y,
        )
    }

    /// Splits the span at `t` into two spans covering the same locus.
    fn split(&self, t: f64) -> (CubicBezier, CubicBezier) {
        let p12 = lerp(self.p1, self.c1, t);
        let p23 = lerp(self.c1, self.c2, t);
        let p34 = lerp(self.c2, self.p2, t);
        let p123 = lerp(p12, p23, t);
        let p234 = lerp(p23, p34, t);
        let p1234 = lerp(p123, p234, t);
        (
            CubicBezier::new(self.p1, p12, p123, p1234),
            CubicBezier::new(p1234, p234, p34, self.p2),
        )
    }

    /// Parameters in (0, 1) where the curvature changes sign. The cross
    /// product of the first and second derivative is quadratic in `t`.
    fn inflection_parameters(&self) -> Vec<f64> {
        let a = sub(self.c1, self.p1);
        let b = sub(sub(self.c2, self.c1), a);
        let c = sub(sub(sub(self.p2, self.c2), a), scale(b, 2.0));

        let qa = cross(b, c);
        let qb = cross(a, c);
        let qc = cross(a, b);

        let mut roots = Vec::new();
        if qa.abs() < GEOMETRY_EPSILON {
            if qb.abs() > GEOMETRY_EPSILON {
                roots.push(-qc / qb);
            }
        } else {
            let disc = qb * qb - 4.0 * qa * qc;
            if disc >= 0.0 {
                let sq = disc.sqrt();
                roots.push((-qb + sq) / (2.0 * qa));
                roots.push((-qb - sq) / (2.0 * qa));
            }
        }
        roots.retain(|t| *t > 1e-6 && *t < 1.0 - 1e-6);
        roots.sort_by(|x, y| x.total_cmp(y));
        roots
    }

    /// Tangent direction leaving `p1`, falling back through the control
    /// points when they coincide with the endpoint.
    fn start_tangent(&self) -> Point {
        for candidate in [sub(self.c1, self.p1), sub(self.c2, self.p1), sub(self.p2, self.p1)] {
            if norm(candidate) > GEOMETRY_EPSILON {
                return candidate;
            }
        }
        Point::new(0.0, 0.0)
    }

    /// Tangent direction arriving at `p2`, pointing back along the curve.
    fn end_tangent(&self) -> Point {
        for candidate in [sub(self.c2, self.p2), sub(self.c1, self.p2), sub(self.p1, self.p2)] {
            if norm(candidate) > GEOMETRY_EPSILON {
                return candidate;
            }
        }
        Point::new(0.0, 0.0)
    }
}

/// Outcome of a biarc fit, consumed by an explicit match at the emitter.
#[derive(Debug)]
pub enum BiarcApproximation {
    /// Arcs within tolerance, in curve order.
    Fit(Vec<Biarc>),
    /// Geometry too degenerate to anchor a biarc (a point, or control
    /// points collinear with the endpoints); draw a straight line.
    Degenerate,
    /// Subdivision budget exhausted; draw a straight line.
    TooComplex,
}

/// Approximates a cubic bezier by biarcs. `nr_points_to_check` bezier
/// parameters are sampled per candidate and the worst deviation is
/// compared against `tolerance` (in pixels).
pub fn approximate_bezier(
    bezier: &CubicBezier,
    nr_points_to_check: usize,
    tolerance: f64,
) -> BiarcApproximation {
    approximate_bezier_with_budget(bezier, nr_points_to_check, tolerance, MAX_CURVES_PROCESSED)
}

pub(crate) fn approximate_bezier_with_budget(
    bezier: &CubicBezier,
    nr_points_to_check: usize,
    tolerance: f64,
    budget: usize,
) -> BiarcApproximation {
    let chord = bezier.p1.distance(bezier.p2);
    if chord > GEOMETRY_EPSILON {
        // control points on the chord line make every candidate arc
        // degenerate, so answer with the line fallback immediately
        let d1 = distance_to_line(bezier.c1, bezier.p1, bezier.p2);
        let d2 = distance_to_line(bezier.c2, bezier.p1, bezier.p2);
        if d1 < GEOMETRY_EPSILON && d2 < GEOMETRY_EPSILON {
            return BiarcApproximation::Degenerate;
        }
    } else if bezier.p1.distance(bezier.c1) < GEOMETRY_EPSILON
        && bezier.p2.distance(bezier.c2) < GEOMETRY_EPSILON
    {
        // the whole span collapses to a point
        return BiarcApproximation::Degenerate;
    }

    // split at inflection points so every span has one curvature sign
    let mut spans = Vec::with_capacity(3);
    let inflections = bezier.inflection_parameters();
    match inflections.as_slice() {
        [] => spans.push(*bezier),
        [t] => {
            let (left, right) = bezier.split(*t);
            spans.push(left);
            spans.push(right);
        }
        [t1, t2, ..] => {
            let (left, rest) = bezier.split(*t1);
            // re-map the second parameter into the remaining span
            let t2_local = (t2 - t1) / (1.0 - t1);
            let (mid, right) = rest.split(t2_local);
            spans.push(left);
            spans.push(mid);
            spans.push(right);
        }
    }

    let mut biarcs = Vec::new();
    let mut stack: Vec<CubicBezier> = spans.into_iter().rev().collect();
    let mut processed = 0usize;

    while let Some(span) = stack.pop() {
        processed += 1;
        if processed > budget {
            return BiarcApproximation::TooComplex;
        }

        // a looping span returns to its start point; halve it
        if span.p1.distance(span.p2) < GEOMETRY_EPSILON {
            if span.p1.distance(span.c1) < GEOMETRY_EPSILON
                && span.p2.distance(span.c2) < GEOMETRY_EPSILON
            {
                continue; // vanishing span, nothing to draw
            }
            let (left, right) = span.split(0.5);
            stack.push(right);
            stack.push(left);
            continue;
        }

        let t1 = span.start_tangent();
        let t2 = span.end_tangent();

        // tangent lines must intersect to anchor the joint point
        let Some(v) = line_intersection(span.p1, t1, span.p2, t2) else {
            let (left, right) = span.split(0.5);
            stack.push(right);
            stack.push(left);
            continue;
        };

        // incenter of the triangle (P1, V, P2) is the biarc join point
        let d_p2v = span.p2.distance(v);
        let d_p1v = span.p1.distance(v);
        let d_p1p2 = span.p1.distance(span.p2);
        let perimeter = d_p2v + d_p1v + d_p1p2;
        if !(perimeter > GEOMETRY_EPSILON) || !perimeter.is_finite() {
            let (left, right) = span.split(0.5);
            stack.push(right);
            stack.push(left);
            continue;
        }
        let join = Point::new(
            (span.p1.x * d_p2v + span.p2.x * d_p1v + v.x * d_p1p2) / perimeter,
            (span.p1.y * d_p2v + span.p2.y * d_p1v + v.y * d_p1p2) / perimeter,
        );

        let Some(candidate) = build_biarc(span.p1, t1, span.p2, t2, join) else {
            let (left, right) = span.split(0.5);
            stack.push(right);
            stack.push(left);
            continue;
        };

        // sampled deviation against the bezier at matching fractions
        let mut max_distance = 0.0f64;
        let mut max_at = 0.0f64;
        let step = 1.0 / nr_points_to_check.max(1) as f64;
        for i in 0..=nr_points_to_check.max(1) {
            let t = step * i as f64;
            let distance = candidate.point_at(t).distance(span.point_at(t));
            if distance > max_distance {
                max_distance = distance;
                max_at = t;
            }
        }

        if max_distance > tolerance {
            let split_at = if max_at > 1e-3 && max_at < 1.0 - 1e-3 {
                max_at
            } else {
                0.5
            };
            let (left, right) = span.split(split_at);
            stack.push(right);
            stack.push(left);
        } else {
            biarcs.push(candidate);
        }
    }

    BiarcApproximation::Fit(biarcs)
}

/// Builds the biarc through `join` given the endpoints and their tangent
/// directions (`t2` points backwards along the curve). Each arc's center
/// sits on the perpendicular to its tangent and on the perpendicular
/// bisector of its chord to the join.
fn build_biarc(p1: Point, t1: Point, p2: Point, t2: Point, join: Point) -> Option<Biarc> {
    let c1 = line_intersection(p1, perp(t1), midpoint(p1, join), perp(sub(join, p1)))?;
    let c2 = line_intersection(p2, perp(t2), midpoint(p2, join), perp(sub(join, p2)))?;

    let first = arc_between(c1, p1, join, t1)?;
    // travel direction at p2 is opposite the end tangent
    let second = arc_reversed(c2, join, p2, scale(t2, -1.0))?;
    Some(Biarc { first, second })
}

/// Arc from `start` to `end` around `center`, oriented by the travel
/// tangent at `start`.
fn arc_between(center: Point, start: Point, end: Point, tangent_at_start: Point) -> Option<CircularArc> {
    let radius = center.distance(start);
    if !radius.is_finite() {
        return None;
    }
    let start_angle = (start.y - center.y).atan2(start.x - center.x);
    let end_angle = (end.y - center.y).atan2(end.x - center.x);
    let ccw = cross(sub(start, center), tangent_at_start) > 0.0;
    let sweep = normalize_sweep(end_angle - start_angle, ccw);
    Some(CircularArc {
        center,
        radius,
        start_angle,
        sweep_angle: sweep,
        start,
        end,
    })
}

/// Arc from `start` to `end` around `center`, oriented by the travel
/// tangent at `end`.
fn arc_reversed(center: Point, start: Point, end: Point, tangent_at_end: Point) -> Option<CircularArc> {
    let radius = center.distance(start);
    if !radius.is_finite() {
        return None;
    }
    let start_angle = (start.y - center.y).atan2(start.x - center.x);
    let end_angle = (end.y - center.y).atan2(end.x - center.x);
    let ccw = cross(sub(end, center), tangent_at_end) > 0.0;
    let sweep = normalize_sweep(end_angle - start_angle, ccw);
    Some(CircularArc {
        center,
        radius,
        start_angle,
        sweep_angle: sweep,
        start,
        end,
    })
}

fn normalize_sweep(raw: f64, ccw: bool) -> f64 {
    let tau = std::f64::consts::TAU;
    if ccw {
        if raw < 0.0 {
            raw + tau
        } else {
            raw
        }
    } else if raw > 0.0 {
        raw - tau
    } else {
        raw
    }
}

/// Intersection of the lines `a + s*da` and `b + u*db`.
fn line_intersection(a: Point, da: Point, b: Point, db: Point) -> Option<Point> {
    let denom = cross(da, db);
    if denom.abs() < GEOMETRY_EPSILON {
        return None;
    }
    let s = cross(sub(b, a), db) / denom;
    Some(Point::new(a.x + s * da.x, a.y + s * da.y))
}

fn distance_to_line(p: Point, a: Point, b: Point) -> f64 {
    let ab = sub(b, a);
    let len = norm(ab);
    if len < GEOMETRY_EPSILON {
        return p.distance(a);
    }
    (cross(ab, sub(p, a)) / len).abs()
}

fn lerp(a: Point, b: Point, t: f64) -> Point {
    Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

fn sub(a: Point, b: Point) -> Point {
    Point::new(a.x - b.x, a.y - b.y)
}

fn scale(a: Point, k: f64) -> Point {
    Point::new(a.x * k, a.y * k)
}

fn perp(a: Point) -> Point {
    Point::new(-a.y, a.x)
}

fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

fn cross(a: Point, b: Point) -> f64 {
    a.x * b.y - a.y * b.x
}

fn norm(a: Point) -> f64 {
    (a.x * a.x + a.y * a.y).sqrt()
}
