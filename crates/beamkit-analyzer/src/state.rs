//! Machine-state replay.
//!
//! [`MachineState`] applies instructions one at a time, tracking the
//! modal motion group, position, feed, spindle power, and laser
//! activation, and returns the estimated execution time of each step
//! under a feed-based delay model.

use beamkit_core::geometry::Point;
use beamkit_core::instruction::Instruction;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};
use std::time::Duration;

/// Modal motion group (G0, G1, G2, G3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionMode {
    Rapid,
    Linear,
    ArcCw,
    ArcCcw,
}

/// Replay configuration for the delay model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Rate assumed for rapid positioning and for feed moves before any
    /// `F` word has been seen, in units/min.
    pub rapid_rate: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self { rapid_rate: 3000.0 }
    }
}

/// A coordinate with its previous value, for motion deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Tracked {
    pub value: f64,
    pub previous: f64,
}

impl Tracked {
    fn set(&mut self, value: f64) {
        self.previous = self.value;
        self.value = value;
    }
}

/// Geometry of one circular move, derived from the I/J center offsets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcGeometry {
    pub center: Point,
    pub radius: f64,
    pub start_angle: f64,
    /// Signed sweep; positive runs counterclockwise. A zero raw sweep
    /// closes a full circle.
    pub sweep_angle: f64,
}

impl ArcGeometry {
    /// Builds the arc for a move from `start` to `end` with center
    /// offsets `i`/`j` relative to the start point.
    pub fn from_offsets(start: Point, end: Point, i: f64, j: f64, ccw: bool) -> Self {
        let center = Point::new(start.x + i, start.y + j);
        let radius = start.distance(center);
        let start_angle = (start.y - center.y).atan2(start.x - center.x);
        let end_angle = (end.y - center.y).atan2(end.x - center.x);
        let raw = end_angle - start_angle;
        let sweep_angle = if ccw {
            if raw <= 0.0 {
                raw + TAU
            } else {
                raw
            }
        } else if raw >= 0.0 {
            raw - TAU
        } else {
            raw
        };
        Self {
            center,
            radius,
            start_angle,
            sweep_angle,
        }
    }

    /// Length along the circumference.
    pub fn length(&self) -> f64 {
        self.radius * self.sweep_angle.abs()
    }

    fn point_at_angle(&self, angle: f64) -> Point {
        Point::new(
            self.center.x + self.radius * angle.cos(),
            self.center.y + self.radius * angle.sin(),
        )
    }

    /// Whether the circle angle `angle` lies inside the swept sector.
    fn crosses(&self, angle: f64) -> bool {
        if self.sweep_angle >= 0.0 {
            (angle - self.start_angle).rem_euclid(TAU) <= self.sweep_angle
        } else {
            (self.start_angle - angle).rem_euclid(TAU) <= -self.sweep_angle
        }
    }

    /// Axis-aligned bounding box `(x, y, width, height)`: the endpoints
    /// plus every axis extreme the sweep passes through.
    pub fn bounding_box(&self) -> (f64, f64, f64, f64) {
        let start = self.point_at_angle(self.start_angle);
        let end = self.point_at_angle(self.start_angle + self.sweep_angle);
        let mut min_x = start.x.min(end.x);
        let mut max_x = start.x.max(end.x);
        let mut min_y = start.y.min(end.y);
        let mut max_y = start.y.max(end.y);

        for quadrant in 0..4 {
            let angle = quadrant as f64 * FRAC_PI_2;
            if self.crosses(angle) {
                let p = self.point_at_angle(angle);
                min_x = min_x.min(p.x);
                max_x = max_x.max(p.x);
                min_y = min_y.min(p.y);
                max_y = max_y.max(p.y);
            }
        }
        (min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// Running machine state for one replay pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MachineState {
    pub x: Tracked,
    pub y: Tracked,
    motion: Option<MotionMode>,
    feed: f64,
    spindle: Option<f64>,
    laser_active: bool,
    moved: bool,
    last_arc: Option<ArcGeometry>,
}

impl MachineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn motion_mode(&self) -> Option<MotionMode> {
        self.motion
    }

    pub fn feed(&self) -> f64 {
        self.feed
    }

    pub fn spindle(&self) -> Option<f64> {
        self.spindle
    }

    /// Laser enabled and the commanded power not known to be zero.
    pub fn laser_burning(&self) -> bool {
        self.laser_active && self.spindle.map_or(true, |s| s > 0.0)
    }

    /// Whether the last applied instruction moved the machine.
    pub fn true_movement(&self) -> bool {
        self.moved
    }

    /// Arc geometry of the last applied instruction, when it was a
    /// circular move.
    pub fn last_arc(&self) -> Option<&ArcGeometry> {
        self.last_arc.as_ref()
    }

    /// Applies one instruction and returns its estimated execution time.
    pub fn apply(&mut self, cmd: &Instruction, cfg: &AnalyzerConfig) -> Duration {
        if let Some(g) = cmd.g() {
            match g {
                0 => self.motion = Some(MotionMode::Rapid),
                1 => self.motion = Some(MotionMode::Linear),
                2 => self.motion = Some(MotionMode::ArcCw),
                3 => self.motion = Some(MotionMode::ArcCcw),
                _ => {}
            }
        }
        if let Some(f) = cmd.feed() {
            self.feed = f;
        }
        if let Some(s) = cmd.spindle() {
            self.spindle = Some(s);
        }
        if cmd.is_laser_on() {
            self.laser_active = true;
        } else if cmd.is_laser_off() {
            self.laser_active = false;
        }

        self.moved = false;
        self.last_arc = None;

        let target_x = cmd.x();
        let target_y = cmd.y();
        if target_x.is_none() && target_y.is_none() {
            return Duration::ZERO;
        }

        let from = Point::new(self.x.value, self.y.value);
        let to = Point::new(
            target_x.unwrap_or(from.x),
            target_y.unwrap_or(from.y),
        );
        self.x.set(to.x);
        self.y.set(to.y);
        self.moved = to != from;

        let distance = match self.motion {
            Some(MotionMode::ArcCw) | Some(MotionMode::ArcCcw) => {
                let arc = ArcGeometry::from_offsets(
                    from,
                    to,
                    cmd.i().unwrap_or(0.0),
                    cmd.j().unwrap_or(0.0),
                    self.motion == Some(MotionMode::ArcCcw),
                );
                let length = arc.length();
                self.moved = true;
                self.last_arc = Some(arc);
                length
            }
            _ => from.distance(to),
        };

        let rate = match self.motion {
            Some(MotionMode::Rapid) | None => cfg.rapid_rate,
            _ => {
                if self.feed > 0.0 {
                    self.feed
                } else {
                    cfg.rapid_rate
                }
            }
        };
        if !(distance > 0.0) || !(rate > 0.0) {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(distance / rate * 60.0)
    }
}
