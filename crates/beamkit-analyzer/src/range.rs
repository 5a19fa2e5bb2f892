//! Program extent tracking.
//!
//! Two independent 2D bounding boxes are maintained while replaying a
//! program: the drawing range covers motion with the laser active, the
//! moving range covers all motion including travel. The spindle range
//! tracks the commanded power values.

use beamkit_core::geometry::Point;
use serde::{Deserialize, Serialize};

/// Min/max accumulator over one coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub fn new() -> Self {
        Self {
            min: f64::MAX,
            max: f64::MIN,
        }
    }

    pub fn update(&mut self, value: f64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Whether any value has been recorded.
    pub fn is_valid(&self) -> bool {
        self.min != f64::MAX && self.max != f64::MIN
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new()
    }
}

/// A 2D bounding box accumulated coordinate by coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct XyRange {
    pub x: Bounds,
    pub y: Bounds,
}

impl XyRange {
    /// Records whichever coordinates the instruction carried.
    pub fn update(&mut self, x: Option<f64>, y: Option<f64>) {
        if let Some(x) = x {
            self.x.update(x);
        }
        if let Some(y) = y {
            self.y.update(y);
        }
    }

    /// Records a full rectangle, for arc extents.
    pub fn update_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.x.update(x);
        self.x.update(x + width);
        self.y.update(y);
        self.y.update(y + height);
    }

    pub fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
    }

    pub fn is_valid(&self) -> bool {
        self.x.is_valid() && self.y.is_valid()
    }

    pub fn width(&self) -> f64 {
        self.x.max - self.x.min
    }

    pub fn height(&self) -> f64 {
        self.y.max - self.y.min
    }

    pub fn center(&self) -> Point {
        if self.is_valid() {
            Point::new(
                self.x.min + self.width() / 2.0,
                self.y.min + self.height() / 2.0,
            )
        } else {
            Point::new(0.0, 0.0)
        }
    }
}

/// Commanded spindle (laser power) value range.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpindleRange {
    pub s: Bounds,
}

impl SpindleRange {
    pub fn update(&mut self, value: f64) {
        self.s.update(value);
    }

    pub fn reset(&mut self) {
        self.s.reset();
    }

    /// A spindle range is only meaningful when power actually varies and
    /// reaches above zero.
    pub fn is_valid(&self) -> bool {
        self.s.is_valid() && self.s.min != self.s.max && self.s.max > 0.0
    }
}

/// Bounding extents derived from replaying an instruction list.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgramRange {
    /// Extent covered only while the laser is active.
    pub drawing: XyRange,
    /// Extent covered by all motion, travel included.
    pub moving: XyRange,
    pub spindle: SpindleRange,
}

impl ProgramRange {
    pub fn update_xy(&mut self, x: Option<f64>, y: Option<f64>, drawing: bool) {
        if drawing {
            self.drawing.update(x, y);
        }
        self.moving.update(x, y);
    }

    pub fn update_rect(&mut self, x: f64, y: f64, width: f64, height: f64, drawing: bool) {
        if drawing {
            self.drawing.update_rect(x, y, width, height);
        }
        self.moving.update_rect(x, y, width, height);
    }

    pub fn update_spindle(&mut self, s: Option<f64>) {
        if let Some(s) = s {
            self.spindle.update(s);
        }
    }

    pub fn reset(&mut self) {
        self.drawing.reset();
        self.moving.reset();
        self.spindle.reset();
    }
}
