//! Conversion configuration.
//!
//! One immutable [`EngraveConfig`] value is supplied per conversion run.
//! The core never owns the UI or persistence for these settings; it only
//! consumes them.

use serde::{Deserialize, Serialize};

/// Scan pattern for raster engraving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanDirection {
    /// Scan rows, lines stacked along Y.
    Horizontal,
    /// Scan columns, lines stacked along X.
    Vertical,
    /// Scan anti-diagonal slices.
    Diagonal,
}

/// How quantized pixel intensity is rendered as laser power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerEncoding {
    /// Bare laser on/off tokens, no power word.
    Switched,
    /// `S0`..`S255` power words.
    Proportional,
    /// `S0.00`..`S1.00` power words, for firmware that takes normalized
    /// power values.
    Normalized,
}

impl PowerEncoding {
    /// Whether power is modulated with an `S` word rather than switched
    /// with on/off tokens.
    pub fn is_pwm(self) -> bool {
        !matches!(self, PowerEncoding::Switched)
    }
}

/// Immutable configuration for one raster or vector conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngraveConfig {
    /// Raster resolution in pixels per machine unit.
    pub resolution: f64,
    /// Vector-fill resolution in pixels per machine unit.
    pub fill_resolution: f64,
    /// Target offset along X, in machine units.
    pub offset_x: f64,
    /// Target offset along Y, in machine units.
    pub offset_y: f64,
    /// Feed rate for marking moves (units/min).
    pub mark_speed: u32,
    /// Feed rate for border/outline moves (units/min).
    pub border_speed: u32,
    /// Lower bound of the rescaled power range.
    pub min_power: i32,
    /// Upper bound of the rescaled power range.
    pub max_power: i32,
    /// Laser-on instruction token.
    pub laser_on: String,
    /// Laser-off instruction token.
    pub laser_off: String,
    pub scan_direction: ScanDirection,
    pub power_encoding: PowerEncoding,
    /// Selects the vector-fill resolution for coordinate scaling.
    pub vector_filling: bool,
    /// Traverse every scan line in the same direction, appending an
    /// explicit return travel per line.
    pub unidirectional: bool,
    /// Emit `G1` instead of `G0` for fast positioning.
    pub disable_fast_skip: bool,
}

impl Default for EngraveConfig {
    fn default() -> Self {
        Self {
            resolution: 10.0,
            fill_resolution: 10.0,
            offset_x: 0.0,
            offset_y: 0.0,
            mark_speed: 1000,
            border_speed: 1000,
            min_power: 0,
            max_power: 255,
            laser_on: "M3".to_string(),
            laser_off: "M5".to_string(),
            scan_direction: ScanDirection::Horizontal,
            power_encoding: PowerEncoding::Proportional,
            vector_filling: false,
            unidirectional: false,
            disable_fast_skip: false,
        }
    }
}

impl EngraveConfig {
    /// Pixels per machine unit for the active conversion mode.
    pub fn active_resolution(&self) -> f64 {
        if self.vector_filling {
            self.fill_resolution
        } else {
            self.resolution
        }
    }

    /// Fast-positioning mnemonic, honoring the fast-skip-disable flag.
    pub fn skip_command(&self) -> &'static str {
        if self.disable_fast_skip {
            "G1"
        } else {
            "G0"
        }
    }
}
