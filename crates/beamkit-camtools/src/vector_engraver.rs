//! Vector path to instruction conversion.
//!
//! Emits one fast positioning move per path, then renders each curve as
//! linear motion or biarc-fitted circular arcs. Failed or degenerate
//! fits degrade to a single straight line for the whole curve; the two
//! fallbacks are exclusive, never additive.

use anyhow::Result;
use beamkit_core::config::EngraveConfig;
use beamkit_core::format::format_scaled;
use beamkit_core::geometry::{Curve, CurveKind, CurvePath, PathSet, Point};
use beamkit_core::instruction::Instruction;
use tracing::trace;

use crate::biarc::{approximate_bezier, BiarcApproximation, CircularArc, CubicBezier};
use crate::error::validate_config;
use crate::optimizer::PathOptimizer;

/// Bezier parameters sampled per biarc candidate.
const BIARC_SAMPLE_POINTS: usize = 5;

/// Biarc deviation tolerance, in pixels.
const BIARC_TOLERANCE: f64 = 2.0;

/// Minimum chord length, in pixels, for a fitted arc to be emitted as an
/// arc instruction; shorter arcs degrade to linear motion.
const MIN_ARC_CHORD: f64 = 2.0;

/// Vector engraving tool for traced outlines and fill strokes.
pub struct VectorEngraver {
    config: EngraveConfig,
    on_token: String,
    off_token: String,
}

impl VectorEngraver {
    /// Creates an engraver. Under PWM encodings the power words
    /// `S<max>`/`S0` stand in for the laser on/off tokens.
    pub fn new(config: EngraveConfig) -> Result<Self> {
        validate_config(&config)?;
        let (on_token, off_token) = if config.power_encoding.is_pwm() {
            (format!("S{}", config.max_power), "S0".to_string())
        } else {
            (config.laser_on.clone(), config.laser_off.clone())
        };
        Ok(Self {
            config,
            on_token,
            off_token,
        })
    }

    pub fn config(&self) -> &EngraveConfig {
        &self.config
    }

    /// Full conversion of a traced path set: power preamble, border feed
    /// selection, emitted paths, trailing laser-off.
    ///
    /// With `optimize_travel` the paths are reordered by the
    /// nearest-neighbor optimizer; otherwise the traced order is
    /// reversed, so inner outlines cut before the outers that surround
    /// them.
    pub fn engrave(&self, paths: PathSet, optimize_travel: bool) -> Vec<Instruction> {
        let c = &self.config;
        let mut out = Vec::new();

        if c.power_encoding.is_pwm() {
            out.push(Instruction::new(format!("{} S0", c.laser_on)));
        } else {
            out.push(Instruction::new(format!("{} S{}", c.laser_off, c.max_power)));
        }
        out.push(Instruction::new(format!("G0 F{}", c.border_speed)));

        out.extend(self.emit_paths(paths, optimize_travel));

        out.push(Instruction::new(c.laser_off.clone()));
        out
    }

    /// Emits an ordered path set without the preamble framing.
    pub fn emit_paths(&self, mut paths: PathSet, optimize_travel: bool) -> Vec<Instruction> {
        if optimize_travel {
            paths = PathOptimizer::optimize_parallel(paths, 0.0);
        } else {
            paths.reverse();
        }
        paths.iter().flat_map(|path| self.emit_path(path)).collect()
    }

    /// Emits one path: a fast positioning move to its first point with
    /// the laser off, then every curve in order. The laser-on suffix is
    /// attached only to the first curve.
    pub fn emit_path(&self, path: &CurvePath) -> Vec<Instruction> {
        let mut out = Vec::new();
        let Some(first) = path.first_point() else {
            return out;
        };
        out.push(Instruction::new(format!(
            "{} X{} Y{} {}",
            self.config.skip_command(),
            self.fmt_x(first.x),
            self.fmt_y(first.y),
            self.off_token
        )));
        for (index, curve) in path.curves().iter().enumerate() {
            self.emit_curve(curve, index == 0, &mut out);
        }
        out
    }

    fn emit_curve(&self, curve: &Curve, first: bool, out: &mut Vec<Instruction>) {
        if curve.linear_length().is_nan() {
            // invalid geometry is skipped outright, leaving a gap rather
            // than guessing at a line
            trace!("skipping curve with undefined length");
            return;
        }
        let on_suffix = if first {
            format!(" {}", self.on_token)
        } else {
            String::new()
        };

        match curve.kind {
            CurveKind::Line => out.push(self.linear_to(curve.b, &on_suffix)),
            CurveKind::Bezier => {
                let bezier =
                    CubicBezier::new(curve.a, curve.control_a, curve.control_b, curve.b);
                match approximate_bezier(&bezier, BIARC_SAMPLE_POINTS, BIARC_TOLERANCE) {
                    BiarcApproximation::Fit(biarcs) => {
                        for biarc in &biarcs {
                            self.emit_arc(&biarc.first, &on_suffix, out);
                            self.emit_arc(&biarc.second, &on_suffix, out);
                        }
                    }
                    BiarcApproximation::Degenerate | BiarcApproximation::TooComplex => {
                        trace!("biarc fit unavailable, degrading curve to a line");
                        out.push(self.linear_to(curve.b, &on_suffix));
                    }
                }
            }
        }
    }

    fn emit_arc(&self, arc: &CircularArc, on_suffix: &str, out: &mut Vec<Instruction>) {
        if arc.length().is_nan() || arc.linear_length().is_nan() {
            return;
        }
        if arc.linear_length() > MIN_ARC_CHORD {
            let word = if arc.is_counterclockwise() { "G3" } else { "G2" };
            out.push(Instruction::new(format!(
                "{} X{} Y{} I{} J{}{}",
                word,
                self.fmt_x(arc.end.x),
                self.fmt_y(arc.end.y),
                format_scaled(arc.center.x - arc.start.x, self.config.resolution),
                format_scaled(arc.center.y - arc.start.y, self.config.resolution),
                on_suffix
            )));
        } else {
            out.push(self.linear_to(arc.end, on_suffix));
        }
    }

    fn linear_to(&self, p: Point, on_suffix: &str) -> Instruction {
        Instruction::new(format!(
            "G1 X{} Y{}{}",
            self.fmt_x(p.x),
            self.fmt_y(p.y),
            on_suffix
        ))
    }

    fn fmt_x(&self, v: f64) -> String {
        let scale = self.config.resolution;
        format_scaled(v + self.config.offset_x * scale, scale)
    }

    fn fmt_y(&self, v: f64) -> String {
        let scale = self.config.resolution;
        format_scaled(v + self.config.offset_y * scale, scale)
    }
}
