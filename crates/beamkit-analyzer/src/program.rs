//! Instruction program container and analysis.
//!
//! [`Program`] owns an emitted or loaded instruction list and derives
//! its metadata by replay: bounding extents, spindle range, estimated
//! total time, and a cumulative time offset stamped on every
//! instruction.

use beamkit_core::instruction::Instruction;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::ops::Index;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::error::ProgramResult;
use crate::range::ProgramRange;
use crate::state::{AnalyzerConfig, MachineState};

/// Quadrant of the cartesian plane covered by the drawing range.
///
/// ```text
///  II | I
/// ---------
/// III | IV
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartesianQuadrant {
    I,
    II,
    III,
    IV,
    /// The drawing spans more than one quadrant.
    Mix,
    /// Nothing has been drawn yet.
    Unknown,
}

/// An ordered instruction list with analysis-derived metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    instructions: Vec<Instruction>,
    range: ProgramRange,
    estimated_time: Duration,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a program from text lines, trimming whitespace and
    /// dropping blank lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let instructions = lines
            .into_iter()
            .filter_map(|line| {
                let trimmed = line.as_ref().trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Instruction::new(trimmed))
                }
            })
            .collect();
        Self {
            instructions,
            ..Self::default()
        }
    }

    /// Loads a program from a file.
    pub fn from_file(path: impl AsRef<Path>) -> ProgramResult<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        let lines = reader.lines().collect::<Result<Vec<_>, _>>()?;
        let program = Self::from_lines(lines);
        debug!(
            instructions = program.len(),
            path = %path.as_ref().display(),
            "loaded program"
        );
        Ok(program)
    }

    /// Writes the program, optionally wrapped in header/footer blocks.
    /// With `cycles > 1` the body repeats, separated by the passes block.
    pub fn save(
        &self,
        path: impl AsRef<Path>,
        header: Option<&str>,
        footer: Option<&str>,
        passes_separator: Option<&str>,
        cycles: u32,
    ) -> ProgramResult<()> {
        let mut file = std::fs::File::create(path)?;
        if let Some(header) = header {
            writeln!(file, "{}", header)?;
        }
        for cycle in 0..cycles.max(1) {
            for cmd in &self.instructions {
                writeln!(file, "{}", cmd.text())?;
            }
            if cycle + 1 < cycles {
                if let Some(between) = passes_separator {
                    writeln!(file, "{}", between)?;
                }
            }
        }
        if let Some(footer) = footer {
            writeln!(file, "{}", footer)?;
        }
        Ok(())
    }

    pub fn push(&mut self, cmd: Instruction) {
        self.instructions.push(cmd);
    }

    pub fn extend(&mut self, cmds: impl IntoIterator<Item = Instruction>) {
        self.instructions.extend(cmds);
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    /// Extents derived by the last [`Program::analyze`] pass.
    pub fn range(&self) -> &ProgramRange {
        &self.range
    }

    /// Total estimated execution time from the last analysis pass.
    pub fn estimated_time(&self) -> Duration {
        self.estimated_time
    }

    /// Replays every instruction against a fresh machine state, deriving
    /// bounding extents and timing and stamping each instruction with
    /// its cumulative time offset. Ranges are reset first, so repeated
    /// analysis is idempotent.
    pub fn analyze(&mut self, cfg: &AnalyzerConfig) {
        let mut state = MachineState::new();

        self.range.reset();
        self.range.update_xy(Some(0.0), Some(0.0), false);
        let mut total = Duration::ZERO;

        for cmd in &mut self.instructions {
            let delay = state.apply(cmd, cfg);

            self.range.update_spindle(state.spindle());

            if state.true_movement() {
                if let Some(arc) = state.last_arc() {
                    let (x, y, w, h) = arc.bounding_box();
                    self.range.update_rect(x, y, w, h, state.laser_burning());
                } else {
                    self.range.update_xy(
                        Some(state.x.value),
                        Some(state.y.value),
                        state.laser_burning(),
                    );
                }
            }

            total += delay;
            cmd.set_time_offset(total);
        }
        self.estimated_time = total;
    }

    /// Quadrant of the drawing range, for preview consumers.
    pub fn quadrant(&self) -> CartesianQuadrant {
        let drawing = &self.range.drawing;
        if !drawing.is_valid() {
            CartesianQuadrant::Unknown
        } else if drawing.x.min >= 0.0 && drawing.y.min >= 0.0 {
            CartesianQuadrant::I
        } else if drawing.x.max <= 0.0 && drawing.y.min >= 0.0 {
            CartesianQuadrant::II
        } else if drawing.x.max <= 0.0 && drawing.y.max <= 0.0 {
            CartesianQuadrant::III
        } else if drawing.x.min >= 0.0 && drawing.y.max <= 0.0 {
            CartesianQuadrant::IV
        } else {
            CartesianQuadrant::Mix
        }
    }
}

impl Index<usize> for Program {
    type Output = Instruction;

    fn index(&self, index: usize) -> &Instruction {
        &self.instructions[index]
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

impl FromIterator<Instruction> for Program {
    fn from_iter<T: IntoIterator<Item = Instruction>>(iter: T) -> Self {
        Self {
            instructions: iter.into_iter().collect(),
            ..Self::default()
        }
    }
}
