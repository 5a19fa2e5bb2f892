//! # BeamKit Analyzer
//!
//! Replays an instruction stream with a running machine-state record to
//! derive its bounding extents (drawing vs. moving), spindle power
//! range, and cumulative execution time.

pub mod error;
pub mod program;
pub mod range;
pub mod state;

pub use error::{ProgramError, ProgramResult};
pub use program::{CartesianQuadrant, Program};
pub use range::{Bounds, ProgramRange, SpindleRange, XyRange};
pub use state::{AnalyzerConfig, ArcGeometry, MachineState, MotionMode};
