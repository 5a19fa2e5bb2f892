//! # BeamKit Core
//!
//! Core types shared by every BeamKit crate: 2D curve geometry, the
//! immutable conversion configuration, locale-independent coordinate
//! formatting, and the instruction model with on-demand field parsing.

pub mod config;
pub mod format;
pub mod geometry;
pub mod instruction;

pub use config::{EngraveConfig, PowerEncoding, ScanDirection};
pub use format::{format_coord, format_scaled};
pub use geometry::{Curve, CurveKind, CurvePath, PathSet, Point};
pub use instruction::Instruction;
