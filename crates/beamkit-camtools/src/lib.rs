//! # BeamKit CAM Tools
//!
//! Conversion tools that turn raster images and traced vector outlines
//! into motion/power instruction streams for laser engravers.
//!
//! ## Tools included
//!
//! - **Raster Engraver**: scan-line segmentation, power-modulated
//!   emission, and zero-power travel coalescing for bitmap images
//! - **Vector Engraver**: curve-to-code emission with bezier-to-biarc
//!   approximation for traced outlines and fill strokes
//! - **Path Optimizer**: nearest-neighbor travel-order optimization with
//!   parallel block partitioning for large fill sets
//!
//! ## Supporting infrastructure
//!
//! - **Segmenter**: run-length intensity segmentation of scan lines
//! - **Biarc**: cubic bezier to circular arc pair fitting

pub mod biarc;
pub mod error;
pub mod optimizer;
pub mod raster_engraver;
pub mod segmenter;
pub mod vector_engraver;

pub use biarc::{approximate_bezier, Biarc, BiarcApproximation, CircularArc, CubicBezier};
pub use error::{CamToolError, CamToolResult, ParameterError, ParameterResult};
pub use optimizer::{PathOptimizer, MAX_BLOCK_SIZE};
pub use raster_engraver::{coalesce_travel, emit_instructions, RasterEngraver};
pub use segmenter::{quantize_power, scan_segments, ColorSegment, PixelCursor, SeparatorAxis};
pub use vector_engraver::VectorEngraver;
