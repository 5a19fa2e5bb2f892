//! Raster scan-line segmentation.
//!
//! Walks a grayscale intensity image along the configured scan pattern
//! and emits run-length [`ColorSegment`]s of constant quantized power.
//! Segments exactly tile the scanned pixels: replaying their signed
//! lengths reconstructs the pixel coordinate of every intensity change.

use beamkit_core::config::{EngraveConfig, PowerEncoding, ScanDirection};
use beamkit_core::format::format_coord;
use image::GrayImage;

/// Power level at or below which a switched (non-PWM) segment is treated
/// as a non-marking fast move.
pub const SWITCHED_ON_THRESHOLD: i32 = 125;

/// Axis advanced by a scan-line separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparatorAxis {
    X,
    Y,
}

/// One run of constant quantized power along a scan line.
///
/// Lengths are in pixels and signed: negative lengths encode reverse
/// traversal. Separators carry no intensity and advance one scan line
/// along their axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorSegment {
    AxisX { power: i32, len: i32 },
    AxisY { power: i32, len: i32 },
    Diagonal { power: i32, len: i32 },
    Separator { axis: SeparatorAxis },
}

/// Cumulative pixel cursor threaded through segment emission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PixelCursor {
    pub x: i32,
    pub y: i32,
}

impl ColorSegment {
    fn axis_x(power: i32, len: i32, reverse: bool) -> Self {
        ColorSegment::AxisX {
            power,
            len: if reverse { -len } else { len },
        }
    }

    fn axis_y(power: i32, len: i32, reverse: bool) -> Self {
        ColorSegment::AxisY {
            power,
            len: if reverse { -len } else { len },
        }
    }

    fn diagonal(power: i32, len: i32, reverse: bool) -> Self {
        ColorSegment::Diagonal {
            power,
            len: if reverse { -len } else { len },
        }
    }

    fn separator(axis: SeparatorAxis) -> Self {
        ColorSegment::Separator { axis }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, ColorSegment::Separator { .. })
    }

    /// Quantized power carried by this segment; separators carry none.
    pub fn power(&self) -> i32 {
        match *self {
            ColorSegment::AxisX { power, .. }
            | ColorSegment::AxisY { power, .. }
            | ColorSegment::Diagonal { power, .. } => power,
            ColorSegment::Separator { .. } => 0,
        }
    }

    /// Signed pixel length; separators advance exactly one line.
    pub fn signed_len(&self) -> i32 {
        match *self {
            ColorSegment::AxisX { len, .. }
            | ColorSegment::AxisY { len, .. }
            | ColorSegment::Diagonal { len, .. } => len,
            ColorSegment::Separator { .. } => 1,
        }
    }

    /// Whether this segment moves without marking.
    pub fn is_fast(&self, cfg: &EngraveConfig) -> bool {
        if cfg.power_encoding.is_pwm() {
            self.power() == 0
        } else {
            self.power() <= SWITCHED_ON_THRESHOLD
        }
    }

    /// Renders the coordinate and power words for this segment, advancing
    /// the cumulative pixel cursor.
    pub fn to_instruction_text(&self, cursor: &mut PixelCursor, cfg: &EngraveConfig) -> String {
        match *self {
            ColorSegment::AxisX { len, .. } => {
                cursor.x += len;
                format!(
                    "X{} {}",
                    scaled(cursor.x, cfg.offset_x, cfg),
                    self.power_word(cfg)
                )
            }
            ColorSegment::AxisY { len, .. } => {
                cursor.y += len;
                format!(
                    "Y{} {}",
                    scaled(cursor.y, cfg.offset_y, cfg),
                    self.power_word(cfg)
                )
            }
            ColorSegment::Diagonal { len, .. } => {
                cursor.x += len;
                cursor.y -= len;
                format!(
                    "X{} Y{} {}",
                    scaled(cursor.x, cfg.offset_x, cfg),
                    scaled(cursor.y, cfg.offset_y, cfg),
                    self.power_word(cfg)
                )
            }
            ColorSegment::Separator { axis: SeparatorAxis::X } => {
                cursor.x += 1;
                format!("X{}", scaled(cursor.x, cfg.offset_x, cfg))
            }
            ColorSegment::Separator { axis: SeparatorAxis::Y } => {
                cursor.y += 1;
                format!("Y{}", scaled(cursor.y, cfg.offset_y, cfg))
            }
        }
    }

    fn power_word(&self, cfg: &EngraveConfig) -> String {
        match cfg.power_encoding {
            PowerEncoding::Switched => {
                if self.is_fast(cfg) {
                    cfg.laser_off.clone()
                } else {
                    cfg.laser_on.clone()
                }
            }
            PowerEncoding::Proportional => format!("S{}", self.power()),
            PowerEncoding::Normalized => format!("S{:.2}", self.power() as f64 / 255.0),
        }
    }
}

fn scaled(cum: i32, offset: f64, cfg: &EngraveConfig) -> String {
    format_coord(cum as f64 / cfg.active_resolution() + offset)
}

/// Maps pixel intensity (0 = no mark) to the quantized power a segment
/// carries. Zero always stays zero; under PWM encodings nonzero values
/// are rescaled into the configured power range.
pub fn quantize_power(intensity: u8, cfg: &EngraveConfig) -> i32 {
    let v = intensity as i32;
    if v == 0 {
        0
    } else if cfg.power_encoding.is_pwm() {
        v * (cfg.max_power - cfg.min_power) / 255 + cfg.min_power
    } else {
        v
    }
}

/// Walks the image along the configured scan pattern and returns the full
/// ordered segment sequence.
pub fn scan_segments(image: &GrayImage, cfg: &EngraveConfig) -> Vec<ColorSegment> {
    if image.width() == 0 || image.height() == 0 {
        return Vec::new();
    }
    match cfg.scan_direction {
        ScanDirection::Horizontal | ScanDirection::Vertical => scan_axis(image, cfg),
        ScanDirection::Diagonal => scan_diagonal(image, cfg),
    }
}

/// Merges one pixel into the running segment, closing the previous run
/// when the quantized power changes.
fn extract_segment(
    image: &GrayImage,
    x: i32,
    y: i32,
    reverse: bool,
    len: &mut i32,
    prev_power: &mut i32,
    out: &mut Vec<ColorSegment>,
    cfg: &EngraveConfig,
) {
    *len += 1;
    let power = quantize_power(image.get_pixel(x as u32, y as u32).0[0], cfg);
    if *prev_power == -1 {
        *prev_power = power;
    }
    if *prev_power != power {
        out.push(match cfg.scan_direction {
            ScanDirection::Horizontal => ColorSegment::axis_x(*prev_power, *len, reverse),
            ScanDirection::Vertical => ColorSegment::axis_y(*prev_power, *len, reverse),
            ScanDirection::Diagonal => ColorSegment::diagonal(*prev_power, *len, reverse),
        });
        *len = 0;
    }
    *prev_power = power;
}

fn scan_axis(image: &GrayImage, cfg: &EngraveConfig) -> Vec<ColorSegment> {
    let horizontal = cfg.scan_direction == ScanDirection::Horizontal;
    let w = image.width() as i32;
    let h = image.height() as i32;
    let lines = if horizontal { h } else { w };
    let span = if horizontal { w } else { h };
    let uni = cfg.unidirectional;

    let mut out = Vec::new();
    for i in 0..lines {
        let forward = uni || i % 2 == 0;
        let mut prev_power = -1;
        let mut len = -1;

        let mut visit = |j: i32, out: &mut Vec<ColorSegment>| {
            let (x, y) = if horizontal { (j, i) } else { (i, j) };
            extract_segment(image, x, y, !forward, &mut len, &mut prev_power, out, cfg);
        };
        if forward {
            for j in 0..span {
                visit(j, &mut out);
            }
        } else {
            for j in (0..span).rev() {
                visit(j, &mut out);
            }
        }

        // close the trailing run
        out.push(if horizontal {
            ColorSegment::axis_x(prev_power, len + 1, !forward)
        } else {
            ColorSegment::axis_y(prev_power, len + 1, !forward)
        });

        if uni {
            // explicit zero-power return travel to the line start
            out.push(if horizontal {
                ColorSegment::axis_x(0, w, true)
            } else {
                ColorSegment::axis_y(0, h, true)
            });
        }

        if i < lines - 1 {
            out.push(if horizontal {
                ColorSegment::separator(SeparatorAxis::Y)
            } else {
                ColorSegment::separator(SeparatorAxis::X)
            });
        }
    }
    out
}

/// Anti-diagonal traversal: slice `s` visits pixels `(j, s - j)`, with
/// the corner-clipping offsets `z1`/`z2` bounding `j` once the slice
/// leaves the image. Travel direction alternates per slice unless the
/// unidirectional flag is set.
fn scan_diagonal(image: &GrayImage, cfg: &EngraveConfig) -> Vec<ColorSegment> {
    let w = image.width() as i32;
    let h = image.height() as i32;
    let uni = cfg.unidirectional;

    let mut out = vec![ColorSegment::separator(SeparatorAxis::Y)];
    for slice in 0..(w + h - 1) {
        let forward = uni || slice % 2 == 0;
        let mut prev_power = -1;
        let mut len = -1;

        let z1 = if slice < h { 0 } else { slice - h + 1 };
        let z2 = if slice < w { 0 } else { slice - w + 1 };

        let mut visit = |j: i32, out: &mut Vec<ColorSegment>| {
            extract_segment(
                image,
                j,
                slice - j,
                !forward,
                &mut len,
                &mut prev_power,
                out,
                cfg,
            );
        };
        if forward {
            for j in z1..=(slice - z2) {
                visit(j, &mut out);
            }
        } else {
            for j in (z1..=(slice - z2)).rev() {
                visit(j, &mut out);
            }
        }
        out.push(ColorSegment::diagonal(prev_power, len + 1, !forward));

        if uni {
            let slen = (slice - z1 - z2) + 1;
            out.push(ColorSegment::diagonal(0, slen, true));
        }

        if slice < w.min(h) - 1 {
            // upper-left triangle of the image
            out.push(if forward && !uni {
                ColorSegment::separator(SeparatorAxis::X)
            } else {
                ColorSegment::separator(SeparatorAxis::Y)
            });
        } else if slice >= w.max(h) - 1 {
            // lower-right triangle
            out.push(if forward && !uni {
                ColorSegment::separator(SeparatorAxis::Y)
            } else {
                ColorSegment::separator(SeparatorAxis::X)
            });
        } else {
            // central band
            out.push(if w > h {
                ColorSegment::separator(SeparatorAxis::X)
            } else {
                ColorSegment::separator(SeparatorAxis::Y)
            });
        }
    }
    out
}
