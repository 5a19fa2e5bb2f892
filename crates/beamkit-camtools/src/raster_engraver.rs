//! Raster image to instruction conversion.
//!
//! [`RasterEngraver`] drives the full pipeline for one image: scan-line
//! segmentation, 1:1 segment-to-instruction emission with a cumulative
//! pixel cursor, and a zero-power coalescing pass that merges blank
//! travel into single skip moves. Images are engraved bottom to top to
//! match device coordinate space where Y increases upward.

use anyhow::{bail, Result};
use beamkit_core::config::EngraveConfig;
use beamkit_core::format::format_coord;
use beamkit_core::instruction::Instruction;
use image::GrayImage;
use tracing::debug;

use crate::error::validate_config;
use crate::segmenter::{scan_segments, ColorSegment, PixelCursor};

/// Raster engraving tool for grayscale intensity images.
pub struct RasterEngraver {
    image: GrayImage,
    config: EngraveConfig,
}

impl RasterEngraver {
    /// Creates an engraver over an intensity image (0 = no mark, 255 =
    /// maximum), flipping it into device space.
    pub fn from_image(image: GrayImage, config: EngraveConfig) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            bail!("image has no pixels");
        }
        validate_config(&config)?;
        let image = image::imageops::flip_vertical(&image);
        Ok(Self { image, config })
    }

    pub fn config(&self) -> &EngraveConfig {
        &self.config
    }

    /// Full conversion: positioning preamble, engraved body, trailing
    /// laser-off.
    pub fn engrave(&self) -> Vec<Instruction> {
        let c = &self.config;
        let mut out = Vec::new();

        // move (fast unless disabled) to the target offset and set the mark feed
        out.push(Instruction::new(format!(
            "{} X{} Y{} F{}",
            c.skip_command(),
            format_coord(c.offset_x),
            format_coord(c.offset_y),
            c.mark_speed
        )));
        if c.power_encoding.is_pwm() {
            // laser armed at zero power
            out.push(Instruction::new(format!("{} S0", c.laser_on)));
        } else {
            // laser off with power preloaded to maximum
            out.push(Instruction::new(format!("{} S255", c.laser_off)));
        }

        out.extend(self.body());
        out.push(Instruction::new(c.laser_off.clone()));
        out
    }

    /// Segment emission plus travel coalescing, without the preamble.
    pub fn body(&self) -> Vec<Instruction> {
        let segments = scan_segments(&self.image, &self.config);
        debug!(
            segments = segments.len(),
            width = self.image.width(),
            height = self.image.height(),
            "segmented raster image"
        );
        let raw = emit_instructions(&segments, &self.config);
        coalesce_travel(raw, &self.config)
    }
}

/// Converts segments to raw instructions, 1:1, threading the cumulative
/// pixel cursor through and switching between fast and marking motion
/// modes as the segment power crosses the marking threshold.
pub fn emit_instructions(segments: &[ColorSegment], cfg: &EngraveConfig) -> Vec<Instruction> {
    let mut fast = true;
    let mut cursor = PixelCursor::default();
    let mut out = Vec::with_capacity(segments.len());

    for seg in segments {
        let change_mode = fast != seg.is_fast(cfg);

        // a separator right after a marking run closes that run's power
        // on the coordinate update that starts the blank travel
        let mut param = String::new();
        if seg.is_separator() && !fast {
            param = if cfg.power_encoding.is_pwm() {
                "S0".to_string()
            } else {
                cfg.laser_off.clone()
            };
        }

        fast = seg.is_fast(cfg);
        let words = seg.to_instruction_text(&mut cursor, cfg);

        let text = if change_mode {
            let mode = if fast { cfg.skip_command() } else { "G1" };
            format!("{} {} {}", mode, words, param)
        } else {
            format!("{} {}", words, param)
        };
        out.push(Instruction::new(text.trim_end().to_string()));
    }
    out
}

/// Collapses consecutive zero-power travel into a single skip move.
///
/// A forward pass tracks the current coordinate and a `cumulate` flag:
/// entering a zero-power state starts cumulating, leaving it flushes one
/// fast positioning instruction to the last tracked coordinate before
/// the instruction that re-arms power. Movement-only instructions are
/// absorbed while cumulating. Laser-on coordinates are left untouched.
pub fn coalesce_travel(raw: Vec<Instruction>, cfg: &EngraveConfig) -> Vec<Instruction> {
    let mut out = Vec::with_capacity(raw.len());
    let mut cur_x = cfg.offset_x;
    let mut cur_y = cfg.offset_y;
    let mut cumulate = false;

    for cmd in raw {
        let was_cumulating = cumulate;

        if cfg.power_encoding.is_pwm() {
            if let Some(s) = cmd.spindle() {
                cumulate = s == 0.0;
            }
        } else if cmd.is_laser_off() {
            cumulate = true;
        } else if cmd.is_laser_on() {
            cumulate = false;
        }

        if was_cumulating && !cumulate {
            // falling edge: flush the accumulated travel as one skip move
            let off = if cfg.power_encoding.is_pwm() {
                "S0"
            } else {
                cfg.laser_off.as_str()
            };
            out.push(Instruction::new(format!(
                "{} X{} Y{} {}",
                cfg.skip_command(),
                format_coord(cur_x),
                format_coord(cur_y),
                off
            )));
        }

        if cmd.is_movement() {
            if let Some(x) = cmd.x() {
                cur_x = x;
            }
            if let Some(y) = cmd.y() {
                cur_y = y;
            }
        }

        if !cmd.is_movement() || !cumulate {
            out.push(cmd);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use beamkit_core::config::{PowerEncoding, ScanDirection};
    use image::Luma;

    fn gray(width: u32, height: u32, pixels: &[u8]) -> GrayImage {
        assert_eq!(pixels.len() as u32, width * height);
        GrayImage::from_fn(width, height, |x, y| Luma([pixels[(y * width + x) as usize]]))
    }

    fn unit_config() -> EngraveConfig {
        EngraveConfig {
            resolution: 1.0,
            fill_resolution: 1.0,
            ..EngraveConfig::default()
        }
    }

    fn texts(instructions: &[Instruction]) -> Vec<&str> {
        instructions.iter().map(|c| c.text()).collect()
    }

    #[test]
    fn test_two_pixel_scenario_yields_flush_and_mark() {
        // intensities [0, 200], proportional power 0..255, 1 px per unit
        let img = gray(2, 1, &[0, 200]);
        let engraver = RasterEngraver::from_image(img, unit_config()).expect("engraver");
        let body = engraver.body();
        assert_eq!(texts(&body), vec!["G0 X1 Y0 S0", "G1 X2 S200"]);
    }

    #[test]
    fn test_full_engrave_wraps_body_with_preamble_and_shutoff() {
        let img = gray(2, 1, &[0, 200]);
        let engraver = RasterEngraver::from_image(img, unit_config()).expect("engraver");
        let all = engraver.engrave();
        assert_eq!(
            texts(&all),
            vec![
                "G0 X0 Y0 F1000",
                "M3 S0",
                "G0 X1 Y0 S0",
                "G1 X2 S200",
                "M5",
            ]
        );
    }

    #[test]
    fn test_laser_on_coordinates_survive_coalescing() {
        let img = gray(6, 1, &[0, 120, 0, 0, 0, 120]);
        let engraver = RasterEngraver::from_image(img, unit_config()).expect("engraver");
        let segments = scan_segments(&engraver.image, &engraver.config);
        let raw = emit_instructions(&segments, &engraver.config);
        let coalesced = coalesce_travel(raw.clone(), &engraver.config);

        let marking = |cmds: &[Instruction]| -> Vec<(Option<f64>, Option<f64>)> {
            cmds.iter()
                .filter(|c| c.spindle().is_some_and(|s| s > 0.0))
                .map(|c| (c.x(), c.y()))
                .collect()
        };
        assert_eq!(marking(&coalesced), marking(&raw));
        assert!(coalesced.len() <= raw.len());
    }

    #[test]
    fn test_movement_only_travel_is_absorbed() {
        // a long blank run between two marks collapses to one flush move
        let img = gray(8, 2, &[0, 255, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 255, 0]);
        let engraver = RasterEngraver::from_image(img, unit_config()).expect("engraver");
        let body = engraver.body();
        let zero_power_moves = body
            .iter()
            .filter(|c| c.is_movement() && c.spindle() == Some(0.0))
            .count();
        // one flush before each of the two marking runs
        assert_eq!(zero_power_moves, 2);
    }

    #[test]
    fn test_switched_mode_uses_tokens() {
        let img = gray(2, 1, &[0, 200]);
        let cfg = EngraveConfig {
            power_encoding: PowerEncoding::Switched,
            ..unit_config()
        };
        let engraver = RasterEngraver::from_image(img, cfg).expect("engraver");
        let all = engraver.engrave();
        let joined = texts(&all).join("\n");
        assert!(joined.contains("M5 S255"));
        assert!(joined.contains("M3"));
        assert!(all.last().expect("trailing shutoff").text() == "M5");
    }

    #[test]
    fn test_image_is_flipped_into_device_space() {
        // mark only the top row of the source image; after the flip it is
        // engraved as the first (bottom) scan line
        let img = gray(1, 2, &[210, 0]);
        let engraver = RasterEngraver::from_image(img, unit_config()).expect("engraver");
        let body = engraver.body();
        // the blank first line collapses into the flush, which lands on the
        // second scan line (Y1) where the flipped mark is engraved
        assert_eq!(texts(&body), vec!["G0 X1 Y1 S0", "G1 X0 S210"]);
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let img = GrayImage::new(0, 0);
        assert!(RasterEngraver::from_image(img, unit_config()).is_err());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let img = gray(1, 1, &[0]);
        let cfg = EngraveConfig {
            min_power: 200,
            max_power: 100,
            ..unit_config()
        };
        assert!(RasterEngraver::from_image(img, cfg).is_err());
    }

    #[test]
    fn test_disable_fast_skip_uses_g1() {
        let img = gray(2, 1, &[0, 200]);
        let cfg = EngraveConfig {
            disable_fast_skip: true,
            ..unit_config()
        };
        let engraver = RasterEngraver::from_image(img, cfg).expect("engraver");
        let body = engraver.body();
        assert_eq!(texts(&body), vec!["G1 X1 Y0 S0", "G1 X2 S200"]);
    }

    #[test]
    fn test_vertical_direction_round_trips_through_pipeline() {
        let img = gray(2, 3, &[0, 130, 0, 130, 0, 130]);
        let cfg = EngraveConfig {
            scan_direction: ScanDirection::Vertical,
            ..unit_config()
        };
        let engraver = RasterEngraver::from_image(img, cfg).expect("engraver");
        let body = engraver.body();
        assert!(!body.is_empty());
        // every marking instruction carries the rescaled power 130
        for cmd in body.iter().filter(|c| c.spindle().is_some_and(|s| s > 0.0)) {
            assert_eq!(cmd.spindle(), Some(130.0));
        }
    }
}
