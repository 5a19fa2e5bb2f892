//! Single motion/power instruction with on-demand field access.
//!
//! The text line is authoritative; typed fields are extracted by a
//! lightweight parse each time they are asked for and are never written
//! back. The only mutable annotation is the cumulative time offset
//! stamped during program analysis.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

fn word_regex() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| {
        Regex::new(r"(?i)([A-Z])\s*([-+]?[0-9]*\.?[0-9]+)").expect("invalid word pattern")
    })
}

/// One emitted or loaded instruction line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    text: String,
    /// Cumulative execution-time offset, stamped by the analyzer.
    time_offset: Option<Duration>,
}

impl Instruction {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            time_offset: None,
        }
    }

    /// The raw instruction text, comments included.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The text with `;` and parenthesized comments removed.
    pub fn stripped(&self) -> String {
        let mut s = String::with_capacity(self.text.len());
        let mut in_paren = false;
        for ch in self.text.chars() {
            match ch {
                ';' if !in_paren => break,
                '(' => in_paren = true,
                ')' if in_paren => in_paren = false,
                _ if !in_paren => s.push(ch),
                _ => {}
            }
        }
        s.trim().to_string()
    }

    /// Whether nothing remains after comment removal.
    pub fn is_empty(&self) -> bool {
        self.stripped().is_empty()
    }

    /// First numeric word introduced by `letter`, if present.
    pub fn field(&self, letter: char) -> Option<f64> {
        let stripped = self.stripped();
        let wanted = letter.to_ascii_uppercase();
        for caps in word_regex().captures_iter(&stripped) {
            let found = caps[1].chars().next()?.to_ascii_uppercase();
            if found == wanted {
                return caps[2].parse().ok();
            }
        }
        None
    }

    pub fn x(&self) -> Option<f64> {
        self.field('X')
    }

    pub fn y(&self) -> Option<f64> {
        self.field('Y')
    }

    pub fn i(&self) -> Option<f64> {
        self.field('I')
    }

    pub fn j(&self) -> Option<f64> {
        self.field('J')
    }

    pub fn feed(&self) -> Option<f64> {
        self.field('F')
    }

    pub fn spindle(&self) -> Option<f64> {
        self.field('S')
    }

    /// G word, truncated to its integer part.
    pub fn g(&self) -> Option<u8> {
        self.field('G').map(|v| v as u8)
    }

    /// M word, truncated to its integer part.
    pub fn m(&self) -> Option<u8> {
        self.field('M').map(|v| v as u8)
    }

    /// Whether this instruction changes the commanded position.
    pub fn is_movement(&self) -> bool {
        self.x().is_some() || self.y().is_some()
    }

    /// M3/M4 laser (spindle) activation.
    pub fn is_laser_on(&self) -> bool {
        matches!(self.m(), Some(3) | Some(4))
    }

    /// M5 laser (spindle) shutoff.
    pub fn is_laser_off(&self) -> bool {
        self.m() == Some(5)
    }

    /// Cumulative execution-time offset, once analyzed.
    pub fn time_offset(&self) -> Option<Duration> {
        self.time_offset
    }

    pub fn set_time_offset(&mut self, offset: Duration) {
        self.time_offset = Some(offset);
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Instruction {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}
