use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

/// Playback rate in frames per second. Always finite and greater than zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRate(f64);

impl FrameRate {
    pub const DEFAULT: FrameRate = FrameRate(24.0);

    pub fn new(fps: f64) -> Option<Self> {
        if fps.is_finite() && fps > 0.0 {
            Some(FrameRate(fps))
        } else {
            None
        }
    }

    /// Reads a frame rate the way the host reports it, e.g. `23.976` or
    /// `29.97 DF`. Anything unusable yields the 24 fps default.
    pub fn parse(input: &str) -> Self {
        let input = input.replace(" NDF", "").replace(" DF", "");
        leading_float(&input)
            .and_then(FrameRate::new)
            .unwrap_or_else(|| {
                log::debug!("Unusable frame rate '{}', assuming {}", input, Self::DEFAULT);
                Self::DEFAULT
            })
    }

    pub fn fps(self) -> f64 {
        self.0
    }

    /// The frame nearest to `offset`.
    pub fn frames_in(self, offset: Duration) -> i64 {
        (offset.as_secs_f64() * self.0).round() as i64
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.0)
    }
}

// Like a lenient float parse: takes the longest numeric prefix and ignores the rest.
fn leading_float(input: &str) -> Option<f64> {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    let number = NUMBER.get_or_init(|| {
        Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?").expect("valid regex")
    });
    number
        .find(input)
        .and_then(|m| m.as_str().trim().parse().ok())
}

/// Formats a frame offset from the timeline origin as `HH:MM:SS,mmm`.
///
/// Every field is truncated, never rounded, so `36` frames at 24 fps is
/// `00:00:01,500` and float drift can only ever lose a millisecond.
pub fn to_timecode(frame_offset: i64, rate: FrameRate) -> String {
    let frames = if frame_offset < 0 {
        log::warn!(
            "Negative frame offset {} before timeline start, clamping to zero",
            frame_offset
        );
        0
    } else {
        frame_offset
    };

    let seconds = frames as f64 / rate.fps();
    let hours = (seconds / 3600.0).floor() as u64;
    let minutes = ((seconds % 3600.0) / 60.0).floor() as u64;
    let whole_seconds = (seconds % 60.0).floor() as u64;
    let millis = ((seconds - seconds.floor()) * 1000.0).floor() as u64;
    format!(
        "{:02}:{:02}:{:02},{:03}",
        hours, minutes, whole_seconds, millis
    )
}
