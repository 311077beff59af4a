//! The editor's text form of a subtitle track: one block per cue, headed by
//! `[start --> end]`, blocks separated by blank lines.

use crate::host::SubtitleItem;
use crate::srt::Cue;
use crate::timecode::{to_timecode, FrameRate};

use std::fmt::Write;
use std::sync::OnceLock;

use regex::Regex;

fn header() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| Regex::new(r"\[(.*?) --> (.*?)\]").expect("valid regex"))
}

fn separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r"\n\n+").expect("valid regex"))
}

/// Reads editor text back into cues.
///
/// Blocks without a header, or with nothing but a header, are skipped rather
/// than failing the whole text. Timecodes are not validated; only a `.`
/// millisecond separator is turned into `,`.
pub fn parse(raw: &str) -> Vec<Cue> {
    let raw = raw.replace("\r\n", "\n");
    separator()
        .split(raw.trim())
        .filter_map(|block| {
            let cue = parse_block(block.trim());
            if cue.is_none() {
                log::debug!("Skipping malformed block: {:?}", block);
            }
            cue
        })
        .collect()
}

fn parse_block(block: &str) -> Option<Cue> {
    let lines: Vec<&str> = block.split('\n').collect();
    if lines.len() < 2 {
        return None;
    }
    let caps = header().captures(lines[0])?;
    Some(Cue {
        start: normalise_timecode(&caps[1]),
        end: normalise_timecode(&caps[2]),
        text: lines[1..].join("\n"),
    })
}

fn normalise_timecode(tc: &str) -> String {
    tc.trim().replacen('.', ",", 1)
}

/// Renders host subtitle items as editor text, relative to the timeline start.
pub fn render(items: &[SubtitleItem], timeline_start: i64, rate: FrameRate) -> String {
    let mut text = String::new();
    for item in items {
        let start = to_timecode(item.start - timeline_start, rate);
        let end = to_timecode(item.end - timeline_start, rate);
        // Writing into a String cannot fail.
        let _ = write!(text, "[{} --> {}]\n{}\n\n", start, end, item.name);
    }
    text
}
