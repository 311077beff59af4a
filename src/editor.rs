//! Load and apply round trips as the user drives them, reduced to a single
//! status line each.

use crate::bridge::Bridge;
use crate::host::Connector;
use crate::markdown;
use crate::serialiser::to_srt;
use crate::timecode::FrameRate;

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Loaded(usize),
    NoSubtitles { track: usize },
    EditorEmpty,
    /// The editor held text but no block had a valid header.
    NoCues,
    Applied,
    Rejected,
    Failed(String),
}

impl fmt::Display for Status {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Status::Loaded(count) => write!(fmt, "Loaded {} subtitles.", count),
            Status::NoSubtitles { track } => write!(fmt, "No subtitles found on track {}.", track),
            Status::EditorEmpty => write!(fmt, "Editor is empty."),
            Status::NoCues => write!(
                fmt,
                "No usable cues found; the subtitle track was left unchanged."
            ),
            Status::Applied => write!(
                fmt,
                "Successfully appended modified subtitle track to timeline."
            ),
            Status::Rejected => write!(fmt, "Host rejected the subtitle track."),
            Status::Failed(msg) => write!(fmt, "Error: {}", msg),
        }
    }
}

impl Status {
    pub fn is_error(&self) -> bool {
        matches!(self, Status::NoCues | Status::Failed(_) | Status::Rejected)
    }
}

#[derive(Debug)]
pub struct Loaded {
    pub status: Status,
    /// Editor text, present once subtitles were found.
    pub text: Option<String>,
}

pub fn load<C: Connector>(bridge: &mut Bridge<C>) -> Loaded {
    log::info!("Loading subtitles...");
    let payload = match bridge.get_subtitles().into_result() {
        Ok(payload) => payload,
        Err(error) => {
            return Loaded {
                status: Status::Failed(error),
                text: None,
            }
        }
    };
    if payload.subtitles.is_empty() {
        return Loaded {
            status: Status::NoSubtitles {
                track: bridge.config().subtitle_track,
            },
            text: None,
        };
    }

    let rate = FrameRate::parse(&payload.frame_rate);
    log::debug!(
        "Timeline starts at frame {} at {} fps",
        payload.timeline_start_frame,
        rate
    );
    let text = markdown::render(&payload.subtitles, payload.timeline_start_frame, rate);
    Loaded {
        status: Status::Loaded(payload.subtitles.len()),
        text: Some(text),
    }
}

pub fn apply<C: Connector>(bridge: &mut Bridge<C>, text: &str) -> Status {
    log::info!("Applying changes...");
    let text = text.trim();
    if text.is_empty() {
        return Status::EditorEmpty;
    }

    let cues = markdown::parse(text);
    if cues.is_empty() {
        log::warn!("No block in the editor has a valid header");
        return Status::NoCues;
    }
    let srt = to_srt(&cues);
    log::debug!("SRT length: {}", srt.len());
    match bridge.apply_subtitles(&srt).into_result() {
        Ok(payload) if payload.success => Status::Applied,
        Ok(_) => Status::Rejected,
        Err(error) => Status::Failed(error),
    }
}
