use std::time::Duration;

/// A block read from an SRT file.
#[derive(Debug, Clone, PartialEq)]
pub struct Subtitle {
    pub(crate) sequence_number: usize,
    pub(crate) show_at: Duration,
    pub(crate) hide_at: Duration,
    pub(crate) text: Vec<String>,
}

/// A cue as the editor sees it. Timecodes are kept as text and never reparsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub start: String,
    pub end: String,
    pub text: String,
}

impl Cue {
    pub fn new(start: impl Into<String>, end: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            text: text.into(),
        }
    }
}
