//! The capabilities the bridge needs from the editing host.
//!
//! Only the calls actually made by the load and apply paths are declared here.
//! An implementation wraps whatever automation surface the host offers; tests
//! substitute their own.

pub mod project;

use crate::error::BridgeError;
use crate::timecode::FrameRate;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimelineRef(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaPoolRef(pub u64);

/// An item placed on a timeline track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(pub u64);

/// An item held in the media pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaItemId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Subtitle,
}

/// A track on the timeline. Indices are 1-based like the host's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Track {
    pub kind: TrackKind,
    pub index: usize,
}

impl Track {
    pub fn subtitle(index: usize) -> Self {
        Self {
            kind: TrackKind::Subtitle,
            index,
        }
    }

    pub fn video(index: usize) -> Self {
        Self {
            kind: TrackKind::Video,
            index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineItem {
    pub id: ItemId,
    pub name: String,
    pub start: i64,
    pub end: i64,
}

/// A subtitle as reported to the editor. Frames are absolute to the
/// timeline, not yet offset by its start frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtitleItem {
    pub name: String,
    pub start: i64,
    pub end: i64,
}

impl From<TimelineItem> for SubtitleItem {
    fn from(item: TimelineItem) -> Self {
        Self {
            name: item.name,
            start: item.start,
            end: item.end,
        }
    }
}

/// The project's frame rate setting as the host hands it over.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Number(f64),
    Text(String),
    Missing,
    /// Present but neither a number nor text, e.g. an object.
    Malformed,
}

impl SettingValue {
    pub fn frame_rate(&self) -> FrameRate {
        match self {
            SettingValue::Number(n) => FrameRate::new(*n).unwrap_or_default(),
            SettingValue::Text(s) => FrameRate::parse(s),
            SettingValue::Missing | SettingValue::Malformed => FrameRate::DEFAULT,
        }
    }

    /// The setting as passed on to the editor. Text is kept verbatim so
    /// drop-frame markers survive; everything unusable becomes the default.
    pub fn render(&self) -> String {
        match self {
            SettingValue::Text(s) if !s.is_empty() => s.clone(),
            other => other.frame_rate().to_string(),
        }
    }
}

impl From<&serde_json::Value> for SettingValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => SettingValue::Missing,
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(SettingValue::Number)
                .unwrap_or(SettingValue::Malformed),
            serde_json::Value::String(s) => SettingValue::Text(s.clone()),
            _ => SettingValue::Malformed,
        }
    }
}

/// Objects that can be inspected with `probe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeTarget {
    Timeline,
    TimelineItem,
    MediaPool,
}

impl ProbeTarget {
    /// Host calls this crate makes against the target.
    pub fn methods(self) -> &'static [&'static str] {
        match self {
            ProbeTarget::Timeline => &["start_frame", "items_in_track", "delete_items"],
            ProbeTarget::TimelineItem => &["name", "start", "end"],
            ProbeTarget::MediaPool => &["import_media", "append_to_timeline"],
        }
    }
}

impl FromStr for ProbeTarget {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timeline" => Ok(ProbeTarget::Timeline),
            "timelineItem" => Ok(ProbeTarget::TimelineItem),
            "mediaPool" => Ok(ProbeTarget::MediaPool),
            other => Err(BridgeError::InvalidInput(format!(
                "Unknown probe target '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ProbeTarget::Timeline => "timeline",
            ProbeTarget::TimelineItem => "timelineItem",
            ProbeTarget::MediaPool => "mediaPool",
        };
        write!(fmt, "{}", name)
    }
}

/// A live connection to the host's current project.
pub trait Host {
    /// `None` when no project or timeline is open.
    fn current_timeline(&mut self) -> Result<Option<TimelineRef>, BridgeError>;
    /// `None` when no project is open.
    fn media_pool(&mut self) -> Result<Option<MediaPoolRef>, BridgeError>;
    fn frame_rate_setting(&mut self) -> Result<SettingValue, BridgeError>;

    fn start_frame(&mut self, timeline: TimelineRef) -> Result<i64, BridgeError>;
    fn items_in_track(
        &mut self,
        timeline: TimelineRef,
        track: Track,
    ) -> Result<Vec<TimelineItem>, BridgeError>;
    fn delete_items(&mut self, timeline: TimelineRef, items: &[ItemId])
        -> Result<bool, BridgeError>;

    fn import_media(
        &mut self,
        pool: MediaPoolRef,
        paths: &[PathBuf],
    ) -> Result<Vec<MediaItemId>, BridgeError>;
    /// Places `items` at the end of `track`, or at the timeline start when
    /// the track is empty.
    fn append_to_timeline(
        &mut self,
        pool: MediaPoolRef,
        items: &[MediaItemId],
        track: Track,
    ) -> Result<bool, BridgeError>;

    /// Data members of a live object, for diagnostics only.
    fn properties(&mut self, _target: ProbeTarget) -> Result<Vec<String>, BridgeError> {
        Ok(Vec::new())
    }
}

/// Establishes a [`Host`] connection.
pub trait Connector {
    type Host: Host;

    /// Registers the plugin with the host. `false` means the host declined.
    fn initialize(&mut self, plugin_id: &str) -> Result<bool, BridgeError>;
    fn connect(&mut self) -> Result<Option<Self::Host>, BridgeError>;
}

/// Owns the connector and the host connection, created on first use.
///
/// A failed attempt leaves no connection behind so the next call retries.
pub struct HostHandle<C: Connector> {
    connector: C,
    plugin_id: String,
    host: Option<C::Host>,
}

impl<C: Connector> HostHandle<C> {
    pub fn new(connector: C, plugin_id: impl Into<String>) -> Self {
        Self {
            connector,
            plugin_id: plugin_id.into(),
            host: None,
        }
    }

    pub fn get(&mut self) -> Option<&mut C::Host> {
        if self.host.is_none() {
            match self.establish() {
                Ok(host) => self.host = host,
                Err(err) => log::error!("Initialization error: {}", err),
            }
        }
        self.host.as_mut()
    }

    fn establish(&mut self) -> Result<Option<C::Host>, BridgeError> {
        if !self.connector.initialize(&self.plugin_id)? {
            log::warn!("Host declined plugin '{}'", self.plugin_id);
            return Ok(None);
        }
        let host = self.connector.connect()?;
        if host.is_some() {
            log::debug!("Connected to host as '{}'", self.plugin_id);
        }
        Ok(host)
    }
}

#[cfg(test)]
pub(crate) mod fake;
