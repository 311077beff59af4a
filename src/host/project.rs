//! A host backed by a JSON project document on disk.
//!
//! The document stands in for the editing application: it holds the current
//! project (if any), its timeline tracks and its media pool. Importing an SRT
//! file reads it into the media pool; appending places its cues on the
//! requested subtitle track. Every mutation is written back to the document.

use super::{
    Connector, Host, ItemId, MediaItemId, MediaPoolRef, ProbeTarget, SettingValue, TimelineItem,
    TimelineRef, Track, TrackKind,
};
use crate::error::BridgeError;
use crate::parser;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectDocument {
    #[serde(default)]
    pub project: Option<Project>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub timeline_frame_rate: serde_json::Value,
    #[serde(default)]
    pub timeline: Option<Timeline>,
    #[serde(default)]
    pub media_pool: Vec<MediaPoolItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub name: String,
    #[serde(default)]
    pub start_frame: i64,
    #[serde(default)]
    pub tracks: Tracks,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tracks {
    #[serde(default)]
    pub video: Vec<Vec<Clip>>,
    #[serde(default)]
    pub subtitle: Vec<Vec<Clip>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: u64,
    pub name: String,
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaPoolItem {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub cues: Vec<PooledCue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PooledCue {
    pub text: String,
    pub start_ms: u64,
    pub end_ms: u64,
}

impl Tracks {
    fn get(&self, track: Track) -> Option<&Vec<Clip>> {
        let tracks = match track.kind {
            TrackKind::Video => &self.video,
            TrackKind::Subtitle => &self.subtitle,
        };
        track.index.checked_sub(1).and_then(|i| tracks.get(i))
    }

    /// Subtitle tracks are created on demand; other tracks are not writable.
    fn subtitle_mut(&mut self, track: Track) -> Option<&mut Vec<Clip>> {
        if track.kind != TrackKind::Subtitle {
            return None;
        }
        let slot = track.index.checked_sub(1)?;
        if self.subtitle.len() <= slot {
            self.subtitle.resize_with(slot + 1, Vec::new);
        }
        self.subtitle.get_mut(slot)
    }

    fn all(&self) -> impl Iterator<Item = &Clip> {
        self.video.iter().chain(self.subtitle.iter()).flatten()
    }
}

/// Opens the project document at a path.
pub struct ProjectConnector {
    path: PathBuf,
}

impl ProjectConnector {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl Connector for ProjectConnector {
    type Host = ProjectHost;

    fn initialize(&mut self, plugin_id: &str) -> Result<bool, BridgeError> {
        let found = self.path.is_file();
        if !found {
            log::warn!(
                "No project document at '{}', host unavailable to '{}'",
                self.path.display(),
                plugin_id
            );
        }
        Ok(found)
    }

    fn connect(&mut self) -> Result<Option<ProjectHost>, BridgeError> {
        ProjectHost::open(&self.path).map(Some)
    }
}

pub struct ProjectHost {
    path: Option<PathBuf>,
    document: ProjectDocument,
}

impl ProjectHost {
    /// A host that keeps its document in memory only.
    pub fn new(document: ProjectDocument) -> Self {
        Self {
            path: None,
            document,
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, BridgeError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|e| BridgeError::io(format!("Failed to open '{}'", path.display()), e))?;
        let document = serde_json::from_str(&data).map_err(|e| {
            BridgeError::HostCallFailed(format!(
                "Malformed project document '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            document,
        })
    }

    pub fn document(&self) -> &ProjectDocument {
        &self.document
    }

    fn save(&self) -> Result<(), BridgeError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let data = serde_json::to_string_pretty(&self.document)
            .map_err(|e| BridgeError::HostCallFailed(format!("Failed to save project: {}", e)))?;
        std::fs::write(path, data)
            .map_err(|e| BridgeError::io(format!("Failed to save '{}'", path.display()), e))
    }

    fn project(&self) -> Result<&Project, BridgeError> {
        self.document
            .project
            .as_ref()
            .ok_or_else(|| BridgeError::HostCallFailed("Project is no longer open.".to_string()))
    }

    fn project_mut(&mut self) -> Result<&mut Project, BridgeError> {
        self.document
            .project
            .as_mut()
            .ok_or_else(|| BridgeError::HostCallFailed("Project is no longer open.".to_string()))
    }

    fn timeline(&self) -> Result<&Timeline, BridgeError> {
        self.project()?
            .timeline
            .as_ref()
            .ok_or_else(|| BridgeError::HostCallFailed("Timeline is no longer open.".to_string()))
    }

    fn next_id(&self) -> u64 {
        self.document
            .project
            .iter()
            .flat_map(|p| {
                let clips = p.timeline.iter().flat_map(|t| t.tracks.all()).map(|c| c.id);
                let media = p.media_pool.iter().map(|m| m.id);
                clips.chain(media).collect::<Vec<_>>()
            })
            .max()
            .map_or(1, |id| id + 1)
    }
}

fn json_keys<T: Serialize>(value: &T) -> Vec<String> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

impl Host for ProjectHost {
    fn current_timeline(&mut self) -> Result<Option<TimelineRef>, BridgeError> {
        Ok(self
            .document
            .project
            .as_ref()
            .and_then(|p| p.timeline.as_ref())
            .map(|_| TimelineRef(0)))
    }

    fn media_pool(&mut self) -> Result<Option<MediaPoolRef>, BridgeError> {
        Ok(self.document.project.as_ref().map(|_| MediaPoolRef(0)))
    }

    fn frame_rate_setting(&mut self) -> Result<SettingValue, BridgeError> {
        Ok(SettingValue::from(&self.project()?.timeline_frame_rate))
    }

    fn start_frame(&mut self, _timeline: TimelineRef) -> Result<i64, BridgeError> {
        Ok(self.timeline()?.start_frame)
    }

    fn items_in_track(
        &mut self,
        _timeline: TimelineRef,
        track: Track,
    ) -> Result<Vec<TimelineItem>, BridgeError> {
        let clips = match self.timeline()?.tracks.get(track) {
            Some(clips) => clips,
            None => return Ok(Vec::new()),
        };
        Ok(clips
            .iter()
            .map(|clip| TimelineItem {
                id: ItemId(clip.id),
                name: clip.name.clone(),
                start: clip.start,
                end: clip.end,
            })
            .collect())
    }

    fn delete_items(
        &mut self,
        _timeline: TimelineRef,
        items: &[ItemId],
    ) -> Result<bool, BridgeError> {
        let timeline = self
            .project_mut()?
            .timeline
            .as_mut()
            .ok_or_else(|| BridgeError::HostCallFailed("Timeline is no longer open.".to_string()))?;
        let mut removed = 0;
        for track in timeline
            .tracks
            .video
            .iter_mut()
            .chain(timeline.tracks.subtitle.iter_mut())
        {
            let before = track.len();
            track.retain(|clip| !items.iter().any(|id| id.0 == clip.id));
            removed += before - track.len();
        }
        log::debug!("Deleted {} of {} requested items", removed, items.len());
        self.save()?;
        Ok(removed == items.len())
    }

    fn import_media(
        &mut self,
        _pool: MediaPoolRef,
        paths: &[PathBuf],
    ) -> Result<Vec<MediaItemId>, BridgeError> {
        let mut next_id = self.next_id();
        let mut imported = Vec::new();
        for path in paths {
            let data = std::fs::read_to_string(path)
                .map_err(|e| BridgeError::io(format!("Failed to import '{}'", path.display()), e))?;
            let subs = parser::parse(&data).map_err(|e| {
                BridgeError::HostCallFailed(format!("Failed to import '{}': {}", path.display(), e))
            })?;
            let cues = subs
                .into_iter()
                .map(|sub| PooledCue {
                    text: sub.text.join("\n"),
                    start_ms: sub.show_at.as_millis() as u64,
                    end_ms: sub.hide_at.as_millis() as u64,
                })
                .collect();
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.project_mut()?.media_pool.push(MediaPoolItem {
                id: next_id,
                name,
                cues,
            });
            imported.push(MediaItemId(next_id));
            next_id += 1;
        }
        self.save()?;
        Ok(imported)
    }

    fn append_to_timeline(
        &mut self,
        _pool: MediaPoolRef,
        items: &[MediaItemId],
        track: Track,
    ) -> Result<bool, BridgeError> {
        let mut next_id = self.next_id();
        let project = self.project_mut()?;
        let rate = SettingValue::from(&project.timeline_frame_rate).frame_rate();
        let cues = items
            .iter()
            .map(|item| {
                project
                    .media_pool
                    .iter()
                    .find(|m| m.id == item.0)
                    .map(|m| m.cues.clone())
                    .ok_or_else(|| {
                        BridgeError::HostCallFailed(format!("Unknown media pool item {}", item.0))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let timeline = project
            .timeline
            .as_mut()
            .ok_or_else(|| BridgeError::HostCallFailed("Timeline is no longer open.".to_string()))?;

        let start_frame = timeline.start_frame;
        let clips = timeline.tracks.subtitle_mut(track).ok_or_else(|| {
            BridgeError::HostCallFailed(format!(
                "Cannot append to {:?} track {}",
                track.kind, track.index
            ))
        })?;
        let mut appended = 0;
        for cues in cues {
            let origin = clips.iter().map(|c| c.end).max().unwrap_or(start_frame);
            for cue in cues {
                clips.push(Clip {
                    id: next_id,
                    name: cue.text,
                    start: origin + rate.frames_in(Duration::from_millis(cue.start_ms)),
                    end: origin + rate.frames_in(Duration::from_millis(cue.end_ms)),
                });
                next_id += 1;
                appended += 1;
            }
        }
        log::debug!("Appended {} clips to track {}", appended, track.index);
        self.save()?;
        Ok(appended > 0)
    }

    fn properties(&mut self, target: ProbeTarget) -> Result<Vec<String>, BridgeError> {
        Ok(match target {
            ProbeTarget::Timeline => json_keys(self.timeline()?),
            ProbeTarget::TimelineItem => self
                .timeline()?
                .tracks
                .get(Track::video(1))
                .and_then(|clips| clips.first())
                .map(json_keys)
                .unwrap_or_default(),
            ProbeTarget::MediaPool => self
                .project()?
                .media_pool
                .iter()
                .map(|item| item.name.clone())
                .collect(),
        })
    }
}
