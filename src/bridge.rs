use crate::error::BridgeError;
use crate::host::{Connector, Host, HostHandle, ProbeTarget, SubtitleItem, Track};

use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tempfile::TempPath;

pub const DEFAULT_PLUGIN_ID: &str = "com.geluk.subbridge";

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub plugin_id: String,
    /// 1-based index of the subtitle track that is read and replaced.
    pub subtitle_track: usize,
    pub temp_dir: PathBuf,
    /// How long a temporary SRT file is kept around for the host to read.
    pub cleanup_delay: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            plugin_id: DEFAULT_PLUGIN_ID.to_string(),
            subtitle_track: 1,
            temp_dir: std::env::temp_dir(),
            cleanup_delay: Duration::from_secs(5),
        }
    }
}

/// Either the payload or `{"error": "..."}` on the wire.
#[derive(Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply<T> {
    Ok(T),
    Err { error: String },
}

impl<T> From<Result<T, BridgeError>> for Reply<T> {
    fn from(result: Result<T, BridgeError>) -> Self {
        match result {
            Ok(payload) => Reply::Ok(payload),
            Err(err) => {
                log::error!("{}", err);
                Reply::Err {
                    error: err.to_string(),
                }
            }
        }
    }
}

impl<T> Reply<T> {
    pub fn into_result(self) -> Result<T, String> {
        match self {
            Reply::Ok(payload) => Ok(payload),
            Reply::Err { error } => Err(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitlesPayload {
    pub frame_rate: String,
    pub timeline_start_frame: i64,
    pub subtitles: Vec<SubtitleItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplyPayload {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbePayload {
    pub methods: Vec<String>,
    pub properties: Vec<String>,
}

/// Serves the editor's requests against one host.
///
/// Every request takes `&mut self`, so a second apply can never start while
/// the first is still deleting and importing.
pub struct Bridge<C: Connector> {
    host: HostHandle<C>,
    config: BridgeConfig,
    cleanups: Vec<JoinHandle<()>>,
}

impl<C: Connector> Bridge<C> {
    pub fn new(connector: C, config: BridgeConfig) -> Self {
        Self {
            host: HostHandle::new(connector, config.plugin_id.clone()),
            config,
            cleanups: Vec::new(),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn get_subtitles(&mut self) -> Reply<SubtitlesPayload> {
        self.fetch_subtitles().into()
    }

    pub fn apply_subtitles(&mut self, srt: &str) -> Reply<ApplyPayload> {
        self.replace_subtitles(srt)
            .map(|success| ApplyPayload { success })
            .into()
    }

    /// Lists what can be called on a live host object. Diagnostics only.
    pub fn probe_object(&mut self, kind: &str) -> Reply<ProbePayload> {
        kind.parse()
            .and_then(|target| self.probe(target))
            .into()
    }

    /// Waits for pending temporary file removals.
    pub fn finish(&mut self) {
        for handle in self.cleanups.drain(..) {
            let _ = handle.join();
        }
    }

    fn fetch_subtitles(&mut self) -> Result<SubtitlesPayload, BridgeError> {
        let track = Track::subtitle(self.config.subtitle_track);
        let host = self.host.get().ok_or_else(no_timeline)?;
        let timeline = host.current_timeline()?.ok_or_else(no_timeline)?;

        let subtitles = host
            .items_in_track(timeline, track)?
            .into_iter()
            .map(SubtitleItem::from)
            .collect();
        let frame_rate = host.frame_rate_setting()?.render();
        let timeline_start_frame = host.start_frame(timeline)?;

        Ok(SubtitlesPayload {
            frame_rate,
            timeline_start_frame,
            subtitles,
        })
    }

    fn replace_subtitles(&mut self, srt: &str) -> Result<bool, BridgeError> {
        let temp = TempSrt::create(&self.config.temp_dir, srt)?;
        let result = self.push_to_timeline(temp.path());
        if let Some(handle) = temp.remove_after(self.config.cleanup_delay) {
            self.cleanups.push(handle);
        }
        result
    }

    fn push_to_timeline(&mut self, srt: &Path) -> Result<bool, BridgeError> {
        let track = Track::subtitle(self.config.subtitle_track);
        let unavailable =
            || BridgeError::HostUnavailable("No timeline or media pool available.".to_string());
        let host = self.host.get().ok_or_else(unavailable)?;
        let pool = host.media_pool()?;
        let timeline = host.current_timeline()?;
        let (pool, timeline) = match (pool, timeline) {
            (Some(pool), Some(timeline)) => (pool, timeline),
            _ => return Err(unavailable()),
        };

        let existing: Vec<_> = host
            .items_in_track(timeline, track)?
            .into_iter()
            .map(|item| item.id)
            .collect();
        if !existing.is_empty() {
            log::info!(
                "Deleting {} subtitle items from track {}",
                existing.len(),
                track.index
            );
            host.delete_items(timeline, &existing)?;
        }

        let imported = host.import_media(pool, &[srt.to_path_buf()])?;
        let first = imported.first().copied().ok_or_else(|| {
            BridgeError::HostCallFailed("Failed to import SRT to Media Pool.".to_string())
        })?;

        // The track was just cleared, so the clip lands at the timeline start.
        let success = host.append_to_timeline(pool, &[first], track)?;
        log::info!("Appended '{}' to timeline: {}", srt.display(), success);
        Ok(success)
    }

    fn probe(&mut self, target: ProbeTarget) -> Result<ProbePayload, BridgeError> {
        let not_found =
            || BridgeError::HostUnavailable("Target object not found for probing.".to_string());
        let host = self.host.get().ok_or_else(not_found)?;
        let found = match target {
            ProbeTarget::Timeline => host.current_timeline()?.is_some(),
            ProbeTarget::MediaPool => host.media_pool()?.is_some(),
            ProbeTarget::TimelineItem => match host.current_timeline()? {
                Some(timeline) => !host.items_in_track(timeline, Track::video(1))?.is_empty(),
                None => false,
            },
        };
        if !found {
            return Err(not_found());
        }

        Ok(ProbePayload {
            methods: target.methods().iter().map(|m| m.to_string()).collect(),
            properties: host.properties(target)?,
        })
    }
}

fn no_timeline() -> BridgeError {
    BridgeError::HostUnavailable("No active timeline found.".to_string())
}

/// An SRT file handed to the host for import. Dropping it deletes the file.
struct TempSrt {
    path: TempPath,
}

impl TempSrt {
    fn create(dir: &Path, contents: &str) -> Result<Self, BridgeError> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let mut file = tempfile::Builder::new()
            .prefix(&format!("sub_{}_", millis))
            .suffix(".srt")
            .tempfile_in(dir)
            .map_err(|e| {
                BridgeError::io(format!("Failed to create an SRT file in '{}'", dir.display()), e)
            })?;
        let path = file.path().to_path_buf();
        // A partly written file goes away with `file`.
        file.write_all(contents.as_bytes())
            .map_err(|e| BridgeError::io(format!("Failed to write '{}'", path.display()), e))?;
        log::debug!("Wrote {} bytes to '{}'", contents.len(), path.display());
        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the file once `delay` has passed. Failures are ignored.
    fn remove_after(self, delay: Duration) -> Option<JoinHandle<()>> {
        if delay.is_zero() {
            self.remove();
            return None;
        }
        Some(thread::spawn(move || {
            thread::sleep(delay);
            self.remove();
        }))
    }

    fn remove(self) {
        let path = self.path.to_path_buf();
        if let Err(e) = self.path.close() {
            log::debug!("Could not remove '{}': {}", path.display(), e);
        }
    }
}
