//! A scripted host for exercising the bridge without a running application.

use super::*;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug)]
pub struct FakeState {
    pub timeline: bool,
    pub media_pool: bool,
    pub frame_rate: SettingValue,
    pub start_frame: i64,
    /// Subtitle track that holds `subtitles`; every other one is empty.
    pub subtitle_track: usize,
    pub subtitles: Vec<TimelineItem>,
    pub video: Vec<TimelineItem>,
    pub imported: Vec<MediaItemId>,
    pub append_result: bool,
    /// Host call that fails with `HostCallFailed`.
    pub fail_on: Option<&'static str>,
    pub calls: Vec<String>,
    pub deleted: Vec<ItemId>,
    pub appended_to: Vec<Track>,
    /// Contents of every imported file at import time.
    pub imported_text: Vec<String>,
    pub imported_paths: Vec<PathBuf>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            timeline: true,
            media_pool: true,
            frame_rate: SettingValue::Number(24.0),
            start_frame: 0,
            subtitle_track: 1,
            subtitles: Vec::new(),
            video: Vec::new(),
            imported: vec![MediaItemId(1)],
            append_result: true,
            fail_on: None,
            calls: Vec::new(),
            deleted: Vec::new(),
            appended_to: Vec::new(),
            imported_text: Vec::new(),
            imported_paths: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeHost {
    state: Rc<RefCell<FakeState>>,
}

impl FakeHost {
    pub fn with(configure: impl FnOnce(&mut FakeState)) -> Self {
        let host = Self::default();
        configure(&mut host.state.borrow_mut());
        host
    }

    pub fn state(&self) -> std::cell::Ref<'_, FakeState> {
        self.state.borrow()
    }

    fn call(&self, name: &'static str) -> Result<(), BridgeError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(name.to_string());
        if state.fail_on == Some(name) {
            return Err(BridgeError::HostCallFailed(format!("{} exploded", name)));
        }
        Ok(())
    }
}

pub fn subtitle(id: u64, name: &str, start: i64, end: i64) -> TimelineItem {
    TimelineItem {
        id: ItemId(id),
        name: name.to_string(),
        start,
        end,
    }
}

impl Host for FakeHost {
    fn current_timeline(&mut self) -> Result<Option<TimelineRef>, BridgeError> {
        self.call("current_timeline")?;
        Ok(self.state.borrow().timeline.then_some(TimelineRef(1)))
    }

    fn media_pool(&mut self) -> Result<Option<MediaPoolRef>, BridgeError> {
        self.call("media_pool")?;
        Ok(self.state.borrow().media_pool.then_some(MediaPoolRef(1)))
    }

    fn frame_rate_setting(&mut self) -> Result<SettingValue, BridgeError> {
        self.call("frame_rate_setting")?;
        Ok(self.state.borrow().frame_rate.clone())
    }

    fn start_frame(&mut self, _timeline: TimelineRef) -> Result<i64, BridgeError> {
        self.call("start_frame")?;
        Ok(self.state.borrow().start_frame)
    }

    fn items_in_track(
        &mut self,
        _timeline: TimelineRef,
        track: Track,
    ) -> Result<Vec<TimelineItem>, BridgeError> {
        self.call("items_in_track")?;
        let state = self.state.borrow();
        Ok(match (track.kind, track.index) {
            (TrackKind::Subtitle, i) if i == state.subtitle_track => state.subtitles.clone(),
            (TrackKind::Video, 1) => state.video.clone(),
            _ => Vec::new(),
        })
    }

    fn delete_items(
        &mut self,
        _timeline: TimelineRef,
        items: &[ItemId],
    ) -> Result<bool, BridgeError> {
        self.call("delete_items")?;
        let mut state = self.state.borrow_mut();
        state.deleted.extend_from_slice(items);
        state.subtitles.retain(|item| !items.contains(&item.id));
        Ok(true)
    }

    fn import_media(
        &mut self,
        _pool: MediaPoolRef,
        paths: &[PathBuf],
    ) -> Result<Vec<MediaItemId>, BridgeError> {
        self.call("import_media")?;
        let mut state = self.state.borrow_mut();
        for path in paths {
            let text = std::fs::read_to_string(path)
                .map_err(|e| BridgeError::io("Fake import", e))?;
            state.imported_text.push(text);
            state.imported_paths.push(path.clone());
        }
        Ok(state.imported.clone())
    }

    fn append_to_timeline(
        &mut self,
        _pool: MediaPoolRef,
        _items: &[MediaItemId],
        track: Track,
    ) -> Result<bool, BridgeError> {
        self.call("append_to_timeline")?;
        let mut state = self.state.borrow_mut();
        state.appended_to.push(track);
        Ok(state.append_result)
    }

    fn properties(&mut self, target: ProbeTarget) -> Result<Vec<String>, BridgeError> {
        self.call("properties")?;
        Ok(vec![format!("{}Kind", target)])
    }
}

pub struct FakeConnector {
    host: FakeHost,
    declines: u32,
    initialize_calls: Rc<Cell<u32>>,
}

impl FakeConnector {
    pub fn new(host: FakeHost) -> Self {
        Self {
            host,
            declines: 0,
            initialize_calls: Rc::new(Cell::new(0)),
        }
    }

    /// Declines the next `count` initialization attempts.
    pub fn fail_initialize(&mut self, count: u32) {
        self.declines = count;
    }

    pub fn initialize_calls(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.initialize_calls)
    }
}

impl Connector for FakeConnector {
    type Host = FakeHost;

    fn initialize(&mut self, _plugin_id: &str) -> Result<bool, BridgeError> {
        self.initialize_calls.set(self.initialize_calls.get() + 1);
        if self.declines > 0 {
            self.declines -= 1;
            return Ok(false);
        }
        Ok(true)
    }

    fn connect(&mut self) -> Result<Option<FakeHost>, BridgeError> {
        Ok(Some(self.host.clone()))
    }
}
