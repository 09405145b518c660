//! Test doubles for the host capability seams
//!
//! Hosts embedding the element provide real implementations of
//! [`MediaElement`], [`EngineProvider`] and [`MonitorProvider`]; these
//! stubs record every interaction so element behavior can be asserted
//! without a browser environment. Available behind the `test-utils`
//! feature for downstream integration tests.

use crate::analytics::{MonitorOptions, MonitorProvider, PlaybackMonitor};
use crate::engine::{EngineConfig, EngineProvider, HlsEngine};
use crate::media::MediaElement;
use crate::types::CanPlay;
use crate::{Error, Result};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use url::Url;

// -----------------------------------------------------------------
// Media element stub
// -----------------------------------------------------------------

#[derive(Debug, Default)]
struct StubMediaState {
    source: Option<Url>,
    current_time: f64,
    playing: bool,
    reject_play: bool,
}

/// Recording stand-in for the native media element
#[derive(Debug, Clone)]
pub struct StubMedia {
    can_play: CanPlay,
    state: Arc<Mutex<StubMediaState>>,
}

impl StubMedia {
    pub fn new(can_play: CanPlay) -> Self {
        Self {
            can_play,
            state: Arc::new(Mutex::new(StubMediaState::default())),
        }
    }

    /// Currently assigned native source, if any
    pub fn source(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .source
            .as_ref()
            .map(|u| u.to_string())
    }

    /// Drive the playback clock from a test
    pub fn set_current_time(&self, time: f64) {
        self.state.lock().unwrap().current_time = time;
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().unwrap().playing
    }

    /// Make subsequent play calls fail, like an autoplay policy would
    pub fn reject_play(&self) {
        self.state.lock().unwrap().reject_play = true;
    }
}

impl MediaElement for StubMedia {
    fn can_play_type(&self, _mime_type: &str) -> CanPlay {
        self.can_play
    }

    fn set_source(&mut self, url: &Url) {
        self.state.lock().unwrap().source = Some(url.clone());
    }

    fn clear_source(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.source = None;
        state.playing = false;
    }

    fn current_time(&self) -> f64 {
        self.state.lock().unwrap().current_time
    }

    fn play(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.reject_play {
            return Err(Error::PlayRejected("blocked by autoplay policy".into()));
        }
        state.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.state.lock().unwrap().playing = false;
    }
}

// -----------------------------------------------------------------
// Engine stubs
// -----------------------------------------------------------------

#[derive(Debug, Default)]
struct StubEngineState {
    created: usize,
    configs: Vec<EngineConfig>,
    calls: Vec<String>,
    loaded_urls: Vec<Url>,
}

/// Engine provider whose engines record every trait call
#[derive(Debug, Clone)]
pub struct StubEngineProvider {
    supported: bool,
    state: Arc<Mutex<StubEngineState>>,
}

impl StubEngineProvider {
    pub fn new(supported: bool) -> Self {
        Self {
            supported,
            state: Arc::new(Mutex::new(StubEngineState::default())),
        }
    }

    /// Number of engine instances created so far
    pub fn created_count(&self) -> usize {
        self.state.lock().unwrap().created
    }

    /// Number of `destroy` calls across all instances
    pub fn destroyed_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| *c == "destroy")
            .count()
    }

    /// Flat call log across all instances, in order
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Configurations the engines were created with
    pub fn configs(&self) -> Vec<EngineConfig> {
        self.state.lock().unwrap().configs.clone()
    }

    /// URLs passed to `load_source`, in order
    pub fn loaded_urls(&self) -> Vec<Url> {
        self.state.lock().unwrap().loaded_urls.clone()
    }
}

impl EngineProvider for StubEngineProvider {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn create(&self, config: EngineConfig) -> Box<dyn HlsEngine> {
        let mut state = self.state.lock().unwrap();
        state.created += 1;
        state.configs.push(config);
        Box::new(StubEngine {
            state: Arc::clone(&self.state),
        })
    }
}

struct StubEngine {
    state: Arc<Mutex<StubEngineState>>,
}

impl StubEngine {
    fn record(&self, call: &str) {
        self.state.lock().unwrap().calls.push(call.to_string());
    }
}

impl HlsEngine for StubEngine {
    fn load_source(&mut self, url: &Url) {
        let mut state = self.state.lock().unwrap();
        state.calls.push("load_source".to_string());
        state.loaded_urls.push(url.clone());
    }

    fn attach_media(&mut self) {
        self.record("attach_media");
    }

    fn detach_media(&mut self) {
        self.record("detach_media");
    }

    fn start_load(&mut self) {
        self.record("start_load");
    }

    fn recover_media_error(&mut self) {
        self.record("recover_media_error");
    }

    fn destroy(&mut self) {
        self.record("destroy");
    }
}

// -----------------------------------------------------------------
// Monitor stubs
// -----------------------------------------------------------------

#[derive(Debug, Default)]
struct StubMonitorState {
    options: Vec<MonitorOptions>,
    emitted: Vec<(String, Value)>,
    destroyed: usize,
}

/// Monitor provider recording options and emitted events
#[derive(Debug, Clone)]
pub struct StubMonitorProvider {
    state: Arc<Mutex<StubMonitorState>>,
}

impl StubMonitorProvider {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StubMonitorState::default())),
        }
    }

    /// Options the most recent monitor was initialized with
    pub fn last_options(&self) -> Option<MonitorOptions> {
        self.state.lock().unwrap().options.last().cloned()
    }

    /// Events emitted across all monitor instances
    pub fn emitted(&self) -> Vec<(String, Value)> {
        self.state.lock().unwrap().emitted.clone()
    }

    /// Number of `destroy` calls across all instances
    pub fn destroyed_count(&self) -> usize {
        self.state.lock().unwrap().destroyed
    }
}

impl Default for StubMonitorProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorProvider for StubMonitorProvider {
    fn monitor(&self, options: MonitorOptions) -> Box<dyn PlaybackMonitor> {
        self.state.lock().unwrap().options.push(options);
        Box::new(StubMonitor {
            state: Arc::clone(&self.state),
        })
    }
}

struct StubMonitor {
    state: Arc<Mutex<StubMonitorState>>,
}

impl PlaybackMonitor for StubMonitor {
    fn emit(&mut self, event: &str, payload: Value) {
        self.state
            .lock()
            .unwrap()
            .emitted
            .push((event.to_string(), payload));
    }

    fn destroy(&mut self) {
        self.state.lock().unwrap().destroyed += 1;
    }
}
