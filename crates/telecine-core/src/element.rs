//! Video element orchestrator
//!
//! Coordinates:
//! - Attribute changes and typed property views
//! - Source resolution and load/unload lifecycle transitions
//! - Playback engine selection and engine error recovery
//! - Analytics monitor initialization and heartbeats
//! - Cue point tracking and change notifications

use crate::{
    analytics::{assemble_metadata, MonitorOptions, MonitorProvider, PlaybackMonitor},
    attrs::{names, AttributeChange, AttributeStore},
    cuepoints::CuePointTracker,
    engine::{
        select_playback_path, EngineConfig, EngineError, EngineProvider, HlsEngine, PlaybackPath,
        Recovery,
    },
    error::Error,
    events::{ElementEvent, EventDispatcher, MediaEventKind},
    media::MediaElement,
    source::resolve_source,
    types::{CuePoint, PlayerId, StreamType},
    Result,
};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, instrument, warn};

/// Transition produced by an effective-source change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTransition {
    /// Source unchanged, nothing to do
    None,
    /// No source -> source present
    Load,
    /// Source present -> no source
    Unload,
    /// Source replaced: full teardown then rebuild
    Reload,
}

/// Pure transition function over (old, new) effective source
pub fn source_transition(old: Option<&str>, new: Option<&str>) -> SourceTransition {
    match (old, new) {
        (None, None) => SourceTransition::None,
        (None, Some(_)) => SourceTransition::Load,
        (Some(_), None) => SourceTransition::Unload,
        (Some(old), Some(new)) if old == new => SourceTransition::None,
        (Some(_), Some(_)) => SourceTransition::Reload,
    }
}

/// HLS-capable video element core
///
/// Owns the engine instance and the analytics monitor exclusively;
/// both are created during load and destroyed during unload, never
/// reused across loads. Lifecycle transitions run synchronously
/// within the triggering call; metadata-url fetches run as spawned
/// tasks and assign the metadata object on completion.
pub struct VideoElement {
    /// Self-handle for spawned background work
    weak_self: Weak<VideoElement>,
    /// Stable per-instance id, handed to the analytics monitor
    id: PlayerId,
    /// Recorded once at construction, stable across reloads
    init_time: DateTime<Utc>,
    /// Attribute store, the single source of truth for configuration
    attrs: RwLock<AttributeStore>,
    /// Native media element surface
    media: RwLock<Box<dyn MediaElement>>,
    /// Engine capability detection and construction
    engines: Arc<dyn EngineProvider>,
    /// Monitor construction
    monitors: Arc<dyn MonitorProvider>,
    /// Live engine instance, at most one
    engine: RwLock<Option<Box<dyn HlsEngine>>>,
    /// Live analytics monitor
    monitor: RwLock<Option<Box<dyn PlaybackMonitor>>>,
    /// Programmatic metadata object
    metadata: RwLock<Map<String, Value>>,
    /// Cue point list and active cue
    cue_points: RwLock<CuePointTracker>,
    /// Loaded/Unloaded lifecycle state
    loaded: RwLock<bool>,
    /// Whether the element is connected to the document
    connected: RwLock<bool>,
    /// Element event broadcaster
    events: EventDispatcher,
    /// Client for metadata-url fetches
    http: reqwest::Client,
}

impl VideoElement {
    /// Create an element bound to a native media element and the
    /// engine/monitor capability providers
    ///
    /// Returns an `Arc`: attribute writes can spawn background work
    /// (metadata-url fetches) that holds a handle to the element.
    pub fn new(
        media: Box<dyn MediaElement>,
        engines: Arc<dyn EngineProvider>,
        monitors: Arc<dyn MonitorProvider>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            weak_self: weak_self.clone(),
            id: PlayerId::new(),
            init_time: Utc::now(),
            attrs: RwLock::new(AttributeStore::new()),
            media: RwLock::new(media),
            engines,
            monitors,
            engine: RwLock::new(None),
            monitor: RwLock::new(None),
            metadata: RwLock::new(Map::new()),
            cue_points: RwLock::new(CuePointTracker::new()),
            loaded: RwLock::new(false),
            connected: RwLock::new(false),
            events: EventDispatcher::new(),
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
        })
    }

    /// Stable element instance id
    pub fn player_id(&self) -> PlayerId {
        self.id
    }

    /// Construction timestamp handed to the monitor on every load
    pub fn init_time(&self) -> DateTime<Utc> {
        self.init_time
    }

    /// Subscribe to element events
    pub fn subscribe(&self) -> broadcast::Receiver<ElementEvent> {
        self.events.subscribe()
    }

    // -------------------------------------------------------------
    // Attributes and properties
    // -------------------------------------------------------------

    /// Read an attribute value
    pub async fn get_attribute(&self, name: &str) -> Option<String> {
        self.attrs.read().await.get(name).map(str::to_string)
    }

    /// Write an attribute; a write of the current value is a no-op
    pub async fn set_attribute(&self, name: &str, value: &str) {
        let (change, old_source, new_source) = {
            let mut attrs = self.attrs.write().await;
            let old_source = effective_source(&attrs);
            let Some(change) = attrs.set(name, value) else {
                return;
            };
            let new_source = effective_source(&attrs);
            (change, old_source, new_source)
        };
        self.attribute_changed(&change, old_source, new_source)
            .await;
    }

    /// Remove an attribute; removing an absent attribute is a no-op
    pub async fn remove_attribute(&self, name: &str) {
        let (change, old_source, new_source) = {
            let mut attrs = self.attrs.write().await;
            let old_source = effective_source(&attrs);
            let Some(change) = attrs.remove(name) else {
                return;
            };
            let new_source = effective_source(&attrs);
            (change, old_source, new_source)
        };
        self.attribute_changed(&change, old_source, new_source)
            .await;
    }

    /// Boolean attribute write: true writes "", false removes
    pub async fn set_bool_attribute(&self, name: &str, value: bool) {
        let (change, old_source, new_source) = {
            let mut attrs = self.attrs.write().await;
            let old_source = effective_source(&attrs);
            let Some(change) = attrs.set_bool(name, value) else {
                return;
            };
            let new_source = effective_source(&attrs);
            (change, old_source, new_source)
        };
        self.attribute_changed(&change, old_source, new_source)
            .await;
    }

    /// Boolean attribute view
    pub async fn get_bool_attribute(&self, name: &str) -> bool {
        self.attrs.read().await.get_bool(name)
    }

    pub async fn src(&self) -> Option<String> {
        self.get_attribute(names::SRC).await
    }

    pub async fn set_src(&self, src: Option<&str>) {
        match src {
            Some(src) => self.set_attribute(names::SRC, src).await,
            None => self.remove_attribute(names::SRC).await,
        }
    }

    pub async fn playback_id(&self) -> Option<String> {
        self.get_attribute(names::PLAYBACK_ID).await
    }

    pub async fn set_playback_id(&self, playback_id: Option<&str>) {
        match playback_id {
            Some(id) => self.set_attribute(names::PLAYBACK_ID, id).await,
            None => self.remove_attribute(names::PLAYBACK_ID).await,
        }
    }

    pub async fn stream_type(&self) -> StreamType {
        StreamType::from_attr(self.attrs.read().await.get(names::STREAM_TYPE))
    }

    pub async fn set_stream_type(&self, stream_type: StreamType) {
        self.set_attribute(names::STREAM_TYPE, stream_type.as_str())
            .await;
    }

    pub async fn debug(&self) -> bool {
        self.get_bool_attribute(names::DEBUG).await
    }

    pub async fn set_debug(&self, debug: bool) {
        self.set_bool_attribute(names::DEBUG, debug).await;
    }

    /// Prefer the alternate engine over capable native playback
    pub async fn prefer_engine(&self) -> bool {
        self.get_bool_attribute(names::PREFER_PLAYBACK).await
    }

    pub async fn set_prefer_engine(&self, prefer: bool) {
        self.set_bool_attribute(names::PREFER_PLAYBACK, prefer).await;
    }

    pub async fn env_key(&self) -> Option<String> {
        self.get_attribute(names::ENV_KEY).await
    }

    pub async fn set_env_key(&self, env_key: Option<&str>) {
        match env_key {
            Some(key) => self.set_attribute(names::ENV_KEY, key).await,
            None => self.remove_attribute(names::ENV_KEY).await,
        }
    }

    pub async fn max_resolution(&self) -> Option<String> {
        self.get_attribute(names::MAX_RESOLUTION).await
    }

    pub async fn set_max_resolution(&self, max: Option<&str>) {
        match max {
            Some(max) => self.set_attribute(names::MAX_RESOLUTION, max).await,
            None => self.remove_attribute(names::MAX_RESOLUTION).await,
        }
    }

    // -------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------

    async fn attribute_changed(
        &self,
        change: &AttributeChange,
        old_source: Option<String>,
        new_source: Option<String>,
    ) {
        debug!(name = %change.name, new = ?change.new, "attribute changed");

        match source_transition(old_source.as_deref(), new_source.as_deref()) {
            SourceTransition::None => {}
            SourceTransition::Load => {
                if *self.connected.read().await {
                    self.load().await;
                }
            }
            SourceTransition::Unload => self.unload().await,
            SourceTransition::Reload => {
                self.unload().await;
                if *self.connected.read().await {
                    self.load().await;
                }
            }
        }

        if change.name == names::METADATA_URL && change.new.is_some() {
            // the fetch completes off the attribute-change path
            if let Some(element) = self.weak_self.upgrade() {
                tokio::spawn(async move { element.load_metadata_from_url().await });
            }
        }
    }

    /// Connection to the document; loads when a source was set before
    /// connection and therefore produced no load transition
    pub async fn connected(&self) {
        *self.connected.write().await = true;
        let has_source = effective_source(&*self.attrs.read().await).is_some();
        if has_source && !*self.loaded.read().await {
            self.load().await;
        }
    }

    /// Disconnection always unloads, regardless of current state
    pub async fn disconnected(&self) {
        *self.connected.write().await = false;
        self.unload().await;
    }

    /// Set up playback for the currently resolved source
    ///
    /// Setup failures (missing source, unsupported environment) are
    /// logged, never raised; the element stays unloaded.
    #[instrument(skip(self), fields(player_id = %self.id))]
    pub async fn load(&self) {
        if *self.loaded.read().await {
            self.unload().await;
        }

        let (descriptor, prefer_engine, debug, stream_type, env_key) = {
            let attrs = self.attrs.read().await;
            (
                resolve_source(&attrs),
                attrs.get_bool(names::PREFER_PLAYBACK),
                attrs.get_bool(names::DEBUG),
                StreamType::from_attr(attrs.get(names::STREAM_TYPE)),
                attrs.get(names::ENV_KEY).map(str::to_string),
            )
        };

        let Some(descriptor) = descriptor else {
            warn!(code = Error::MissingSource.error_code(), "load aborted: no playback source");
            return;
        };

        let engine_supported = self.engines.is_supported();
        let can_play = self
            .media
            .read()
            .await
            .can_play_type(&descriptor.mime_type);

        match select_playback_path(descriptor.is_hls(), prefer_engine, can_play, engine_supported) {
            PlaybackPath::Native => {
                debug!(url = %descriptor.url, "native playback");
                self.media.write().await.set_source(&descriptor.url);
            }
            PlaybackPath::Engine => {
                let config = EngineConfig::for_stream_type(stream_type, debug);
                debug!(url = %descriptor.url, ?config, "engine playback");
                let mut engine = self.engines.create(config);
                // load-source before attach-media, in that order
                engine.load_source(&descriptor.url);
                engine.attach_media();
                *self.engine.write().await = Some(engine);
            }
            PlaybackPath::Unsupported => {
                let err = Error::UnsupportedEnvironment {
                    mime_type: descriptor.mime_type.clone(),
                };
                error!(code = err.error_code(), %err, "load aborted");
                return;
            }
        }

        if let Some(env_key) = env_key {
            let options = {
                let attrs = self.attrs.read().await;
                let metadata = assemble_metadata(&*self.metadata.read().await, &attrs);
                MonitorOptions {
                    env_key,
                    beacon_domain: attrs.get(names::BEACON_DOMAIN).map(str::to_string),
                    debug,
                    metadata,
                    player_id: self.id,
                    player_init_time: self.init_time,
                    engine_attached: self.engine.read().await.is_some(),
                }
            };
            *self.monitor.write().await = Some(self.monitors.monitor(options));
        }

        *self.loaded.write().await = true;
        info!(url = %descriptor.url, mime_type = %descriptor.mime_type, "loaded");
    }

    /// Tear down the current playback session
    ///
    /// Idempotent: unloading an unloaded element is a no-op.
    #[instrument(skip(self), fields(player_id = %self.id))]
    pub async fn unload(&self) {
        if let Some(mut engine) = self.engine.write().await.take() {
            engine.detach_media();
            engine.destroy();
        }
        if let Some(mut monitor) = self.monitor.write().await.take() {
            monitor.destroy();
        }

        self.media.write().await.clear_source();
        self.cue_points.write().await.reset();

        let mut loaded = self.loaded.write().await;
        if *loaded {
            *loaded = false;
            info!("unloaded");
        }
    }

    /// Current lifecycle state
    pub async fn is_loaded(&self) -> bool {
        *self.loaded.read().await
    }

    /// Whether an engine instance is active for the current load
    pub async fn engine_attached(&self) -> bool {
        self.engine.read().await.is_some()
    }

    /// Whether an analytics monitor is active for the current load
    pub async fn monitor_attached(&self) -> bool {
        self.monitor.read().await.is_some()
    }

    // -------------------------------------------------------------
    // Media events and playback
    // -------------------------------------------------------------

    /// Ingest a native media event: forwarded on the element's event
    /// channel, with time updates driving the cue point tracker
    pub async fn handle_media_event(&self, kind: MediaEventKind) {
        self.events.dispatch(ElementEvent::Media(kind));

        if kind == MediaEventKind::TimeUpdate {
            let time = self.media.read().await.current_time();
            let change = self.cue_points.write().await.advance(time);
            if let Some(new_active) = change {
                debug!(time, active = ?new_active, "active cue point changed");
                self.events.dispatch(ElementEvent::CuePointChange(new_active));
            }
        }
    }

    /// Ingest an engine error event and apply the recovery policy
    ///
    /// Hosts wire the engine's error channel to this method.
    pub async fn handle_engine_error(&self, engine_error: EngineError) {
        match Recovery::for_error(&engine_error) {
            Recovery::Ignore => {
                debug!(?engine_error, "non-fatal engine error ignored");
            }
            Recovery::RestartLoad => {
                let err = Error::EngineNetwork(engine_error.detail.clone());
                warn!(code = err.error_code(), %err, "restarting load");
                if let Some(engine) = self.engine.write().await.as_mut() {
                    engine.start_load();
                }
            }
            Recovery::RecoverMedia => {
                let err = Error::EngineMedia(engine_error.detail.clone());
                warn!(code = err.error_code(), %err, "attempting media recovery");
                if let Some(engine) = self.engine.write().await.as_mut() {
                    engine.recover_media_error();
                }
            }
            Recovery::Destroy => {
                let err = Error::EngineFatal(engine_error.detail.clone());
                error!(code = err.error_code(), %err, "unrecoverable engine error");
                if let Some(mut engine) = self.engine.write().await.take() {
                    engine.destroy();
                }
            }
        }
    }

    /// Forwarded native play; rejections surface unchanged
    pub async fn play(&self) -> Result<()> {
        self.media.write().await.play()
    }

    /// Forwarded native pause
    pub async fn pause(&self) {
        self.media.write().await.pause();
    }

    // -------------------------------------------------------------
    // Cue points
    // -------------------------------------------------------------

    /// Replace the cue point collection; resolves with the resulting
    /// list. The active cue is recomputed on the next time update.
    pub async fn add_cue_points(&self, points: Vec<CuePoint>) -> Vec<CuePoint> {
        let mut tracker = self.cue_points.write().await;
        tracker.replace(points);
        tracker.points().to_vec()
    }

    /// Current cue point collection
    pub async fn cue_points(&self) -> Vec<CuePoint> {
        self.cue_points.read().await.points().to_vec()
    }

    /// Currently active cue point
    pub async fn active_cue_point(&self) -> Option<CuePoint> {
        self.cue_points.read().await.active().cloned()
    }

    // -------------------------------------------------------------
    // Metadata
    // -------------------------------------------------------------

    /// Programmatic metadata object
    pub async fn metadata(&self) -> Map<String, Value> {
        self.metadata.read().await.clone()
    }

    /// Set the programmatic metadata object
    ///
    /// Forwarded live as a heartbeat when a monitor is active;
    /// otherwise retained for the next load.
    pub async fn set_metadata(&self, metadata: Map<String, Value>) {
        *self.metadata.write().await = metadata.clone();
        if let Some(monitor) = self.monitor.write().await.as_mut() {
            monitor.emit("hb", Value::Object(metadata));
        }
    }

    /// Fetch the `metadata-url` attribute target and assign the JSON
    /// body as the metadata object
    ///
    /// Failures are logged and leave the metadata unchanged.
    /// Overlapping fetches are not serialized: the most recently
    /// completing fetch wins, regardless of request order.
    pub async fn load_metadata_from_url(&self) {
        let Some(url) = self.get_attribute(names::METADATA_URL).await else {
            return;
        };

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(source) => {
                let err = Error::MetadataFetch { url, source };
                warn!(code = err.error_code(), %err, "metadata unchanged");
                return;
            }
        };

        match response.json::<Value>().await {
            Ok(Value::Object(metadata)) => self.set_metadata(metadata).await,
            Ok(other) => {
                let err = Error::MetadataParse(format!("expected object, got {other}"));
                warn!(code = err.error_code(), %err, "metadata unchanged");
            }
            Err(parse) => {
                let err = Error::MetadataParse(parse.to_string());
                warn!(code = err.error_code(), %err, "metadata unchanged");
            }
        }
    }
}

/// Effective source URL for lifecycle comparisons
fn effective_source(attrs: &AttributeStore) -> Option<String> {
    resolve_source(attrs).map(|descriptor| descriptor.url.to_string())
}
