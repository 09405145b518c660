//! Playback analytics bridge
//!
//! The beacon library is an external capability behind the
//! [`PlaybackMonitor`] trait. This module assembles the monitor
//! options on load: metadata merged from the programmatic object and
//! attribute-derived fields (attributes win), the player init time
//! recorded once at element construction, and the tracking key that
//! gates monitor creation entirely.

use crate::attrs::{names, AttributeStore};
use crate::source::split_playback_id;
use crate::types::PlayerId;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Options the monitor is initialized with
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    /// Tracking key; without one no monitor is created
    pub env_key: String,
    /// Override for the beacon collection domain
    pub beacon_domain: Option<String>,
    /// Verbose monitor logging
    pub debug: bool,
    /// Merged metadata snapshot taken at load time
    pub metadata: Map<String, Value>,
    /// Stable per-element instance id
    pub player_id: PlayerId,
    /// Recorded once at element construction, stable across reloads
    pub player_init_time: DateTime<Utc>,
    /// Whether an engine instance is active for this load
    pub engine_attached: bool,
}

/// External analytics monitor attached to the native media element
pub trait PlaybackMonitor: Send + Sync {
    /// Emit a named event with a payload
    fn emit(&mut self, event: &str, payload: Value);

    /// Destroy the monitor and detach it from the media element
    fn destroy(&mut self);
}

/// Monitor construction, gated on a tracking key being present
pub trait MonitorProvider: Send + Sync {
    fn monitor(&self, options: MonitorOptions) -> Box<dyn PlaybackMonitor>;
}

/// Merge metadata for a load, in increasing priority:
/// programmatic object, then attribute-derived fields. `video_id`
/// falls back to the playback identifier (id segment only) when not
/// supplied by either source.
pub fn assemble_metadata(
    programmatic: &Map<String, Value>,
    store: &AttributeStore,
) -> Map<String, Value> {
    let mut merged = programmatic.clone();
    for (field, value) in store.metadata_fields() {
        merged.insert(field, value);
    }

    if !merged.contains_key("video_id") {
        if let Some(playback_id) = store.get(names::PLAYBACK_ID) {
            let (id, _) = split_playback_id(playback_id);
            merged.insert("video_id".to_string(), Value::String(id.to_string()));
        }
    }

    merged
}
