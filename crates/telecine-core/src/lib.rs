//! Telecine Core - HLS-capable video element core
//!
//! This crate provides the orchestration behind an HLS-capable video
//! element:
//! - Attribute reflection with a single-source-of-truth store
//! - Source resolution (playback-id shorthand, MIME inference)
//! - Native-vs-engine playback selection with error recovery
//! - Playback analytics monitor initialization and heartbeats
//! - Load/unload lifecycle driven by attribute changes
//! - Cue point tracking with change notifications
//!
//! The streaming engine, the analytics beacon library and the native
//! media element are host-provided capabilities behind traits.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      Telecine Core                         │
//! ├────────────────────────────────────────────────────────────┤
//! │                                                            │
//! │  ┌────────────┐   ┌────────────┐   ┌────────────┐          │
//! │  │ Attribute  │   │   Source   │   │  Cue Point │          │
//! │  │   Store    │   │ Resolution │   │  Tracker   │          │
//! │  └─────┬──────┘   └─────┬──────┘   └─────┬──────┘          │
//! │        │                │                │                 │
//! │        └────────────────┼────────────────┘                 │
//! │                         │                                  │
//! │                  ┌──────┴──────┐                           │
//! │                  │    Video    │                           │
//! │                  │   Element   │                           │
//! │                  └──────┬──────┘                           │
//! │                         │                                  │
//! │  ┌────────────┐  ┌──────┴──────┐  ┌────────────┐           │
//! │  │   Engine   │  │    Event    │  │  Analytics │           │
//! │  │  Selector  │  │  Dispatch   │  │   Bridge   │           │
//! │  └────────────┘  └─────────────┘  └────────────┘           │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod analytics;
pub mod attrs;
pub mod cuepoints;
pub mod element;
pub mod engine;
pub mod error;
pub mod events;
pub mod media;
pub mod registry;
pub mod source;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod types;

pub use analytics::{assemble_metadata, MonitorOptions, MonitorProvider, PlaybackMonitor};
pub use attrs::{AttributeChange, AttributeStore};
pub use cuepoints::CuePointTracker;
pub use element::{source_transition, SourceTransition, VideoElement};
pub use engine::{
    select_playback_path, EngineConfig, EngineError, EngineErrorKind, EngineProvider, HlsEngine,
    PlaybackPath, Recovery,
};
pub use error::{Error, Result};
pub use events::{ElementEvent, EventDispatcher, MediaEventKind};
pub use media::MediaElement;
pub use source::{resolve_source, split_playback_id, stream_url, STREAM_HOST};
pub use types::{CanPlay, CuePoint, MediaSourceDescriptor, PlayerId, StreamType, MIME_HLS};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library: registers the element tag once per process
pub fn init() {
    if registry::define(registry::ELEMENT_TAG) {
        tracing::info!(version = VERSION, tag = registry::ELEMENT_TAG, "Telecine Core initialized");
    }
}
