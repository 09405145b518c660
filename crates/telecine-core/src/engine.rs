//! Playback engine selection and error recovery
//!
//! The HLS engine itself (segment download, buffering, ABR) is an
//! external capability behind the [`HlsEngine`] trait. This module
//! owns the per-load decision between native playback and the engine,
//! the engine configuration derived from the stream type, and the
//! recovery policy for the engine's fatal error channel.

use crate::types::{CanPlay, StreamType};
use serde::{Deserialize, Serialize};

/// Configuration handed to the engine at creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Verbose engine logging
    pub debug: bool,
    /// Low-latency tuning (part playlists, reduced hold-back)
    pub low_latency: bool,
    /// Tolerance in seconds when matching a position to a fragment
    pub frag_lookup_tolerance: f64,
}

impl EngineConfig {
    /// Derive the engine configuration from the stream type
    pub fn for_stream_type(stream_type: StreamType, debug: bool) -> Self {
        match stream_type {
            StreamType::LlLive => Self {
                debug,
                low_latency: true,
                frag_lookup_tolerance: 0.001,
            },
            StreamType::OnDemand | StreamType::Live => Self {
                debug,
                low_latency: false,
                frag_lookup_tolerance: 0.25,
            },
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::for_stream_type(StreamType::OnDemand, false)
    }
}

/// Engine fatal error categories, as reported on its error channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineErrorKind {
    Network,
    Media,
    Other,
}

/// An error event from the engine's error channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineError {
    pub kind: EngineErrorKind,
    pub fatal: bool,
    pub detail: String,
}

impl EngineError {
    pub fn new(kind: EngineErrorKind, fatal: bool, detail: impl Into<String>) -> Self {
        Self {
            kind,
            fatal,
            detail: detail.into(),
        }
    }
}

/// Recovery action for an engine error event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Fatal network error: retry the current load
    RestartLoad,
    /// Fatal media error: in-place media error recovery
    RecoverMedia,
    /// Unrecoverable: destroy the engine, a full reload is required
    Destroy,
    /// Non-fatal errors are not acted upon
    Ignore,
}

impl Recovery {
    /// Classify an engine error event into a recovery action
    pub fn for_error(error: &EngineError) -> Self {
        if !error.fatal {
            return Recovery::Ignore;
        }
        match error.kind {
            EngineErrorKind::Network => Recovery::RestartLoad,
            EngineErrorKind::Media => Recovery::RecoverMedia,
            EngineErrorKind::Other => Recovery::Destroy,
        }
    }
}

/// Outcome of the per-load playback path decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPath {
    /// Assign the source URL to the native media element
    Native,
    /// Instantiate the engine and delegate playback to it
    Engine,
    /// Neither path available; playback does not proceed
    Unsupported,
}

/// Decide the playback path for a resolved source
///
/// Non-HLS sources always go native. For HLS,
/// `use_native = can_play_native && !(prefer_engine && engine_supported)`.
pub fn select_playback_path(
    is_hls: bool,
    prefer_engine: bool,
    can_play_native: CanPlay,
    engine_supported: bool,
) -> PlaybackPath {
    if !is_hls {
        return PlaybackPath::Native;
    }

    let use_native = can_play_native.is_supported() && !(prefer_engine && engine_supported);
    if use_native {
        PlaybackPath::Native
    } else if engine_supported {
        PlaybackPath::Engine
    } else {
        PlaybackPath::Unsupported
    }
}

/// External HLS streaming engine, owned exclusively by the element
///
/// At most one live instance exists per element; instances are created
/// during load, destroyed during unload, and never reused.
pub trait HlsEngine: Send + Sync {
    /// Begin loading the given source URL
    fn load_source(&mut self, url: &url::Url);

    /// Attach the engine's output to the native media element
    fn attach_media(&mut self);

    /// Detach the engine from the native media element
    fn detach_media(&mut self);

    /// Restart loading of the current source (network error recovery)
    fn start_load(&mut self);

    /// In-place media error recovery
    fn recover_media_error(&mut self);

    /// Tear down the engine; the instance is unusable afterwards
    fn destroy(&mut self);
}

/// Environment capability detection and engine construction
pub trait EngineProvider: Send + Sync {
    /// Whether the engine can run in the current environment
    fn is_supported(&self) -> bool;

    /// Create a fresh engine instance with the given configuration
    fn create(&self, config: EngineConfig) -> Box<dyn HlsEngine>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_for_stream_types() {
        let vod = EngineConfig::for_stream_type(StreamType::OnDemand, false);
        assert!(!vod.low_latency);
        assert_eq!(vod.frag_lookup_tolerance, 0.25);

        let live = EngineConfig::for_stream_type(StreamType::Live, true);
        assert!(live.debug);
        assert!(!live.low_latency);

        let ll = EngineConfig::for_stream_type(StreamType::LlLive, false);
        assert!(ll.low_latency);
        assert_eq!(ll.frag_lookup_tolerance, 0.001);
    }

    #[test]
    fn test_non_hls_always_native() {
        for can_play in [CanPlay::Probably, CanPlay::Maybe, CanPlay::No] {
            assert_eq!(
                select_playback_path(false, true, can_play, true),
                PlaybackPath::Native
            );
        }
    }

    #[test]
    fn test_hls_native_when_capable_and_not_preferring_engine() {
        assert_eq!(
            select_playback_path(true, false, CanPlay::Maybe, true),
            PlaybackPath::Native
        );
    }

    #[test]
    fn test_hls_engine_when_preferred_and_supported() {
        assert_eq!(
            select_playback_path(true, true, CanPlay::Probably, true),
            PlaybackPath::Engine
        );
    }

    #[test]
    fn test_hls_native_when_engine_preferred_but_unsupported() {
        assert_eq!(
            select_playback_path(true, true, CanPlay::Probably, false),
            PlaybackPath::Native
        );
    }

    #[test]
    fn test_hls_engine_when_native_incapable() {
        assert_eq!(
            select_playback_path(true, false, CanPlay::No, true),
            PlaybackPath::Engine
        );
    }

    #[test]
    fn test_hls_unsupported_environment() {
        assert_eq!(
            select_playback_path(true, false, CanPlay::No, false),
            PlaybackPath::Unsupported
        );
    }

    #[test]
    fn test_recovery_policy() {
        let net = EngineError::new(EngineErrorKind::Network, true, "manifest timeout");
        assert_eq!(Recovery::for_error(&net), Recovery::RestartLoad);

        let media = EngineError::new(EngineErrorKind::Media, true, "buffer append failed");
        assert_eq!(Recovery::for_error(&media), Recovery::RecoverMedia);

        let other = EngineError::new(EngineErrorKind::Other, true, "mux error");
        assert_eq!(Recovery::for_error(&other), Recovery::Destroy);

        let non_fatal = EngineError::new(EngineErrorKind::Network, false, "fragment retry");
        assert_eq!(Recovery::for_error(&non_fatal), Recovery::Ignore);
    }
}
