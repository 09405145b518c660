//! Core types for the Telecine video element

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Unique identifier for a player element instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// HLS MIME type, the only type the alternate engine handles
pub const MIME_HLS: &str = "application/vnd.apple.mpegurl";

/// Classification of the media asset, affecting engine tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StreamType {
    /// Video on demand
    OnDemand,
    /// Live stream
    Live,
    /// Low-latency live stream
    LlLive,
}

impl StreamType {
    /// Attribute value for this stream type
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamType::OnDemand => "on-demand",
            StreamType::Live => "live",
            StreamType::LlLive => "ll-live",
        }
    }

    /// Parse an attribute value; unknown values fall back to on-demand
    pub fn from_attr(value: Option<&str>) -> Self {
        match value {
            Some("live") => StreamType::Live,
            Some("ll-live") => StreamType::LlLive,
            _ => StreamType::OnDemand,
        }
    }
}

impl Default for StreamType {
    fn default() -> Self {
        StreamType::OnDemand
    }
}

impl std::fmt::Display for StreamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Browser-reported ability to play a MIME type, mirroring the
/// three-valued `canPlayType` contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanPlay {
    Probably,
    Maybe,
    No,
}

impl CanPlay {
    /// True when native playback is worth attempting
    pub fn is_supported(&self) -> bool {
        !matches!(self, CanPlay::No)
    }
}

/// Canonical media source derived from the element's attributes
///
/// A descriptor exists iff `src` or `playback-id` is set. An empty
/// `mime_type` means "unknown", not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSourceDescriptor {
    pub url: Url,
    pub mime_type: String,
}

impl MediaSourceDescriptor {
    /// True when the alternate HLS engine is a candidate for this source
    pub fn is_hls(&self) -> bool {
        self.mime_type == MIME_HLS
    }
}

/// Time-indexed marker with an opaque payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuePoint {
    /// Position in seconds, >= 0
    pub time: f64,
    /// Opaque payload delivered with the change notification
    pub value: serde_json::Value,
}

impl CuePoint {
    pub fn new(time: f64, value: impl Into<serde_json::Value>) -> Self {
        Self {
            time,
            value: value.into(),
        }
    }
}
