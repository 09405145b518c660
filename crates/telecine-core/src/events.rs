//! Element event dispatch
//!
//! Standard media events forwarded from the native media element plus
//! the `cuepointchange` notification, delivered on a broadcast
//! channel. Dispatch is non-blocking and tolerates having no
//! subscribers.

use crate::types::CuePoint;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Standard media event vocabulary forwarded from the host element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaEventKind {
    LoadStart,
    LoadedMetadata,
    LoadedData,
    CanPlay,
    CanPlayThrough,
    Play,
    Playing,
    Pause,
    TimeUpdate,
    DurationChange,
    VolumeChange,
    RateChange,
    Resize,
    Emptied,
    Seeking,
    Seeked,
    Waiting,
    Progress,
    Ended,
}

impl MediaEventKind {
    /// DOM event name
    pub fn name(&self) -> &'static str {
        match self {
            MediaEventKind::LoadStart => "loadstart",
            MediaEventKind::LoadedMetadata => "loadedmetadata",
            MediaEventKind::LoadedData => "loadeddata",
            MediaEventKind::CanPlay => "canplay",
            MediaEventKind::CanPlayThrough => "canplaythrough",
            MediaEventKind::Play => "play",
            MediaEventKind::Playing => "playing",
            MediaEventKind::Pause => "pause",
            MediaEventKind::TimeUpdate => "timeupdate",
            MediaEventKind::DurationChange => "durationchange",
            MediaEventKind::VolumeChange => "volumechange",
            MediaEventKind::RateChange => "ratechange",
            MediaEventKind::Resize => "resize",
            MediaEventKind::Emptied => "emptied",
            MediaEventKind::Seeking => "seeking",
            MediaEventKind::Seeked => "seeked",
            MediaEventKind::Waiting => "waiting",
            MediaEventKind::Progress => "progress",
            MediaEventKind::Ended => "ended",
        }
    }
}

impl std::fmt::Display for MediaEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Event dispatched on the element (target = element, no bubbling)
#[derive(Debug, Clone, PartialEq)]
pub enum ElementEvent {
    /// A standard media event forwarded from the native element
    Media(MediaEventKind),
    /// The active cue point changed; payload is the new cue or `None`
    CuePointChange(Option<CuePoint>),
}

/// Broadcast dispatcher for element events
#[derive(Debug)]
pub struct EventDispatcher {
    tx: broadcast::Sender<ElementEvent>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    /// Subscribe to element events
    pub fn subscribe(&self) -> broadcast::Receiver<ElementEvent> {
        self.tx.subscribe()
    }

    /// Dispatch an event; a send with no subscribers is not an error
    pub fn dispatch(&self, event: ElementEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
