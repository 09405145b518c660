//! Native media element capability
//!
//! The browser's media element is external; the element core only
//! needs source assignment, capability probing, and the playback
//! clock.

use crate::types::CanPlay;
use url::Url;

/// Host-provided native media element surface
pub trait MediaElement: Send + Sync {
    /// Browser-reported ability to play the given MIME type
    fn can_play_type(&self, mime_type: &str) -> CanPlay;

    /// Assign the source URL directly (native playback path)
    fn set_source(&mut self, url: &Url);

    /// Remove the current source
    fn clear_source(&mut self);

    /// Current playback position in seconds
    fn current_time(&self) -> f64;

    /// Begin playback; rejections (autoplay policy) surface to the
    /// caller unchanged
    fn play(&mut self) -> crate::Result<()>;

    /// Pause playback
    fn pause(&mut self);
}
