//! Source resolution
//!
//! Derives the canonical media URL and MIME type from either the
//! `src` attribute or the `playback-id` shorthand. The resolution
//! limit (`max-resolution`) is folded into the assembled streaming
//! URL so the engine only ever sees the final URL.

use crate::attrs::{names, AttributeStore};
use crate::error::Result;
use crate::types::{MediaSourceDescriptor, MIME_HLS};
use url::Url;

/// Host serving playback-id shorthand streams
pub const STREAM_HOST: &str = "stream.mux.com";

/// Split a playback identifier at the first `?` into (id, query)
///
/// Purely syntactic; the query is returned without the leading `?`.
pub fn split_playback_id(playback_id: &str) -> (&str, Option<&str>) {
    match playback_id.split_once('?') {
        Some((id, query)) => (id, Some(query)),
        None => (playback_id, None),
    }
}

/// Assemble the streaming URL for a playback identifier
///
/// `https://<host>/<id>.m3u8[?<query>][&max_resolution=<value>]`
pub fn stream_url(playback_id: &str, max_resolution: Option<&str>) -> Result<Url> {
    let (id, query) = split_playback_id(playback_id);

    let mut assembled = format!("https://{STREAM_HOST}/{id}.m3u8");
    let mut params: Vec<String> = Vec::new();
    if let Some(query) = query {
        if !query.is_empty() {
            params.push(query.to_string());
        }
    }
    if let Some(max) = max_resolution {
        params.push(format!("max_resolution={max}"));
    }
    if !params.is_empty() {
        assembled.push('?');
        assembled.push_str(&params.join("&"));
    }

    Ok(Url::parse(&assembled)?)
}

/// Resolve a `type` attribute shorthand to a MIME type
///
/// Case-insensitive; unknown shorthands pass through as the literal
/// attribute value.
pub fn mime_for_type_attr(type_attr: &str) -> String {
    match type_attr.to_ascii_lowercase().as_str() {
        "hls" => MIME_HLS.to_string(),
        "mp4" => "video/mp4".to_string(),
        other => other.to_string(),
    }
}

/// Infer a MIME type from the URL path extension
///
/// Unknown extensions yield "" (unknown, not an error).
pub fn mime_from_extension(url: &Url) -> &'static str {
    let path = url.path();
    let ext = path.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
    match ext.to_ascii_lowercase().as_str() {
        "m3u8" => MIME_HLS,
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ogv" => "video/ogg",
        "mov" => "video/quicktime",
        _ => "",
    }
}

/// Derive the effective media source from the attribute store
///
/// `src` takes precedence over `playback-id`; returns `None` iff
/// neither is set. An unparseable `src` also resolves to `None` (the
/// element logs at the call site and playback does not proceed).
pub fn resolve_source(store: &AttributeStore) -> Option<MediaSourceDescriptor> {
    let url = if let Some(src) = store.get(names::SRC) {
        Url::parse(src).ok()?
    } else {
        let playback_id = store.get(names::PLAYBACK_ID)?;
        stream_url(playback_id, store.get(names::MAX_RESOLUTION)).ok()?
    };

    let mime_type = match store.get(names::TYPE) {
        Some(type_attr) => mime_for_type_attr(type_attr),
        None => mime_from_extension(&url).to_string(),
    };

    Some(MediaSourceDescriptor { url, mime_type })
}
