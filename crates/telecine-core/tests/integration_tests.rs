//! Integration tests for Telecine Core

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Map};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use telecine_core::{
    attrs::names,
    testing::{StubEngineProvider, StubMedia, StubMonitorProvider},
    CanPlay, CuePoint, ElementEvent, Error, MediaEventKind, StreamType, VideoElement,
};

fn element(
    media: &StubMedia,
    engines: &StubEngineProvider,
    monitors: &StubMonitorProvider,
) -> Arc<VideoElement> {
    VideoElement::new(
        Box::new(media.clone()),
        Arc::new(engines.clone()),
        Arc::new(monitors.clone()),
    )
}

// =============================================================================
// Attribute Reflection Tests
// =============================================================================

#[tokio::test]
async fn test_boolean_attribute_round_trip() {
    let media = StubMedia::new(CanPlay::Probably);
    let el = element(&media, &StubEngineProvider::new(true), &StubMonitorProvider::new());

    assert!(!el.debug().await);

    el.set_debug(true).await;
    assert_eq!(el.get_attribute(names::DEBUG).await.as_deref(), Some(""));
    assert!(el.debug().await);

    el.set_debug(false).await;
    assert_eq!(el.get_attribute(names::DEBUG).await, None);
    assert!(!el.debug().await);
}

#[tokio::test]
async fn test_stream_type_round_trip() {
    let media = StubMedia::new(CanPlay::Probably);
    let el = element(&media, &StubEngineProvider::new(true), &StubMonitorProvider::new());

    for st in [StreamType::OnDemand, StreamType::Live, StreamType::LlLive] {
        el.set_stream_type(st).await;
        assert_eq!(el.stream_type().await, st);
        assert_eq!(
            el.get_attribute(names::STREAM_TYPE).await.as_deref(),
            Some(st.as_str())
        );
    }
}

// =============================================================================
// Source Resolution Tests
// =============================================================================

#[tokio::test]
async fn test_playback_id_resolves_to_stream_url() {
    let media = StubMedia::new(CanPlay::No);
    let engines = StubEngineProvider::new(true);
    let el = element(&media, &engines, &StubMonitorProvider::new());

    el.connected().await;
    el.set_playback_id(Some("ID")).await;

    assert_eq!(
        engines.loaded_urls().last().unwrap().as_str(),
        "https://stream.mux.com/ID.m3u8"
    );
}

#[tokio::test]
async fn test_playback_id_query_passthrough_and_max_resolution() {
    let media = StubMedia::new(CanPlay::No);
    let engines = StubEngineProvider::new(true);
    let el = element(&media, &engines, &StubMonitorProvider::new());

    el.set_max_resolution(Some("720p")).await;
    el.connected().await;
    el.set_playback_id(Some("ID?foo=1")).await;

    let url = engines.loaded_urls().last().unwrap().to_string();
    assert_eq!(url, "https://stream.mux.com/ID.m3u8?foo=1&max_resolution=720p");
}

// =============================================================================
// Playback Engine Selector Tests
// =============================================================================

#[tokio::test]
async fn test_native_hls_playback_when_capable() {
    let media = StubMedia::new(CanPlay::Maybe);
    let engines = StubEngineProvider::new(true);
    let el = element(&media, &engines, &StubMonitorProvider::new());

    el.connected().await;
    el.set_playback_id(Some("ID")).await;

    assert_eq!(engines.created_count(), 0);
    assert_eq!(
        media.source().as_deref(),
        Some("https://stream.mux.com/ID.m3u8")
    );
}

#[tokio::test]
async fn test_prefer_engine_overrides_native() {
    let media = StubMedia::new(CanPlay::Probably);
    let engines = StubEngineProvider::new(true);
    let el = element(&media, &engines, &StubMonitorProvider::new());

    el.set_prefer_engine(true).await;
    el.connected().await;
    el.set_playback_id(Some("ID")).await;

    assert_eq!(engines.created_count(), 1);
    assert!(media.source().is_none());
}

#[tokio::test]
async fn test_low_latency_stream_type_tunes_engine() {
    let media = StubMedia::new(CanPlay::No);
    let engines = StubEngineProvider::new(true);
    let el = element(&media, &engines, &StubMonitorProvider::new());

    el.set_stream_type(StreamType::LlLive).await;
    el.connected().await;
    el.set_playback_id(Some("ID")).await;

    let config = engines.configs().last().unwrap().clone();
    assert!(config.low_latency);
    assert_eq!(config.frag_lookup_tolerance, 0.001);
}

#[tokio::test]
async fn test_unsupported_environment_does_not_throw() {
    let media = StubMedia::new(CanPlay::No);
    let engines = StubEngineProvider::new(false);
    let el = element(&media, &engines, &StubMonitorProvider::new());

    el.connected().await;
    el.set_playback_id(Some("ID")).await;

    assert!(!el.is_loaded().await);
    assert!(!el.engine_attached().await);
    assert!(media.source().is_none());
}

// =============================================================================
// Analytics Bridge Tests
// =============================================================================

#[tokio::test]
async fn test_metadata_assembled_from_attributes() {
    let media = StubMedia::new(CanPlay::No);
    let monitors = StubMonitorProvider::new();
    let el = element(&media, &StubEngineProvider::new(true), &monitors);

    el.set_attribute(names::ENV_KEY, "env-key").await;
    el.set_attribute("metadata-video-title", "T").await;
    el.set_attribute("metadata-sub-property-id", "S").await;
    el.connected().await;
    el.set_playback_id(Some("ID")).await;

    let options = monitors.last_options().unwrap();
    assert_eq!(options.metadata["video_title"], "T");
    assert_eq!(options.metadata["sub_property_id"], "S");
    assert_eq!(options.metadata["video_id"], "ID");
}

#[tokio::test]
async fn test_monitor_destroyed_on_unload_and_recreated_on_reload() {
    let media = StubMedia::new(CanPlay::No);
    let monitors = StubMonitorProvider::new();
    let el = element(&media, &StubEngineProvider::new(true), &monitors);

    el.set_attribute(names::ENV_KEY, "env-key").await;
    el.connected().await;
    el.set_playback_id(Some("ONE")).await;
    assert!(el.monitor_attached().await);

    el.set_playback_id(Some("TWO")).await;
    assert_eq!(monitors.destroyed_count(), 1);
    assert!(el.monitor_attached().await);
    assert_eq!(monitors.last_options().unwrap().metadata["video_id"], "TWO");
}

#[tokio::test]
async fn test_init_time_stable_across_reloads() {
    let media = StubMedia::new(CanPlay::No);
    let monitors = StubMonitorProvider::new();
    let el = element(&media, &StubEngineProvider::new(true), &monitors);

    el.set_attribute(names::ENV_KEY, "env-key").await;
    el.connected().await;
    el.set_playback_id(Some("ONE")).await;
    let first = monitors.last_options().unwrap().player_init_time;

    el.set_playback_id(Some("TWO")).await;
    let second = monitors.last_options().unwrap().player_init_time;

    assert_eq!(first, second);
    assert_eq!(first, el.init_time());
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[tokio::test]
async fn test_unload_twice_matches_unload_once() {
    let media = StubMedia::new(CanPlay::No);
    let engines = StubEngineProvider::new(true);
    let monitors = StubMonitorProvider::new();
    let el = element(&media, &engines, &monitors);

    el.set_attribute(names::ENV_KEY, "env-key").await;
    el.connected().await;
    el.set_playback_id(Some("ID")).await;

    el.unload().await;
    el.unload().await;

    assert!(!el.is_loaded().await);
    assert!(!el.engine_attached().await);
    assert!(!el.monitor_attached().await);
    assert_eq!(engines.destroyed_count(), 1);
    assert_eq!(monitors.destroyed_count(), 1);
}

#[tokio::test]
async fn test_engine_never_reused_across_loads() {
    let media = StubMedia::new(CanPlay::No);
    let engines = StubEngineProvider::new(true);
    let el = element(&media, &engines, &StubMonitorProvider::new());

    el.connected().await;
    el.set_playback_id(Some("A")).await;
    el.set_playback_id(Some("B")).await;
    el.set_playback_id(Some("C")).await;

    assert_eq!(engines.created_count(), 3);
    assert_eq!(engines.destroyed_count(), 2);
}

// =============================================================================
// Cue Point Tests
// =============================================================================

#[tokio::test]
async fn test_cue_point_change_fires_exactly_once() {
    let media = StubMedia::new(CanPlay::Probably);
    let el = element(&media, &StubEngineProvider::new(true), &StubMonitorProvider::new());
    let mut rx = el.subscribe();

    el.add_cue_points(vec![
        CuePoint::new(0.0, json!({"chapter": 0})),
        CuePoint::new(15.0, json!({"chapter": 1})),
        CuePoint::new(21.0, json!({"chapter": 2})),
    ])
    .await;

    media.set_current_time(15.01);
    el.handle_media_event(MediaEventKind::TimeUpdate).await;

    let mut changes = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let ElementEvent::CuePointChange(cue) = event {
            changes.push(cue);
        }
    }
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].as_ref().unwrap().time, 15.0);
    assert_eq!(el.active_cue_point().await.unwrap().value, json!({"chapter": 1}));
}

#[tokio::test]
async fn test_source_change_clears_cue_points() {
    let media = StubMedia::new(CanPlay::No);
    let el = element(&media, &StubEngineProvider::new(true), &StubMonitorProvider::new());

    el.connected().await;
    el.set_playback_id(Some("ONE")).await;
    el.add_cue_points(vec![CuePoint::new(5.0, json!("x"))]).await;
    media.set_current_time(6.0);
    el.handle_media_event(MediaEventKind::TimeUpdate).await;
    assert!(el.active_cue_point().await.is_some());

    el.set_playback_id(Some("TWO")).await;

    assert!(el.cue_points().await.is_empty());
    assert!(el.active_cue_point().await.is_none());
}

// =============================================================================
// Event Forwarding Tests
// =============================================================================

#[tokio::test]
async fn test_media_events_forwarded() {
    let media = StubMedia::new(CanPlay::Probably);
    let el = element(&media, &StubEngineProvider::new(true), &StubMonitorProvider::new());
    let mut rx = el.subscribe();

    for kind in [
        MediaEventKind::LoadStart,
        MediaEventKind::LoadedMetadata,
        MediaEventKind::CanPlay,
        MediaEventKind::Playing,
        MediaEventKind::DurationChange,
    ] {
        el.handle_media_event(kind).await;
        assert_eq!(rx.recv().await.unwrap(), ElementEvent::Media(kind));
    }
}

#[tokio::test]
async fn test_play_pause_forwarded_to_native_element() {
    let media = StubMedia::new(CanPlay::Probably);
    let el = element(&media, &StubEngineProvider::new(true), &StubMonitorProvider::new());

    el.play().await.unwrap();
    assert!(media.is_playing());

    el.pause().await;
    assert!(!media.is_playing());
}

#[tokio::test]
async fn test_play_rejection_surfaces_unchanged() {
    let media = StubMedia::new(CanPlay::Probably);
    let el = element(&media, &StubEngineProvider::new(true), &StubMonitorProvider::new());

    media.reject_play();
    let err = el.play().await.unwrap_err();
    assert!(matches!(err, Error::PlayRejected(_)));
    assert_eq!(err.error_code(), "PLAY_REJECTED");
    assert!(!media.is_playing());
}

// =============================================================================
// Metadata URL Tests
// =============================================================================

/// Serve one HTTP request with a canned JSON body on an ephemeral port
async fn serve_json_once(body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf).await;
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = socket.write_all(response.as_bytes()).await;
    });
    format!("http://{addr}/metadata.json")
}

#[tokio::test]
async fn test_metadata_url_fetch_assigns_metadata() {
    let media = StubMedia::new(CanPlay::Probably);
    let el = element(&media, &StubEngineProvider::new(true), &StubMonitorProvider::new());

    let url = serve_json_once(r#"{"video_title":"Fetched","custom_1":"c1"}"#).await;
    el.set_attribute(names::METADATA_URL, &url).await;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let metadata = el.metadata().await;
        if metadata.get("video_title") == Some(&json!("Fetched")) {
            assert_eq!(metadata.get("custom_1"), Some(&json!("c1")));
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "metadata fetch never completed"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_metadata_url_write_returns_before_fetch_completes() {
    let media = StubMedia::new(CanPlay::Probably);
    let el = element(&media, &StubEngineProvider::new(true), &StubMonitorProvider::new());

    // a server that accepts the connection but never responds
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let url = format!("http://{addr}/slow");
    let write = el.set_attribute(names::METADATA_URL, &url);
    tokio::time::timeout(Duration::from_secs(1), write)
        .await
        .expect("attribute write blocked on the fetch");

    assert!(el.metadata().await.is_empty());
}

#[tokio::test]
async fn test_metadata_fetch_failure_keeps_metadata() {
    let media = StubMedia::new(CanPlay::Probably);
    let el = element(&media, &StubEngineProvider::new(true), &StubMonitorProvider::new());

    let mut metadata = Map::new();
    metadata.insert("video_title".into(), json!("Kept"));
    el.set_metadata(metadata).await;

    // bind then drop: connections to the port are refused
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    el.set_attribute(names::METADATA_URL, &format!("http://{addr}/gone")).await;
    el.load_metadata_from_url().await;

    assert_eq!(el.metadata().await.get("video_title"), Some(&json!("Kept")));
}

#[tokio::test]
async fn test_metadata_non_object_body_rejected() {
    let media = StubMedia::new(CanPlay::Probably);
    let el = element(&media, &StubEngineProvider::new(true), &StubMonitorProvider::new());

    let mut metadata = Map::new();
    metadata.insert("video_title".into(), json!("Kept"));
    el.set_metadata(metadata).await;

    let url = serve_json_once("[1, 2, 3]").await;
    el.set_attribute(names::METADATA_URL, &url).await;
    el.load_metadata_from_url().await;

    assert_eq!(el.metadata().await.get("video_title"), Some(&json!("Kept")));
    assert_eq!(el.metadata().await.len(), 1);
}

// =============================================================================
// Registry Tests
// =============================================================================

#[test]
fn test_init_registers_element_once() {
    telecine_core::init();
    assert!(telecine_core::registry::is_defined(
        telecine_core::registry::ELEMENT_TAG
    ));
    // repeated initialization is a no-op
    telecine_core::init();
    assert!(telecine_core::registry::is_defined(
        telecine_core::registry::ELEMENT_TAG
    ));
}
