use super::*;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const URL: &str = "https://api.spotify.com/v1/me/player/currently-playing";

fn parse(body: &str) -> Result<PlaybackState> {
    parse_currently_playing(URL, StatusCode::OK, body.to_string())
}

fn playing_body(title: &str, artists: &[&str], progress_ms: u64) -> serde_json::Value {
    json!({
        "timestamp": 1_700_000_000_000_u64,
        "progress_ms": progress_ms,
        "is_playing": true,
        "currently_playing_type": "track",
        "item": {
            "name": title,
            "artists": artists.iter().map(|a| json!({ "name": a })).collect::<Vec<_>>(),
            "album": { "name": "Album" },
            "external_urls": { "spotify": "https://open.spotify.com/track/abc" },
            "duration_ms": 200_000
        }
    })
}

#[test]
fn playing_track() {
    let state = parse(&playing_body("Song A", &["Artist"], 10_000).to_string()).unwrap();
    assert_eq!(
        state,
        PlaybackState {
            is_playing: true,
            title: "Song A".to_string(),
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            track_url: "https://open.spotify.com/track/abc".to_string(),
            progress_ms: 10_000,
        }
    );
}

#[test]
fn artists_keep_provider_order() {
    let state = parse(&playing_body("Song", &["X", "Y", "Z"], 0).to_string()).unwrap();
    assert_eq!(state.artist, "X, Y, Z");
}

#[test]
fn empty_body_is_not_playing() {
    assert_eq!(parse("").unwrap(), PlaybackState::stopped());
    assert_eq!(parse("  \n").unwrap(), PlaybackState::stopped());
    // Truncated documents are treated the same way
    assert_eq!(parse("{\"is_playing\": tr").unwrap(), PlaybackState::stopped());
}

#[test]
fn paused_clears_fields() {
    let mut body = playing_body("Song A", &["Artist"], 10_000);
    body["is_playing"] = json!(false);
    assert_eq!(parse(&body.to_string()).unwrap(), PlaybackState::stopped());
}

#[test]
fn missing_is_playing_is_an_error() {
    let err = parse(r#"{"error": {"status": 401, "message": "The access token expired"}}"#)
        .unwrap_err();
    assert!(matches!(err, Error::MissingField { field: "is_playing", .. }));

    let err = parse(r#"{"is_playing": null, "progress_ms": 0}"#).unwrap_err();
    assert!(matches!(err, Error::MissingField { field: "is_playing", .. }));
}

#[test]
fn malformed_body_is_an_error() {
    assert!(matches!(
        parse("<html>Service unavailable</html>").unwrap_err(),
        Error::Decode { .. }
    ));
    assert!(matches!(
        parse(r#"{"is_playing": "yes"}"#).unwrap_err(),
        Error::Decode { .. }
    ));
}

#[test]
fn episode_without_item_is_not_a_track() {
    let body = json!({
        "is_playing": true,
        "progress_ms": 60_000,
        "currently_playing_type": "episode",
        "item": null
    });
    assert_eq!(parse(&body.to_string()).unwrap(), PlaybackState::stopped());
}

#[test]
fn local_track_without_url() {
    let mut body = playing_body("Local", &["Me"], 6_000);
    body["item"]["external_urls"] = json!({});
    let state = parse(&body.to_string()).unwrap();
    assert!(state.is_playing);
    assert_eq!(state.track_url, "");
}

#[tokio::test]
async fn fetch_uses_bearer_token_and_market() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player/currently-playing"))
        .and(query_param("market", "JP"))
        .and(header("authorization", "Bearer access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(playing_body(
            "Song A",
            &["X", "Y"],
            70_000,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let probe = PlaybackProbe::new(
        Client::new(),
        &Endpoints {
            accounts: server.uri(),
            api: server.uri(),
        },
        "JP".to_string(),
    );
    let state = probe.fetch_current_playback("access").await.unwrap();
    assert_eq!(state.title, "Song A");
    assert_eq!(state.artist, "X, Y");
    assert_eq!(state.progress_ms, 70_000);
}

#[tokio::test]
async fn fetch_no_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player/currently-playing"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let probe = PlaybackProbe::new(
        Client::new(),
        &Endpoints {
            accounts: server.uri(),
            api: server.uri(),
        },
        "JP".to_string(),
    );
    assert_eq!(
        probe.fetch_current_playback("access").await.unwrap(),
        PlaybackState::stopped()
    );
}
