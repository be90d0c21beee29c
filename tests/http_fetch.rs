//! Strava client tests against a local mock server.
//!
//! Run with: `cargo test --features http --test http_fetch`

#![cfg(feature = "http")]

use serde_json::json;
use velometrics::{StravaClient, StreamType};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "83ebeabdec09f6670863766f792ead24d61fe3f9";

fn streams_body(watts: f64, len: usize) -> serde_json::Value {
    json!([
        {"type": "time", "data": (0..len).collect::<Vec<_>>(), "series_type": "distance", "original_size": len, "resolution": "high"},
        {"type": "watts", "data": vec![watts; len], "series_type": "distance", "original_size": len, "resolution": "high"},
        {"type": "moving", "data": vec![true; len], "series_type": "distance", "original_size": len, "resolution": "high"}
    ])
}

async fn client_for(server: &MockServer) -> StravaClient {
    StravaClient::with_base_url(TOKEN, &server.uri()).unwrap()
}

#[tokio::test]
async fn test_retrieve_athlete_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/athlete"))
        .and(header("Authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 227615, "ftp": 280})))
        .expect(1)
        .mount(&server)
        .await;

    let athlete = client_for(&server).await.retrieve_athlete().await.unwrap();
    assert_eq!(athlete["id"], 227615);
}

#[tokio::test]
async fn test_retrieve_activity_failure_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/activities/1"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Authorization Error"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/activities/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    assert!(client.retrieve_activity("1").await.is_none());
    assert!(client.retrieve_activity("2").await.is_none());
}

#[tokio::test]
async fn test_retrieve_streams() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/activities/628508858/streams/time,watts,moving"))
        .respond_with(ResponseTemplate::new(200).set_body_json(streams_body(230.0, 120)))
        .mount(&server)
        .await;

    let streams = client_for(&server)
        .await
        .retrieve_streams(
            "628508858",
            &[StreamType::Time, StreamType::Watts, StreamType::Moving],
        )
        .await
        .unwrap();
    assert_eq!(streams.activity_id, "628508858");
    assert_eq!(streams.len(), 120);
    assert!(streams.moving().is_some());
}

#[tokio::test]
async fn test_retrieve_streams_many_keeps_order() {
    let server = MockServer::start().await;
    for (id, watts) in [("10", 100.0), ("11", 110.0), ("13", 130.0)] {
        Mock::given(method("GET"))
            .and(path(format!("/activities/{}/streams/watts", id).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(streams_body(watts, 30)))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/activities/12/streams/watts"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let ids: Vec<String> = ["10", "11", "12", "13"].iter().map(|s| s.to_string()).collect();
    let results = client_for(&server)
        .await
        .retrieve_streams_many(ids, &[StreamType::Watts])
        .await;

    let order: Vec<&str> = results.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(order, vec!["10", "11", "12", "13"]);
    assert!(results[2].1.is_none());
    let first = results[0].1.as_ref().unwrap();
    assert_eq!(first.numeric(StreamType::Watts).unwrap().to_vec(0.0), vec![100.0; 30]);
}
