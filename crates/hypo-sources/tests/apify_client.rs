//! Integration tests for `ApifyClient` using wiremock HTTP mocks.

use chrono::NaiveDate;
use hypo_sources::{ApifyClient, HttpSettings, PostQuery, PostSource, SourceError};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings() -> HttpSettings {
    HttpSettings {
        timeout_secs: 5,
        max_retries: 1,
        backoff_base_ms: 0,
    }
}

fn query() -> PostQuery {
    PostQuery {
        actor_id: Some("apidojo/tweet-scraper".to_string()),
        accounts: vec!["elonmusk".to_string()],
        keywords: vec!["tesla".to_string()],
        start: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        end: NaiveDate::from_ymd_opt(2024, 4, 24).unwrap(),
        max_posts: 50,
    }
}

#[tokio::test]
async fn fetch_posts_maps_dataset_items() {
    let server = MockServer::start().await;
    let body = serde_json::json!([
        {
            "id": "1",
            "text": "Tesla Q1 deliveries beat expectations",
            "createdAt": "2024-03-04T15:30:00Z",
            "author": { "userName": "elonmusk" },
            "likeCount": 1000,
            "retweetCount": 50
        },
        {
            "id": "2",
            "text": "Cybertruck recall announced",
            "createdAt": "Tue Mar 05 02:00:00 +0000 2024"
        },
        { "id": "3" }
    ]);

    Mock::given(method("POST"))
        .and(path("/v2/acts/apidojo~tweet-scraper/run-sync-get-dataset-items"))
        .and(query_param("token", "apify-key"))
        .and(body_partial_json(serde_json::json!({
            "handles": ["elonmusk"],
            "tweetsDesired": 50,
            "startDate": "2024-01-15",
            "endDate": "2024-04-24"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApifyClient::with_base_url("apify-key", settings(), &server.uri())
        .expect("client construction should not fail");
    let posts = client.fetch_posts(&query()).await.expect("should fetch posts");

    assert_eq!(posts.len(), 2, "item without text is skipped");
    assert_eq!(posts[0].engagement.likes, 1000);
    assert_eq!(posts[1].author, "elonmusk", "falls back to the first account");
    assert!(posts[1].timestamp.is_some());
}

#[tokio::test]
async fn api_error_body_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": { "type": "record-not-found", "message": "Actor was not found" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApifyClient::with_base_url("apify-key", settings(), &server.uri()).unwrap();
    let err = client.fetch_posts(&query()).await.unwrap_err();
    match err {
        SourceError::Api { provider, message } => {
            assert_eq!(provider, "apify");
            assert_eq!(message, "Actor was not found");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn server_errors_are_retried_then_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let client = ApifyClient::with_base_url("apify-key", settings(), &server.uri()).unwrap();
    let err = client.fetch_posts(&query()).await.unwrap_err();
    assert!(matches!(err, SourceError::UnexpectedStatus { status: 503, .. }));
}

#[tokio::test]
async fn non_array_body_is_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
        .mount(&server)
        .await;

    let client = ApifyClient::with_base_url("apify-key", settings(), &server.uri()).unwrap();
    assert!(matches!(
        client.fetch_posts(&query()).await,
        Err(SourceError::Api { .. })
    ));
}
