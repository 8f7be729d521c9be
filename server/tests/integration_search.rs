use axum::body::Body;
use axum::http::{Request, StatusCode};
use engine::corpus::{Corpus, RawDocument};
use engine::index::build_index;
use engine::lemma::EnglishLemmatizer;
use engine::persist::{save_index, IndexPaths};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::tempdir;
use tower::ServiceExt;

fn build_tiny_index(dir: &std::path::Path) {
    let lem = EnglishLemmatizer::new();
    let corpus = Corpus::ingest(
        vec![
            RawDocument {
                source: "https://example.com/rust-intro".into(),
                text: "Rust systems programming. Rust is fast.".into(),
            },
            RawDocument {
                source: "https://example.com/rust-learn".into(),
                text: "Learning the Rust language".into(),
            },
            RawDocument {
                source: "https://example.com/birds".into(),
                text: "Birds eat fish".into(),
            },
        ],
        &lem,
    );
    let index = build_index(&corpus);
    save_index(&IndexPaths::new(dir), &index, None).unwrap();
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    let (status, json) = get_json(app, "/search?q=rust&k=5").await;
    assert_eq!(status, StatusCode::OK);
    let results = json["results"].as_array().unwrap();
    // Doc 1 mentions the query lemma twice against a denser vector; doc 3
    // never mentions it and must be absent.
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["doc_id"].as_u64().unwrap(), 1);
    assert_eq!(results[1]["doc_id"].as_u64().unwrap(), 2);
    assert!(results[0]["score"].as_f64().unwrap() >= results[1]["score"].as_f64().unwrap());
    assert_eq!(results[0]["lemma"].as_str().unwrap(), "rust");
}

#[tokio::test]
async fn search_with_no_content_words_is_empty() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    let (status, json) = get_json(app, "/search?q=of%20the%20and").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_hits"].as_u64().unwrap(), 0);
    assert!(json["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn boolean_endpoint_evaluates_expressions() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    let (status, json) = get_json(app.clone(), "/boolean?q=rust%20AND%20fast").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["doc_ids"].as_array().unwrap().len(), 1);
    assert_eq!(json["doc_ids"][0].as_u64().unwrap(), 1);

    let (_, json) = get_json(app, "/boolean?q=NOT%20rust").await;
    assert_eq!(
        json["doc_ids"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_u64().unwrap())
            .collect::<Vec<_>>(),
        vec![3]
    );
}

#[tokio::test]
async fn malformed_boolean_query_reports_and_recovers() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    let (status, json) = get_json(app, "/boolean?q=rust%20AND").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["doc_ids"].as_array().unwrap().is_empty());
    assert_eq!(json["error"].as_str().unwrap(), "invalid query syntax");
}

#[tokio::test]
async fn doc_endpoint_resolves_sources() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    let (status, json) = get_json(app.clone(), "/doc/2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["source"].as_str().unwrap(), "https://example.com/rust-learn");

    let (_, json) = get_json(app, "/doc/99").await;
    assert_eq!(json["error"].as_str().unwrap(), "not found");
}
