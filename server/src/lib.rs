use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use engine::boolean::boolean_search;
use engine::corpus::DocId;
use engine::index::SearchIndex;
use engine::lemma::EnglishLemmatizer;
use engine::persist::{load_index, IndexPaths};
use engine::vector::{query_lemmas, vector_search};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize {
    10
}

#[derive(Deserialize)]
pub struct BooleanParams {
    pub q: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHitOut>,
}

#[derive(Serialize)]
pub struct SearchHitOut {
    pub doc_id: DocId,
    pub source: String,
    pub score: f64,
    /// First query lemma and its tf-idf in this document, for display.
    pub lemma: String,
    pub tfidf: f64,
}

#[derive(Serialize)]
pub struct BooleanResponse {
    pub query: String,
    pub total_hits: usize,
    pub doc_ids: Vec<DocId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    index_dir: PathBuf,
    /// Swapped whole on reload; queries clone the Arc and never block a swap.
    index: Arc<RwLock<Arc<SearchIndex>>>,
    lemmatizer: Arc<EnglishLemmatizer>,
    admin_token: Option<String>,
}

impl AppState {
    fn snapshot(&self) -> Arc<SearchIndex> {
        self.index.read().clone()
    }
}

pub fn build_app(index_dir: String) -> Result<Router> {
    let paths = IndexPaths::new(&index_dir);
    let index = load_index(&paths)?;
    tracing::info!(num_docs = index.num_docs(), index_dir, "index loaded");

    let state = AppState {
        index_dir: PathBuf::from(&index_dir),
        index: Arc::new(RwLock::new(Arc::new(index))),
        lemmatizer: Arc::new(EnglishLemmatizer::new()),
        admin_token: std::env::var("ADMIN_TOKEN").ok(),
    };

    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/boolean", get(boolean_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/admin/reload", post(reload_handler))
        .with_state(state)
        .layer(cors);
    Ok(app)
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

fn round6(x: f64) -> f64 {
    (x * 1_000_000.0).round() / 1_000_000.0
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let index = state.snapshot();

    let hits = vector_search(index.as_ref(), state.lemmatizer.as_ref(), &params.q);
    let total_hits = hits.len();
    let first_lemma = query_lemmas(state.lemmatizer.as_ref(), &params.q)
        .into_iter()
        .next()
        .unwrap_or_default();

    let k = params.k.clamp(1, 100);
    let results = hits
        .into_iter()
        .take(k)
        .map(|hit| {
            let tfidf = index
                .vector(hit.doc_id)
                .and_then(|v| v.get(&first_lemma))
                .unwrap_or(0.0);
            SearchHitOut {
                doc_id: hit.doc_id,
                source: index.source(hit.doc_id).unwrap_or_default().to_string(),
                score: round4(hit.score),
                lemma: first_lemma.clone(),
                tfidf: round6(tfidf),
            }
        })
        .collect();

    Json(SearchResponse {
        query: params.q,
        took_s: start.elapsed().as_secs_f64(),
        total_hits,
        results,
    })
}

pub async fn boolean_handler(
    State(state): State<AppState>,
    Query(params): Query<BooleanParams>,
) -> Json<BooleanResponse> {
    let index = state.snapshot();
    match boolean_search(index.as_ref(), state.lemmatizer.as_ref(), &params.q) {
        Ok(result) => Json(BooleanResponse {
            query: params.q,
            total_hits: result.len(),
            doc_ids: result.into_iter().collect(),
            error: None,
        }),
        Err(err) => Json(BooleanResponse {
            query: params.q,
            total_hits: 0,
            doc_ids: Vec::new(),
            error: Some(err.to_string()),
        }),
    }
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<DocId>,
) -> Json<serde_json::Value> {
    let index = state.snapshot();
    match index.source(doc_id) {
        Some(source) => Json(serde_json::json!({
            "doc_id": doc_id,
            "source": source,
            "lemma_count": index.vector(doc_id).map(|v| v.weights.len()).unwrap_or(0),
        })),
        None => Json(serde_json::json!({ "error": "not found" })),
    }
}

async fn reload_handler(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let paths = IndexPaths::new(&state.index_dir);
    let fresh = load_index(&paths)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("reload failed: {e}")))?;
    let num_docs = fresh.num_docs();
    *state.index.write() = Arc::new(fresh);
    tracing::info!(num_docs, "index reloaded");
    Ok(Json(serde_json::json!({ "status": "reloaded", "num_docs": num_docs })))
}

fn authorize(state: &AppState, headers: &axum::http::HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers
        .get("X-ADMIN-TOKEN")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
