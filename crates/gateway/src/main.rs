//! ContextForge API Gateway
//!
//! Thin HTTP surface over the compression pipeline.
//! Handles:
//! - Query compression and optional answering
//! - Liveness and readiness checks
//! - Observability (logging, metrics, request ids)

mod handlers;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use contextforge_common::{
    config::AppConfig,
    context::{AnswerGenerator, LlmAnswerGenerator, QueryPipeline},
    embeddings::{create_embedder, Embedder},
    metrics,
};
use contextforge_search::VectorIndex;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: Arc<QueryPipeline>,
    pub index_size: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("failed to load configuration")?;
    config.validate()?;

    metrics::init_tracing(&config.observability);
    info!("Starting ContextForge API Gateway v{}", contextforge_common::VERSION);

    // Initialize metrics
    metrics::install_prometheus_exporter(config.observability.metrics_port)?;

    let config = Arc::new(config);

    info!(path = %config.retrieval.index_path, "Loading index...");
    let index = VectorIndex::load(&config.retrieval.index_path)
        .with_context(|| format!("failed to load index {}", config.retrieval.index_path))?;

    let embedder = create_embedder(&config.embedding)?;
    let generator: Option<Arc<dyn AnswerGenerator>> =
        match LlmAnswerGenerator::from_config(&config.generation) {
            Ok(generator) => {
                info!(provider = %config.generation.provider, model = generator.model(), "Answer generation enabled");
                Some(Arc::new(generator) as Arc<dyn AnswerGenerator>)
            }
            Err(e) => {
                warn!(error = %e, "Answer generation disabled");
                None
            }
        };

    let state = build_state(config.clone(), index, embedder, generator)?;

    // Build the router
    let app = create_router(state, config.request_timeout());

    // Start the server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Assemble shared state, refusing an embedder the index cannot serve
fn build_state(
    config: Arc<AppConfig>,
    index: VectorIndex,
    embedder: Arc<dyn Embedder>,
    generator: Option<Arc<dyn AnswerGenerator>>,
) -> contextforge_common::Result<AppState> {
    index.ensure_compatible(embedder.as_ref())?;
    let index_size = index.len();

    let mut pipeline = QueryPipeline::new(embedder, Arc::new(index));
    if let Some(generator) = generator {
        pipeline = pipeline.with_generator(generator);
    }

    Ok(AppState {
        config,
        pipeline: Arc::new(pipeline),
        index_size,
    })
}

/// Create the main application router
fn create_router(state: AppState, request_timeout: Duration) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let api_routes = Router::new().route("/query", post(handlers::query::query));

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .nest("/v1", api_routes)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Set ids outermost so propagation sees them on the request
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use contextforge_common::embeddings::HashingEmbedder;
    use contextforge_common::AppError;
    use contextforge_common::models::{Chunk, IndexedChunk};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn index(dimension: usize) -> VectorIndex {
        let embedder = HashingEmbedder::new(dimension);
        let chunks = vec![
            Chunk::new(
                0,
                6,
                "Results",
                "The model achieved 91.2% accuracy on SQuAD. Precision was 0.88.",
            ),
            Chunk::new(1, 3, "Method", "We embed each chunk. Then we rerank by intent."),
        ];
        let entries = chunks
            .into_iter()
            .map(|chunk| IndexedChunk {
                embedding: embedder.embed_text(&chunk.text),
                chunk,
            })
            .collect();
        VectorIndex::build(entries, embedder.model_name()).unwrap()
    }

    fn router() -> Router {
        let state = build_state(
            Arc::new(AppConfig::default()),
            index(32),
            Arc::new(HashingEmbedder::new(32)),
            None,
        )
        .unwrap();
        create_router(state, Duration::from_secs(5))
    }

    async fn post_query(body: Value) -> (StatusCode, Value) {
        let response = router()
            .oneshot(
                Request::post("/v1/query")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_embedder_dimension_mismatch_fails_startup() {
        let result = build_state(
            Arc::new(AppConfig::default()),
            index(32),
            Arc::new(HashingEmbedder::new(16)),
            None,
        );
        let err = result.err().unwrap();
        assert!(matches!(err, AppError::Configuration { .. }));
        assert!(err.to_string().contains("index holds 32"));
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_ready_reports_index() {
        let response = router()
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ready");
        assert_eq!(body["index_size"], 2);
        assert_eq!(body["generator_configured"], false);
    }

    #[tokio::test]
    async fn test_query_returns_outcome() {
        let (status, body) = post_query(json!({
            "query": "What accuracy did the model achieve?",
            "top_k": 2,
            "token_limit": 200
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["intent"]["intent"], "RESULT");
        assert!(body["tokens_used"].as_u64().unwrap() <= 200);
        assert!(body["compressed_context"].as_str().unwrap().contains("91.2%"));
        assert!(body.get("answer").is_none());
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let (status, body) = post_query(json!({ "query": "" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["field"], "query");
    }

    #[tokio::test]
    async fn test_answer_without_generator_rejected() {
        let (status, body) = post_query(json!({
            "query": "How does reranking work?",
            "generate_answer": true
        }))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["field"], "generate_answer");
    }
}
