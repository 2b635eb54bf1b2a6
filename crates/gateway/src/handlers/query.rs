//! Query handler

use axum::{extract::State, Json};
use serde::Deserialize;
use validator::Validate;

use crate::AppState;
use contextforge_common::{
    context::{QueryOptions, QueryOutcome},
    errors::{AppError, Result},
    metrics::RequestMetrics,
};

/// Compression request
#[derive(Debug, Deserialize, Validate)]
pub struct QueryRequest {
    #[validate(length(min = 1, max = 2000))]
    pub query: String,

    /// Chunks kept after reranking (defaults to retrieval.top_k)
    #[validate(range(min = 1, max = 100))]
    pub top_k: Option<usize>,

    /// Token budget (defaults to retrieval.token_limit)
    pub token_limit: Option<usize>,

    #[serde(default)]
    pub generate_answer: bool,
}

impl QueryRequest {
    fn options(&self, defaults: QueryOptions) -> QueryOptions {
        QueryOptions {
            top_k: self.top_k.unwrap_or(defaults.top_k),
            token_limit: self.token_limit.unwrap_or(defaults.token_limit),
            generate_answer: self.generate_answer,
        }
    }
}

/// Run the adaptive pipeline and return its output dictionary
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryOutcome>> {
    let metrics = RequestMetrics::start("POST", "/v1/query");
    let result = run_query(&state, request).await;
    metrics.finish(match &result {
        Ok(_) => 200,
        Err(e) => e.status_code().as_u16(),
    });
    result.map(Json)
}

async fn run_query(state: &AppState, request: QueryRequest) -> Result<QueryOutcome> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: e.field_errors().keys().next().map(|f| f.to_string()),
    })?;

    if request.generate_answer && !state.pipeline.has_generator() {
        return Err(AppError::Validation {
            message: "Answer generation is not configured on this server".to_string(),
            field: Some("generate_answer".to_string()),
        });
    }

    let options = request.options(QueryOptions::from(&state.config.retrieval));
    state.pipeline.run(&request.query, &options).await
}
