//! HTTP surface over the core pipeline.
//!
//! Store execution failures return a client-error status carrying the
//! exact database diagnostic; every other failure mode has already been
//! converted to a safe default or an error-typed payload downstream.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, Instrument};
use uuid::Uuid;

use medquery_core::exec::{QueryExecutor, QueryOutcome};
use medquery_core::intent::{IntentClassifier, IntentEnvelope};
use medquery_core::orchestrator::{OrchestrationResponse, Orchestrator};
use medquery_core::sql::SqlSynthesizer;

#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<QueryExecutor>,
    pub classifier: IntentClassifier,
    pub synthesizer: SqlSynthesizer,
    pub orchestrator: Orchestrator,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/execute", post(execute))
        .route("/initialize", post(initialize))
        .route("/nl2sql", post(nl2sql))
        .route("/intent_classify", post(intent_classify))
        .route("/orchestrate", post(orchestrate))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ExecuteRequest {
    query: String,
    #[serde(default)]
    force_initialize: bool,
}

#[derive(Debug, Deserialize)]
struct InitializeRequest {
    #[serde(default = "default_force")]
    force: bool,
}

fn default_force() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct TurnRequest {
    #[serde(rename = "userInput")]
    user_input: String,
}

async fn execute(
    State(state): State<AppState>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<QueryOutcome>, (StatusCode, Json<Value>)> {
    match state.executor.execute(&request.query, request.force_initialize) {
        Ok(outcome) => Ok(Json(outcome)),
        Err(e) => {
            error!(error = %e, "statement execution failed");
            Err((
                StatusCode::BAD_REQUEST,
                Json(json!({"status": "failure", "message": e.to_string()})),
            ))
        }
    }
}

async fn initialize(
    State(state): State<AppState>,
    Json(request): Json<InitializeRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.executor.initialize(request.force) {
        Ok(provisioned) => {
            info!(forced = request.force, provisioned, "store initialization requested");
            Ok(Json(json!({"status": "initialized", "forced": request.force})))
        }
        Err(e) => {
            error!(error = %e, "store initialization failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"status": "failure", "message": e.to_string()})),
            ))
        }
    }
}

async fn nl2sql(
    State(state): State<AppState>,
    Json(request): Json<TurnRequest>,
) -> Json<String> {
    Json(state.synthesizer.synthesize(&request.user_input).await)
}

async fn intent_classify(
    State(state): State<AppState>,
    Json(request): Json<TurnRequest>,
) -> Json<IntentEnvelope> {
    Json(IntentEnvelope {
        intent: state.classifier.classify(&request.user_input).await,
    })
}

async fn orchestrate(
    State(state): State<AppState>,
    Json(request): Json<TurnRequest>,
) -> Json<OrchestrationResponse> {
    let turn_id = Uuid::new_v4();
    let span = tracing::info_span!("turn", %turn_id);
    let response = state
        .orchestrator
        .handle_turn(&request.user_input)
        .instrument(span)
        .await;
    Json(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_request_defaults_force_to_false() {
        let request: ExecuteRequest = serde_json::from_str(r#"{"query": "SELECT 1"}"#).unwrap();
        assert!(!request.force_initialize);
    }

    #[test]
    fn initialize_request_defaults_force_to_true() {
        let request: InitializeRequest = serde_json::from_str("{}").unwrap();
        assert!(request.force);
    }

    #[test]
    fn turn_request_uses_camel_case_user_input() {
        let request: TurnRequest =
            serde_json::from_str(r#"{"userInput": "show me all active providers"}"#).unwrap();
        assert_eq!(request.user_input, "show me all active providers");
        assert!(serde_json::from_str::<TurnRequest>(r#"{"user_input": "x"}"#).is_err());
    }
}
