//! Top-level entry point for one user turn.
//!
//! Classifies intent once, dispatches to exactly one branch in fixed
//! precedence order (SQL > audio > graphic > fallback text), and converts
//! anything unexpected into an `error`-typed output. A turn always
//! completes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::exec::{QueryExecutor, QueryOutcome};
use crate::intent::{IntentClassifier, IntentResult};
use crate::sql::SqlSynthesizer;

/// Explicit payload for generation branches that have no implementation
/// yet. Keeps the dispatch exhaustive instead of silently returning
/// nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsupportedFeature {
    pub supported: bool,
    pub detail: String,
}

impl UnsupportedFeature {
    fn new(feature: &str) -> Self {
        Self {
            supported: false,
            detail: format!("{feature} is not yet supported."),
        }
    }
}

/// The SQL branch's payload: the synthesized statement, plus the store
/// outcome when the orchestrator was built with an executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlTurn {
    pub statement: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<QueryOutcome>,
}

/// Discriminated output of one turn: `{type, content}` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum TurnOutput {
    Sql(SqlTurn),
    Audio(UnsupportedFeature),
    Graphic(UnsupportedFeature),
    Text(String),
    Error(String),
}

/// Response for one user turn. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationResponse {
    pub intent: IntentResult,
    pub output: TurnOutput,
}

/// Composes classifier → synthesizer/stubs → response.
#[derive(Clone)]
pub struct Orchestrator {
    classifier: IntentClassifier,
    synthesizer: SqlSynthesizer,
    executor: Option<Arc<QueryExecutor>>,
}

impl Orchestrator {
    pub fn new(classifier: IntentClassifier, synthesizer: SqlSynthesizer) -> Self {
        Self {
            classifier,
            synthesizer,
            executor: None,
        }
    }

    /// Also execute synthesized SQL immediately. Synthesis and execution
    /// are separable stages; callers that only want the statement skip
    /// this.
    pub fn with_executor(mut self, executor: Arc<QueryExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Handle one user turn. Never fails: downstream store errors become
    /// an `error`-typed output.
    pub async fn handle_turn(&self, user_input: &str) -> OrchestrationResponse {
        let intent = self.classifier.classify(user_input).await;

        let output = if intent.wants_sql() {
            let statement = self.synthesizer.synthesize(user_input).await;
            match &self.executor {
                Some(executor) => match executor.execute(&statement, false) {
                    Ok(outcome) => TurnOutput::Sql(SqlTurn {
                        statement,
                        outcome: Some(outcome),
                    }),
                    Err(e) => TurnOutput::Error(format!("statement execution failed: {e}")),
                },
                None => TurnOutput::Sql(SqlTurn {
                    statement,
                    outcome: None,
                }),
            }
        } else if intent.wants_audio() {
            TurnOutput::Audio(UnsupportedFeature::new("audio generation"))
        } else if intent.wants_graphic() {
            TurnOutput::Graphic(UnsupportedFeature::new("graphic generation"))
        } else {
            debug!("no intent matched, returning fallback text");
            TurnOutput::Text("Could not determine a valid intent for this request.".to_string())
        };

        OrchestrationResponse { intent, output }
    }
}
