//! medquery-core - intent routing and schema-grounded SQL synthesis.
//!
//! Routes free-form natural-language requests into downstream generation
//! tasks (SQL synthesis, audio, graphics), narrows the schema catalog to
//! the tables a question needs, synthesizes SQL with a code-generation
//! model, and executes statements transactionally against DuckDB.

pub mod exec;
pub mod gateway;
pub mod intent;
pub mod orchestrator;
pub mod schema;
pub mod sql;
pub mod tables;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::exec::{QueryExecutor, QueryOutcome, StoreError};
    pub use crate::gateway::{GatewayError, LlmGateway, OpenAiGateway};
    pub use crate::intent::{GraphicIntentKey, IntentClassifier, IntentResult};
    pub use crate::orchestrator::{OrchestrationResponse, Orchestrator, TurnOutput};
    pub use crate::schema::{SchemaCatalog, TableDescriptor};
    pub use crate::sql::SqlSynthesizer;
    pub use crate::tables::TableSelector;
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Scripted gateway for unit tests. Responses are consumed in FIFO
    //! order; prompts are recorded for assertions.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::gateway::{GatewayError, LlmGateway};

    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub system: String,
        pub user: String,
        pub temperature: Option<f32>,
    }

    #[derive(Default)]
    pub struct ScriptedGateway {
        completions: Mutex<VecDeque<Result<String, GatewayError>>>,
        code_responses: Mutex<VecDeque<Result<String, GatewayError>>>,
        completion_log: Mutex<Vec<RecordedCall>>,
        code_log: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedGateway {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn completion(self, response: Result<String, GatewayError>) -> Self {
            self.completions.lock().unwrap().push_back(response);
            self
        }

        pub fn code(self, response: Result<String, GatewayError>) -> Self {
            self.code_responses.lock().unwrap().push_back(response);
            self
        }

        pub fn completion_calls(&self) -> Vec<RecordedCall> {
            self.completion_log.lock().unwrap().clone()
        }

        pub fn code_calls(&self) -> Vec<RecordedCall> {
            self.code_log.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmGateway for ScriptedGateway {
        async fn complete(
            &self,
            system_prompt: &str,
            user_prompt: &str,
            temperature: f32,
        ) -> Result<String, GatewayError> {
            self.completion_log.lock().unwrap().push(RecordedCall {
                system: system_prompt.to_string(),
                user: user_prompt.to_string(),
                temperature: Some(temperature),
            });
            self.completions
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(GatewayError::EmptyResponse))
        }

        async fn generate_code(
            &self,
            system_prompt: &str,
            user_prompt: &str,
        ) -> Result<String, GatewayError> {
            self.code_log.lock().unwrap().push(RecordedCall {
                system: system_prompt.to_string(),
                user: user_prompt.to_string(),
                temperature: None,
            });
            self.code_responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(GatewayError::EmptyResponse))
        }
    }
}
