//! Schema narrowing: pick the tables relevant to one question.
//!
//! The full catalog is embedded in the system prompt and the chat model
//! returns the minimal relevant subset as `{table, schema}` pairs.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::gateway::{strip_code_fence, LlmGateway};
use crate::schema::{SchemaCatalog, TableDescriptor};

/// Sampling temperature for table selection. Precision over creativity.
const SELECTION_TEMPERATURE: f32 = 0.2;

const TABLE_SELECTION_PROMPT: &str = r#"You are a database assistant. Given a full database schema (including CREATE TABLE statements) and a user question in natural language,
your task is to return a JSON list of relevant tables and their DDL statements.

Respond in this format:
[
{"table": "table_name", "schema": "CREATE TABLE ...;"},
...
]

Return ONLY the JSON list, no other text.

Here is the database schema:
"#;

/// Narrows the catalog to the tables a question actually needs.
#[derive(Clone)]
pub struct TableSelector {
    gateway: Arc<dyn LlmGateway>,
    catalog: Arc<SchemaCatalog>,
}

impl TableSelector {
    pub fn new(gateway: Arc<dyn LlmGateway>, catalog: Arc<SchemaCatalog>) -> Self {
        Self { gateway, catalog }
    }

    /// The gateway this selector talks through, for downstream stages that
    /// share it.
    pub fn gateway(&self) -> &Arc<dyn LlmGateway> {
        &self.gateway
    }

    /// Select the relevant subset of the catalog for `question`.
    ///
    /// An empty list is a valid outcome ("no schema context") and is
    /// propagated as such. Gateway and parse failures also yield an empty
    /// list; this call never fails.
    pub async fn select_tables(&self, question: &str) -> Vec<TableDescriptor> {
        let system_prompt = format!("{}{}", TABLE_SELECTION_PROMPT, self.catalog.to_prompt());

        let response = match self
            .gateway
            .complete(&system_prompt, question, SELECTION_TEMPERATURE)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "table selection call failed, proceeding without schema context");
                return Vec::new();
            }
        };

        match parse_selection(&response) {
            Ok(tables) => {
                debug!(
                    count = tables.len(),
                    tables = ?tables.iter().map(|t| t.table_name.as_str()).collect::<Vec<_>>(),
                    "narrowed schema for question"
                );
                tables
            }
            Err(e) => {
                warn!(error = %e, payload = %response, "table selection payload failed strict decode");
                Vec::new()
            }
        }
    }
}

/// Strictly decode the selector payload as an ordered list of descriptors.
pub fn parse_selection(payload: &str) -> Result<Vec<TableDescriptor>, serde_json::Error> {
    serde_json::from_str(strip_code_fence(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayError;
    use crate::test_support::ScriptedGateway;

    fn selector(gateway: ScriptedGateway) -> TableSelector {
        TableSelector::new(Arc::new(gateway), Arc::new(SchemaCatalog::builtin()))
    }

    #[test]
    fn parses_ordered_descriptor_list() {
        let payload = r#"[
            {"table": "providers", "schema": "CREATE TABLE providers (provider_id INTEGER);"},
            {"table": "shifts", "schema": "CREATE TABLE shifts (shift_id INTEGER);"}
        ]"#;
        let tables = parse_selection(payload).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].table_name, "providers");
        assert_eq!(tables[1].table_name, "shifts");
    }

    #[test]
    fn rejects_unexpected_shapes() {
        assert!(parse_selection(r#"{"table": "providers"}"#).is_err());
        assert!(parse_selection(r#"[{"name": "providers", "ddl": "..."}]"#).is_err());
        assert!(parse_selection("here are your tables").is_err());
    }

    #[tokio::test]
    async fn zero_tables_is_propagated_not_errored() {
        let s = selector(ScriptedGateway::new().completion(Ok("[]".to_string())));
        assert!(s.select_tables("what is the meaning of life").await.is_empty());
    }

    #[tokio::test]
    async fn gateway_failure_yields_empty_list() {
        let s = selector(
            ScriptedGateway::new().completion(Err(GatewayError::Remote("boom".to_string()))),
        );
        assert!(s.select_tables("show providers").await.is_empty());
    }

    #[tokio::test]
    async fn parse_failure_yields_empty_list() {
        let s = selector(ScriptedGateway::new().completion(Ok("no tables for you".to_string())));
        assert!(s.select_tables("show providers").await.is_empty());
    }

    #[tokio::test]
    async fn system_prompt_carries_full_catalog() {
        let gateway = Arc::new(ScriptedGateway::new().completion(Ok("[]".to_string())));
        let s = TableSelector::new(gateway.clone(), Arc::new(SchemaCatalog::builtin()));
        s.select_tables("which providers are active").await;

        let calls = gateway.completion_calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].system.contains("CREATE TABLE providers"));
        assert!(calls[0].system.contains("CREATE TABLE document_uploads"));
        assert_eq!(calls[0].user, "which providers are active");
        assert_eq!(calls[0].temperature, Some(0.2));
    }
}
