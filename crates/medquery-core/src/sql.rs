//! SQL synthesis from natural language.
//!
//! Two steps: narrow the catalog via the table selector, then ask the
//! code-generation model for a single statement with the narrowed schema
//! as reference context.

use tracing::{info, warn};

use crate::gateway::strip_code_fence;
use crate::schema::TableDescriptor;
use crate::tables::TableSelector;

/// Returned in place of a statement when generation fails. The executor
/// fails cleanly on it, so the turn still completes.
pub const SQL_SENTINEL: &str = "ERROR: Failed to generate SQL.";

/// Synthesizes a single SQL statement for one question.
#[derive(Clone)]
pub struct SqlSynthesizer {
    selector: TableSelector,
}

impl SqlSynthesizer {
    pub fn new(selector: TableSelector) -> Self {
        Self { selector }
    }

    /// Convert a natural-language question into one SQL statement.
    ///
    /// Any code-model failure yields [`SQL_SENTINEL`] instead of an error;
    /// this call never fails.
    pub async fn synthesize(&self, question: &str) -> String {
        let tables = self.selector.select_tables(question).await;
        let system_prompt = code_model_prompt(&tables);

        match self
            .selector
            .gateway()
            .generate_code(&system_prompt, question)
            .await
        {
            Ok(raw) => {
                let statement = strip_code_fence(&raw).trim().to_string();
                info!(%statement, "synthesized SQL statement");
                statement
            }
            Err(e) => {
                warn!(error = %e, "SQL generation failed, returning sentinel");
                SQL_SENTINEL.to_string()
            }
        }
    }
}

/// System prompt for the code model: fixed dialect plus the narrowed schema.
fn code_model_prompt(tables: &[TableDescriptor]) -> String {
    let mut prompt = String::from(
        "You are a SQL expert who writes syntactically correct SQL queries for DuckDB.\n\
         Return exactly one SQL statement and nothing else.\n",
    );
    if tables.is_empty() {
        prompt.push_str("No schema context is available for this question.\n");
    } else {
        prompt.push_str("Use the following schema for reference:\n");
        for table in tables {
            prompt.push('`');
            prompt.push_str(&table.table_name);
            prompt.push_str("`\n");
            prompt.push_str(&table.ddl);
            prompt.push('\n');
        }
    }
    prompt
}
