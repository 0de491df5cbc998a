//! Intent classification for one user turn.
//!
//! The chat model returns a JSON envelope describing which downstream
//! actions apply. The payload is untrusted structured data: it is decoded
//! with a strict schema-validating parser and anything that does not match
//! the declared shape falls back to the deterministic default intent.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::gateway::{strip_code_fence, LlmGateway};

/// Sampling temperature for classification. Low, to favor determinism.
const INTENT_TEMPERATURE: f32 = 0.3;

/// Which wire key names the graphic intent.
///
/// Deployments have used both spellings; the prompt embeds the configured
/// one and the decoder accepts either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GraphicIntentKey {
    #[default]
    #[serde(rename = "GRAPHIC_GENERATIONS")]
    GraphicGenerations,
    #[serde(rename = "DATA_GENERATION")]
    DataGeneration,
}

impl GraphicIntentKey {
    pub fn as_str(self) -> &'static str {
        match self {
            GraphicIntentKey::GraphicGenerations => "GRAPHIC_GENERATIONS",
            GraphicIntentKey::DataGeneration => "DATA_GENERATION",
        }
    }
}

/// The SQL intent flag plus an optional SQL string the model may volunteer.
///
/// Wire format is a JSON array: `[Boolean, "Optional SQL string"]`. The
/// second element may be omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlQueryIntent(pub bool, #[serde(default)] pub String);

/// Classification result for one user turn. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntentResult {
    #[serde(rename = "AUDIO_GENERATION")]
    pub audio_generation: bool,

    #[serde(rename = "SQL_QUERY")]
    pub sql_query: SqlQueryIntent,

    #[serde(
        rename = "GRAPHIC_GENERATIONS",
        alias = "DATA_GENERATION",
        default
    )]
    pub graphic_generations: Option<String>,
}

impl Default for IntentResult {
    fn default() -> Self {
        Self {
            audio_generation: false,
            sql_query: SqlQueryIntent(false, String::new()),
            graphic_generations: None,
        }
    }
}

impl IntentResult {
    pub fn wants_sql(&self) -> bool {
        self.sql_query.0
    }

    pub fn wants_audio(&self) -> bool {
        self.audio_generation
    }

    pub fn wants_graphic(&self) -> bool {
        self.graphic_generations
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }
}

/// The `{"intent": {...}}` envelope the model is asked to return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntentEnvelope {
    pub intent: IntentResult,
}

/// System prompt describing the three intents and the exact output schema.
pub fn detect_intent_prompt(graphic_key: GraphicIntentKey) -> String {
    format!(
        r#"You are an AI assistant that classifies user input into one or more of the following intents:
1. AUDIO_GENERATION: When the user wants to convert text or content to audio.
2. SQL_QUERY: When the user wants to run a SQL query or asks for a database-related operation.
3. {key}: When the user wants to generate charts, visuals, or insights from data.

Return result in JSON with this schema:
{{
"intent": {{
    "AUDIO_GENERATION": Boolean,
    "SQL_QUERY": [Boolean, "Optional SQL string"],
    "{key}": "Optional string describing chart or data insight"
}}
}}

Return ONLY the JSON, no other text."#,
        key = graphic_key.as_str()
    )
}

/// Strictly decode a model payload into an [`IntentResult`].
///
/// Rejects any text that is not the declared envelope shape.
pub fn parse_intent(payload: &str) -> Result<IntentResult, serde_json::Error> {
    let envelope: IntentEnvelope = serde_json::from_str(strip_code_fence(payload))?;
    Ok(envelope.intent)
}

/// Classifies user input via the chat model.
#[derive(Clone)]
pub struct IntentClassifier {
    gateway: Arc<dyn LlmGateway>,
    prompt: String,
}

impl IntentClassifier {
    pub fn new(gateway: Arc<dyn LlmGateway>, graphic_key: GraphicIntentKey) -> Self {
        let prompt = detect_intent_prompt(graphic_key);
        Self { gateway, prompt }
    }

    /// Use a caller-supplied prompt template instead of the built-in one.
    pub fn with_prompt(gateway: Arc<dyn LlmGateway>, prompt: impl Into<String>) -> Self {
        Self {
            gateway,
            prompt: prompt.into(),
        }
    }

    /// Classify one user turn.
    ///
    /// Gateway or parse failures degrade to the default all-false intent;
    /// this call never fails.
    pub async fn classify(&self, user_input: &str) -> IntentResult {
        let response = match self
            .gateway
            .complete(&self.prompt, user_input, INTENT_TEMPERATURE)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "intent classification call failed, using default intent");
                return IntentResult::default();
            }
        };

        match parse_intent(&response) {
            Ok(intent) => {
                debug!(?intent, "classified user intent");
                intent
            }
            Err(e) => {
                warn!(error = %e, payload = %response, "intent payload failed strict decode, using default intent");
                IntentResult::default()
            }
        }
    }
}
