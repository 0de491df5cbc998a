//! medquery HTTP server
//!
//! Routes natural-language requests through intent classification and
//! schema-grounded SQL synthesis, and executes statements against the
//! DuckDB store.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_openai::config::OpenAIConfig;
use tracing::{info, warn};

use medquery_core::exec::QueryExecutor;
use medquery_core::gateway::{LlmGateway, OpenAiGateway};
use medquery_core::intent::IntentClassifier;
use medquery_core::orchestrator::Orchestrator;
use medquery_core::schema::SchemaCatalog;
use medquery_core::sql::SqlSynthesizer;
use medquery_core::tables::TableSelector;

mod config;
mod logging;
mod routes;

use config::Config;
use routes::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::load("config.yaml").unwrap_or_else(|e| {
        eprintln!("config.yaml not loaded ({e}), using defaults");
        Config::default()
    });
    config.apply_logging_env();
    logging::init();

    // Secrets come only from the environment. A missing key is not fatal:
    // gateway calls fail and every caller degrades to its fallback.
    let api_key = Config::get_openai_api_key().unwrap_or_else(|e| {
        warn!(error = %e, "chat model calls will fail until the key is set");
        String::new()
    });

    let mut chat_config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = &config.models.chat_api_base {
        chat_config = chat_config.with_api_base(base);
    }
    let code_config = OpenAIConfig::new().with_api_base(&config.models.code_api_base);

    let gateway: Arc<dyn LlmGateway> = Arc::new(OpenAiGateway::new(
        chat_config,
        config.models.chat_model.as_str(),
        code_config,
        config.models.code_model.as_str(),
        Duration::from_secs(config.models.timeout_secs),
    ));
    info!(
        chat_model = %config.models.chat_model,
        code_model = %config.models.code_model,
        "language-model gateway ready"
    );

    let catalog = Arc::new(SchemaCatalog::builtin());
    let executor = Arc::new(QueryExecutor::new(
        &config.store.path,
        Some(PathBuf::from(&config.store.dump_path)),
        catalog.clone(),
    ));
    if let Err(e) = executor.initialize(false) {
        warn!(error = %e, "store provisioning failed at startup, deferring to first execute");
    }

    let classifier = IntentClassifier::new(gateway.clone(), config.models.graphic_intent_key);
    let synthesizer = SqlSynthesizer::new(TableSelector::new(gateway, catalog));
    let orchestrator = Orchestrator::new(classifier.clone(), synthesizer.clone())
        .with_executor(executor.clone());

    let app = routes::router(AppState {
        executor,
        classifier,
        synthesizer,
        orchestrator,
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting medquery server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
