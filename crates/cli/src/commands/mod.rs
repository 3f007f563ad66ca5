pub mod config;
pub mod convert;
pub mod demand;
pub mod market;
pub mod recommend;
pub mod seed;
pub mod suggest;

use std::future::Future;

use mercado_core::config::{AppConfig, LoadOptions};
use mercado_core::{EngineError, PricingEngine};
use mercado_db::{connect_with_config, SqlMarketplaceStore};
use serde::Serialize;
use serde_json::Value;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_RUNTIME: u8 = 3;
pub const EXIT_DB_CONNECTIVITY: u8 = 4;
pub const EXIT_ENGINE: u8 = 5;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            result: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    /// Success carrying a structured result next to the message.
    pub fn success_with(command: &str, message: impl Into<String>, result: impl Serialize) -> Self {
        match serde_json::to_value(result) {
            Ok(value) => {
                let payload = CommandOutcome {
                    command: command.to_string(),
                    status: "ok".to_string(),
                    error_class: None,
                    message: message.into(),
                    result: Some(value),
                };
                Self { exit_code: 0, output: serialize_payload(payload) }
            }
            Err(error) => Self::failure(command, "serialization", error.to_string(), EXIT_ENGINE),
        }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            result: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Engine failures keep the seller-facing advice as their result.
    pub fn engine_failure(command: &str, error: &EngineError) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error.error_class().to_string()),
            message: error.to_string(),
            result: Some(serde_json::json!({ "advice": error.advice() })),
        };
        Self { exit_code: EXIT_ENGINE, output: serialize_payload(payload) }
    }
}

/// Loads config, opens the store, and runs one engine operation on a
/// current-thread runtime. The pool is closed before returning.
pub(crate) fn run_engine_command<T, F, Fut>(
    command: &str,
    options: &LoadOptions,
    operation: F,
) -> Result<T, CommandResult>
where
    F: FnOnce(PricingEngine<SqlMarketplaceStore>) -> Fut,
    Fut: Future<Output = Result<T, EngineError>>,
{
    let config = load_config(command, options)?;
    let runtime = build_runtime(command)?;

    runtime.block_on(async {
        let pool = connect_with_config(&config.database).await.map_err(|error| {
            CommandResult::failure(
                command,
                "db_connectivity",
                format!("failed to connect to database: {error}"),
                EXIT_DB_CONNECTIVITY,
            )
        })?;

        let engine = PricingEngine::new(SqlMarketplaceStore::new(pool.clone()), config.pricing);
        let outcome = operation(engine).await;
        pool.close().await;

        outcome.map_err(|error| CommandResult::engine_failure(command, &error))
    })
}

pub(crate) fn load_config(
    command: &str,
    options: &LoadOptions,
) -> Result<AppConfig, CommandResult> {
    AppConfig::load(options.clone()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            EXIT_CONFIG,
        )
    })
}

pub(crate) fn build_runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            EXIT_RUNTIME,
        )
    })
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
