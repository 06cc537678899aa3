pub mod annotate;
pub mod ask;
pub mod classify;
pub mod config;
pub mod doctor;
pub mod listen;

use std::sync::Arc;

use parlance_agent::{DialogueOrchestrator, HttpModelClient};
use parlance_core::config::{AppConfig, LoadOptions};
use parlance_core::DialogueError;
use serde::Serialize;
use serde_json::Value;

pub const EXIT_CONFIGURATION: u8 = 2;
pub const EXIT_UNSUPPORTED_STRATEGY: u8 = 3;
pub const EXIT_SERVICE_UNAVAILABLE: u8 = 4;

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
    details: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_details(command, message, None)
    }

    pub fn success_with_details(
        command: &str,
        message: impl Into<String>,
        details: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            details,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
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
            details: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn dialogue_failure(command: &str, error: &DialogueError) -> Self {
        let exit_code = match error {
            DialogueError::Configuration(_) => EXIT_CONFIGURATION,
            DialogueError::UnsupportedStrategy(_) => EXIT_UNSUPPORTED_STRATEGY,
            DialogueError::ServiceUnavailable { .. } => EXIT_SERVICE_UNAVAILABLE,
        };
        Self::failure(command, error.error_class(), error.to_string(), exit_code)
    }
}

pub(crate) fn load_config(command: &str, options: &LoadOptions) -> Result<AppConfig, CommandResult> {
    AppConfig::load(options.clone()).map_err(|error| {
        CommandResult::failure(command, "config_validation", error.to_string(), EXIT_CONFIGURATION)
    })
}

pub(crate) fn build_orchestrator(
    command: &str,
    config: &AppConfig,
) -> Result<DialogueOrchestrator, CommandResult> {
    let client = HttpModelClient::from_config(&config.models).map_err(|error| {
        CommandResult::failure(
            command,
            "service_unavailable",
            error.to_string(),
            EXIT_SERVICE_UNAVAILABLE,
        )
    })?;
    let client = Arc::new(client);

    DialogueOrchestrator::from_config(config, client.clone(), client)
        .map_err(|error| CommandResult::dialogue_failure(command, &error))
}

pub(crate) fn block_on<F: std::future::Future>(
    command: &str,
    future: F,
) -> Result<F::Output, CommandResult> {
    let runtime =
        tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
            CommandResult::failure(
                command,
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                1,
            )
        })?;
    Ok(runtime.block_on(future))
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
