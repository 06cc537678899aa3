use parlance_core::config::LoadOptions;
use parlance_core::{DialogueError, MaxLength, StrategyRequest};
use serde_json::json;

use super::{block_on, build_orchestrator, load_config, CommandResult};

const COMMAND: &str = "ask";

pub fn run(
    options: &LoadOptions,
    utterance: &str,
    strategy: Option<&str>,
    max_length: Option<i64>,
) -> CommandResult {
    let config = match load_config(COMMAND, options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let strategy = strategy.unwrap_or(config.dialogue.default_strategy.as_str());
    let request = match build_request(utterance, strategy, max_length) {
        Ok(request) => request,
        Err(error) => return CommandResult::dialogue_failure(COMMAND, &error),
    };

    let orchestrator = match build_orchestrator(COMMAND, &config) {
        Ok(orchestrator) => orchestrator,
        Err(result) => return result,
    };

    let outcome = match block_on(COMMAND, orchestrator.respond(request)) {
        Ok(outcome) => outcome,
        Err(result) => return result,
    };

    match outcome {
        Ok(outcome) => CommandResult::success_with_details(
            COMMAND,
            outcome.reply.text(),
            Some(json!({
                "correlation_id": outcome.correlation_id,
                "strategy": outcome.strategy,
                "intent": outcome.intent,
                "fallback": outcome.reply.is_fallback(),
            })),
        ),
        Err(error) => CommandResult::dialogue_failure(COMMAND, &error),
    }
}

/// Strategy name first, then the generation budget.
fn build_request(
    utterance: &str,
    strategy: &str,
    max_length: Option<i64>,
) -> Result<StrategyRequest, DialogueError> {
    let request = StrategyRequest::parse(utterance, strategy)?;
    match max_length {
        Some(value) => Ok(request.with_max_length(MaxLength::new(value)?)),
        None => Ok(request),
    }
}
