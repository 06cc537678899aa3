use std::path::Path;

use parlance_agent::{
    recognizer_from_config, AudioSource, PipelineError, VoicePipeline, VoiceTurn,
};
use parlance_core::config::LoadOptions;
use parlance_core::{SpeechError, Strategy};
use serde_json::json;

use super::{
    block_on, build_orchestrator, load_config, CommandResult, EXIT_CONFIGURATION,
    EXIT_SERVICE_UNAVAILABLE,
};

const COMMAND: &str = "listen";

pub fn run(options: &LoadOptions, audio: &Path, strategy: Option<&str>) -> CommandResult {
    let config = match load_config(COMMAND, options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let strategy = match strategy.map(str::parse::<Strategy>).transpose() {
        Ok(strategy) => strategy.unwrap_or(config.dialogue.default_strategy),
        Err(error) => return CommandResult::dialogue_failure(COMMAND, &error),
    };

    let recognizer = match recognizer_from_config(&config.speech) {
        Ok(recognizer) => recognizer,
        Err(error) => return speech_failure(&error),
    };
    let orchestrator = match build_orchestrator(COMMAND, &config) {
        Ok(orchestrator) => orchestrator,
        Err(result) => return result,
    };
    let pipeline = VoicePipeline::new(recognizer, orchestrator);

    let source = AudioSource::File(audio.to_path_buf());
    let turn = match block_on(COMMAND, pipeline.handle_audio(&source, strategy)) {
        Ok(turn) => turn,
        Err(result) => return result,
    };

    match turn {
        Ok(VoiceTurn::Replied { transcript, outcome }) => CommandResult::success_with_details(
            COMMAND,
            outcome.reply.text(),
            Some(json!({
                "transcript": transcript,
                "correlation_id": outcome.correlation_id,
                "strategy": outcome.strategy,
                "intent": outcome.intent,
                "fallback": outcome.reply.is_fallback(),
            })),
        ),
        Ok(VoiceTurn::Reprompt { message }) => CommandResult::success_with_details(
            COMMAND,
            message,
            Some(json!({ "reprompt": true })),
        ),
        Err(PipelineError::Speech(error)) => speech_failure(&error),
        Err(PipelineError::Dialogue(error)) => CommandResult::dialogue_failure(COMMAND, &error),
    }
}

fn speech_failure(error: &SpeechError) -> CommandResult {
    let message = error.to_string();
    match error {
        SpeechError::AudioInput(_) => {
            CommandResult::failure(COMMAND, "audio_input", &message, EXIT_CONFIGURATION)
        }
        SpeechError::NotUnderstood | SpeechError::Service(_) => {
            CommandResult::failure(COMMAND, "speech_service", &message, EXIT_SERVICE_UNAVAILABLE)
        }
    }
}
