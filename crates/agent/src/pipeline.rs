//! Audio in, reply out: speech recognition followed by dialogue orchestration.

use std::sync::Arc;

use parlance_core::{DialogueError, DialogueOutcome, SpeechError, Strategy, StrategyRequest};
use thiserror::Error;
use tracing::{info, warn};

use crate::orchestrator::DialogueOrchestrator;
use crate::speech::{AudioSource, SpeechRecognizer};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoiceTurn {
    Replied { transcript: String, outcome: DialogueOutcome },
    /// The audio was not understood; `message` asks the user to repeat.
    Reprompt { message: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error(transparent)]
    Speech(SpeechError),
    #[error(transparent)]
    Dialogue(#[from] DialogueError),
}

impl PipelineError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Speech(SpeechError::AudioInput(_)) => "audio_input",
            Self::Speech(_) => "speech_service",
            Self::Dialogue(error) => error.error_class(),
        }
    }
}

#[derive(Clone)]
pub struct VoicePipeline {
    recognizer: Arc<dyn SpeechRecognizer>,
    orchestrator: DialogueOrchestrator,
}

impl VoicePipeline {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>, orchestrator: DialogueOrchestrator) -> Self {
        Self { recognizer, orchestrator }
    }

    pub fn orchestrator(&self) -> &DialogueOrchestrator {
        &self.orchestrator
    }

    pub async fn handle_audio(
        &self,
        audio: &AudioSource,
        strategy: Strategy,
    ) -> Result<VoiceTurn, PipelineError> {
        let transcript = match self.recognizer.recognize(audio).await {
            Ok(transcript) => transcript,
            Err(SpeechError::NotUnderstood) => {
                info!(
                    event_name = "speech.recognition.not_understood",
                    strategy = %strategy,
                    "asking user to repeat"
                );
                return Ok(VoiceTurn::Reprompt {
                    message: SpeechError::NotUnderstood.user_message().to_string(),
                });
            }
            Err(error) => {
                warn!(
                    event_name = "speech.recognition.failed",
                    strategy = %strategy,
                    error = %error,
                    "speech recognition failed"
                );
                return Err(PipelineError::Speech(error));
            }
        };

        info!(
            event_name = "speech.recognition.completed",
            transcript_chars = transcript.chars().count(),
            "audio transcribed"
        );
        let outcome =
            self.orchestrator.respond(StrategyRequest::new(transcript.as_str(), strategy)).await?;
        Ok(VoiceTurn::Replied { transcript, outcome })
    }
}
