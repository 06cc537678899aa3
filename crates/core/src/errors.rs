use thiserror::Error;

use crate::dialogue::Strategy;

/// Failure reported by a model adapter (conversational or generative).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("model `{model}` is unavailable: {message}")]
    Unavailable { model: String, message: String },
    #[error("model transport failure: {0}")]
    Transport(String),
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DialogueError {
    #[error("configuration failure: {0}")]
    Configuration(String),
    #[error("method `{0}` not supported (expected rule_based|retrieval_based|generative)")]
    UnsupportedStrategy(String),
    #[error("{strategy} responder failed: {source}")]
    ServiceUnavailable {
        strategy: Strategy,
        #[source]
        source: ModelError,
    },
}

/// Failure reported by the speech-to-text collaborator.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SpeechError {
    #[error("speech recognition could not understand audio")]
    NotUnderstood,
    #[error("could not request results from speech recognition service: {0}")]
    Service(String),
    #[error("audio input could not be read: {0}")]
    AudioInput(String),
}

impl SpeechError {
    /// Ambiguous audio is recoverable by asking the user to repeat.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotUnderstood)
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NotUnderstood => "Sorry, I didn't catch that. Could you say it again?",
            Self::Service(_) => "Speech recognition is unavailable right now. Please try again later.",
            Self::AudioInput(_) => "The audio input could not be read. Check the file and try again.",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "The assistant is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl DialogueError {
    /// Stable machine-readable class used in command output and log fields.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::UnsupportedStrategy(_) => "unsupported_strategy",
            Self::ServiceUnavailable { .. } => "service_unavailable",
        }
    }

    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<DialogueError> for InterfaceError {
    fn from(value: DialogueError) -> Self {
        let message = value.to_string();
        match value {
            DialogueError::UnsupportedStrategy(_) => {
                Self::BadRequest { message, correlation_id: "unassigned".to_owned() }
            }
            DialogueError::ServiceUnavailable { .. } => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            DialogueError::Configuration(_) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use crate::dialogue::Strategy;
    use crate::errors::{DialogueError, InterfaceError, ModelError, SpeechError};

    #[test]
    fn unsupported_strategy_maps_to_bad_request() {
        let interface =
            DialogueError::UnsupportedStrategy("bogus_method".to_owned()).into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ref message,
            } if correlation_id == "req-1" && message.contains("bogus_method")
        ));
        assert_eq!(
            interface.user_message(),
            "The request could not be processed. Check inputs and try again."
        );
    }

    #[test]
    fn service_unavailable_keeps_model_cause() {
        let error = DialogueError::ServiceUnavailable {
            strategy: Strategy::Generative,
            source: ModelError::Unavailable {
                model: "gpt2".to_owned(),
                message: "connection refused".to_owned(),
            },
        };

        let cause = error.source().map(ToString::to_string).unwrap_or_default();
        assert!(cause.contains("connection refused"));
        assert_eq!(error.error_class(), "service_unavailable");

        let interface = error.into_interface("req-2");
        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(interface.correlation_id(), "req-2");
    }

    #[test]
    fn configuration_error_maps_to_internal() {
        let interface = DialogueError::Configuration("max_length must be greater than zero".into())
            .into_interface("req-3");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }

    #[test]
    fn only_ambiguous_audio_is_recoverable() {
        assert!(SpeechError::NotUnderstood.is_recoverable());
        assert!(!SpeechError::Service("timeout".to_owned()).is_recoverable());
        assert!(SpeechError::NotUnderstood.user_message().contains("didn't catch that"));
    }

    #[test]
    fn unreadable_audio_is_not_a_service_outage() {
        let error = SpeechError::AudioInput("missing.wav: not found".to_owned());

        assert!(!error.is_recoverable());
        assert!(error.to_string().contains("missing.wav"));
        assert_ne!(
            error.user_message(),
            SpeechError::Service("timeout".to_owned()).user_message()
        );
    }
}
