pub mod config;
pub mod dialogue;
pub mod errors;
pub mod taxonomy;

pub use config::{
    AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, ModelProvider, SpeechBackend,
};
pub use dialogue::{
    ConversationTurn, DialogueOutcome, DialogueState, Exchange, MaxLength, Reply, Strategy,
    StrategyRequest, Utterance, DEFAULT_MAX_LENGTH, FALLBACK_REPLY,
};
pub use errors::{DialogueError, InterfaceError, ModelError, SpeechError};
pub use taxonomy::{IntentTaxonomy, TaxonomyError};
