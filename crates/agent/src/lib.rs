//! Dialogue runtime - strategy dispatch over pluggable model adapters
//!
//! This crate provides the "brain" of the assistant:
//! - Classifies utterances into taxonomy intents by keyword
//! - Produces replies through one of three strategies
//! - Talks to conversational, generative and speech services over HTTP
//! - Annotates text with tokens, tags, entities and sentiment
//!
//! # Architecture
//!
//! One utterance follows a constrained path:
//! 1. **Strategy Check** (`orchestrator`) - Reject names outside the closed set
//! 2. **Dispatch** (`responders`) - Rule-based, retrieval or generative reply
//! 3. **Adapter Call** (`llm`, `http`) - Only for the model-backed strategies
//!
//! Voice turns (`pipeline`) put speech recognition (`speech`) in front of the
//! same orchestrator.
//!
//! # Key Types
//!
//! - `DialogueOrchestrator` - Strategy dispatcher (see `orchestrator` module)
//! - `ConversationalModel` / `GenerativeModel` - Pluggable model adapters
//! - `SpeechRecognizer` - Audio to text seam
//!
//! # Fallback Principle
//!
//! Understanding nothing is a normal outcome, not an error. The rule-based path
//! answers with the fixed apology; only adapter failures surface as errors.

pub mod classifier;
pub mod http;
pub mod llm;
pub mod nlp;
pub mod orchestrator;
pub mod pipeline;
pub mod responders;
pub mod speech;

pub use classifier::{IntentClassifier, KeywordClassifier, KeywordRule, UNKNOWN_INTENT};
pub use http::HttpModelClient;
pub use llm::{ConversationResult, ConversationalModel, GenerativeModel};
pub use nlp::{Annotator, LexiconAnnotator};
pub use orchestrator::DialogueOrchestrator;
pub use pipeline::{PipelineError, VoicePipeline, VoiceTurn};
pub use responders::{GenerativeResponder, RetrievalResponder, RuleBasedResponder};
pub use speech::{recognizer_from_config, AudioSource, HttpSpeechRecognizer, SpeechRecognizer};
