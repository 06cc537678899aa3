//! Model adapter seams. Every model is a black-box `text -> text` function;
//! loading, weights and tokenizers live behind these traits.

use async_trait::async_trait;
use parlance_core::{ConversationTurn, MaxLength, ModelError};
use serde::{Deserialize, Serialize};

/// One candidate returned by a conversational model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationResult {
    pub generated_text: String,
}

impl ConversationResult {
    pub fn new(generated_text: impl Into<String>) -> Self {
        Self { generated_text: generated_text.into() }
    }
}

#[async_trait]
pub trait ConversationalModel: Send + Sync {
    fn name(&self) -> &str;

    /// Returns candidates ordered best-first.
    async fn converse(&self, turn: &ConversationTurn) -> Result<Vec<ConversationResult>, ModelError>;
}

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str, max_length: MaxLength) -> Result<String, ModelError>;
}
