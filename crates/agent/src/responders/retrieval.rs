use std::sync::Arc;

use parlance_core::{ConversationTurn, DialogueError, ModelError, Reply, Strategy};
use tracing::debug;

use crate::llm::ConversationalModel;

/// Delegates a turn to a conversational model and keeps the first candidate.
#[derive(Clone)]
pub struct RetrievalResponder {
    model: Arc<dyn ConversationalModel>,
}

impl RetrievalResponder {
    pub fn new(model: Arc<dyn ConversationalModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Adapter errors are passed through as the cause of
    /// `DialogueError::ServiceUnavailable`; nothing is retried here.
    pub async fn respond(&self, turn: &ConversationTurn) -> Result<Reply, DialogueError> {
        let results = self.model.converse(turn).await.map_err(unavailable)?;
        debug!(
            event_name = "dialogue.retrieval.results",
            model = self.model.name(),
            candidates = results.len(),
            "conversational model returned"
        );

        let first = results.into_iter().next().ok_or_else(|| {
            unavailable(ModelError::MalformedResponse(
                "conversational model returned no results".to_string(),
            ))
        })?;

        let text = first.generated_text.trim();
        if text.is_empty() {
            return Err(unavailable(ModelError::MalformedResponse(
                "conversational model returned an empty reply".to_string(),
            )));
        }
        Ok(Reply::Answer(text.to_string()))
    }
}

fn unavailable(source: ModelError) -> DialogueError {
    DialogueError::ServiceUnavailable { strategy: Strategy::RetrievalBased, source }
}
