use std::sync::Arc;

use parlance_core::{DialogueError, MaxLength, ModelError, Reply, Strategy};
use tracing::debug;

use crate::llm::GenerativeModel;

/// Markers some model families leave in decoded output.
const SPECIAL_TOKENS: &[&str] = &[
    "<|endoftext|>",
    "<|im_start|>",
    "<|im_end|>",
    "<s>",
    "</s>",
    "<pad>",
    "<unk>",
    "[CLS]",
    "[SEP]",
    "[PAD]",
];

/// Open-ended replies from a generative model under a length budget.
///
/// The adapter is invoked on every call; nothing is cached here.
#[derive(Clone)]
pub struct GenerativeResponder {
    model: Arc<dyn GenerativeModel>,
}

impl GenerativeResponder {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Rejects a non-positive budget with `DialogueError::Configuration`
    /// before the model is called.
    pub async fn respond(&self, prompt: &str, max_length: i64) -> Result<Reply, DialogueError> {
        let max_length = MaxLength::new(max_length)?;
        self.respond_within(prompt, max_length).await
    }

    pub async fn respond_within(
        &self,
        prompt: &str,
        max_length: MaxLength,
    ) -> Result<Reply, DialogueError> {
        let raw = self.model.generate(prompt, max_length).await.map_err(unavailable)?;
        let text = clean_generated_text(&raw);
        debug!(
            event_name = "dialogue.generative.decoded",
            model = self.model.name(),
            max_length = max_length.get(),
            raw_chars = raw.chars().count(),
            reply_chars = text.chars().count(),
            "generative model returned"
        );

        if text.is_empty() {
            return Err(unavailable(ModelError::MalformedResponse(
                "generative model returned no text".to_string(),
            )));
        }
        Ok(Reply::Answer(text))
    }
}

/// Removes special tokens, turns whitespace control characters (tab, CR, NEL)
/// into spaces, drops the remaining control characters, then trims.
/// `\r\n` line endings become `\n`.
pub fn clean_generated_text(raw: &str) -> String {
    let mut text = raw.replace("\r\n", "\n");
    for token in SPECIAL_TOKENS {
        if text.contains(token) {
            text = text.replace(token, "");
        }
    }

    let text: String = text
        .chars()
        .filter_map(|character| match character {
            '\n' => Some('\n'),
            c if c.is_control() && c.is_whitespace() => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect();
    text.trim().to_string()
}

fn unavailable(source: ModelError) -> DialogueError {
    DialogueError::ServiceUnavailable { strategy: Strategy::Generative, source }
}
