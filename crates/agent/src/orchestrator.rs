//! Dialogue orchestration: one utterance in, one reply (or one failure) out.
//!
//! ```text
//! Received -> Dispatching -> RuleBasedPath -> Classifying -> Completed | Failed
//!                         -> RetrievalPath                -> Completed | Failed
//!                         -> GenerativePath               -> Completed | Failed
//! ```
//!
//! The orchestrator holds no mutable state. The taxonomy is loaded before
//! construction and only read afterwards, so `handle` may run concurrently
//! from many tasks provided the model adapters are re-entrant.

use std::sync::Arc;

use parlance_core::{
    AppConfig, DialogueError, DialogueOutcome, DialogueState, IntentTaxonomy, MaxLength, Reply,
    Strategy, StrategyRequest,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::classifier::{IntentClassifier, KeywordClassifier};
use crate::llm::{ConversationalModel, GenerativeModel};
use crate::responders::{GenerativeResponder, RetrievalResponder, RuleBasedResponder};

#[derive(Clone)]
pub struct DialogueOrchestrator {
    classifier: Arc<dyn IntentClassifier>,
    rule_based: RuleBasedResponder,
    retrieval: RetrievalResponder,
    generative: GenerativeResponder,
    max_length: MaxLength,
}

impl DialogueOrchestrator {
    /// Wires the responders with the default keyword classifier and a
    /// 50-token generation budget.
    pub fn new(
        taxonomy: Arc<IntentTaxonomy>,
        conversational: Arc<dyn ConversationalModel>,
        generative: Arc<dyn GenerativeModel>,
    ) -> Self {
        Self {
            classifier: Arc::new(KeywordClassifier::default()),
            rule_based: RuleBasedResponder::new(taxonomy),
            retrieval: RetrievalResponder::new(conversational),
            generative: GenerativeResponder::new(generative),
            max_length: MaxLength::default(),
        }
    }

    /// Loads the taxonomy named by the configuration. A missing or malformed
    /// taxonomy is a startup failure.
    pub fn from_config(
        config: &AppConfig,
        conversational: Arc<dyn ConversationalModel>,
        generative: Arc<dyn GenerativeModel>,
    ) -> Result<Self, DialogueError> {
        let taxonomy = IntentTaxonomy::load(&config.taxonomy.path)?;
        let max_length = MaxLength::new(config.dialogue.max_length)?;
        info!(
            event_name = "taxonomy.loaded",
            path = %config.taxonomy.path.display(),
            intents = taxonomy.len(),
            "intent taxonomy loaded"
        );

        Ok(Self::new(Arc::new(taxonomy), conversational, generative).with_max_length(max_length))
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn IntentClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_max_length(mut self, max_length: MaxLength) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn taxonomy(&self) -> &IntentTaxonomy {
        self.rule_based.taxonomy()
    }

    pub fn classify(&self, utterance: &str) -> String {
        self.classifier.classify(utterance)
    }

    /// Dispatches `utterance` to the strategy named by `strategy`.
    ///
    /// Names outside `rule_based | retrieval_based | generative` fail with
    /// `DialogueError::UnsupportedStrategy` without touching any responder.
    pub async fn handle(&self, utterance: &str, strategy: &str) -> Result<Reply, DialogueError> {
        let request = parse_request(utterance, strategy)?;
        self.respond(request).await.map(|outcome| outcome.reply)
    }

    /// Like [`handle`](Self::handle) with an explicit generation budget.
    /// The strategy name is checked before the budget.
    pub async fn handle_with_max_length(
        &self,
        utterance: &str,
        strategy: &str,
        max_length: i64,
    ) -> Result<Reply, DialogueError> {
        let request = parse_request(utterance, strategy)?;
        let max_length = MaxLength::new(max_length).inspect_err(|error| {
            warn!(
                event_name = "dialogue.handle.failed",
                strategy = %request.strategy,
                error_class = error.error_class(),
                "rejected generation budget"
            );
        })?;
        self.respond(request.with_max_length(max_length)).await.map(|outcome| outcome.reply)
    }

    pub async fn respond(&self, request: StrategyRequest) -> Result<DialogueOutcome, DialogueError> {
        let correlation_id = Uuid::new_v4().to_string();
        let strategy = request.strategy;
        let mut path = vec![DialogueState::Received];
        info!(
            event_name = "dialogue.handle.received",
            correlation_id = %correlation_id,
            strategy = %strategy,
            utterance_chars = request.utterance.char_count(),
            history_turns = request.history.len(),
            "utterance received"
        );

        path.push(DialogueState::Dispatching);
        debug!(
            event_name = "dialogue.handle.dispatching",
            correlation_id = %correlation_id,
            strategy = %strategy,
            "dispatching to responder"
        );
        path.push(DialogueState::path_for(strategy));
        let result = match strategy {
            Strategy::RuleBased => {
                path.push(DialogueState::Classifying);
                let intent = self.classifier.classify(request.utterance.as_str());
                let reply = self.rule_based.respond(&intent);
                Ok((Some(intent), reply))
            }
            Strategy::RetrievalBased => self
                .retrieval
                .respond(&request.conversation_turn())
                .await
                .map(|reply| (None, reply)),
            Strategy::Generative => {
                let max_length = request.max_length.unwrap_or(self.max_length);
                self.generative
                    .respond_within(request.utterance.as_str(), max_length)
                    .await
                    .map(|reply| (None, reply))
            }
        };

        match result {
            Ok((intent, reply)) => {
                path.push(DialogueState::Completed);
                info!(
                    event_name = "dialogue.handle.completed",
                    correlation_id = %correlation_id,
                    strategy = %strategy,
                    intent = intent.as_deref().unwrap_or("n/a"),
                    fallback = reply.is_fallback(),
                    "reply produced"
                );
                Ok(DialogueOutcome { correlation_id, strategy, intent, reply, path })
            }
            Err(error) => {
                warn!(
                    event_name = "dialogue.handle.failed",
                    correlation_id = %correlation_id,
                    strategy = %strategy,
                    error_class = error.error_class(),
                    error = %error,
                    "orchestration failed"
                );
                Err(error)
            }
        }
    }
}

fn parse_request(utterance: &str, strategy: &str) -> Result<StrategyRequest, DialogueError> {
    StrategyRequest::parse(utterance, strategy).inspect_err(|error| {
        warn!(
            event_name = "dialogue.handle.failed",
            strategy = strategy,
            error_class = error.error_class(),
            "unsupported strategy requested"
        );
    })
}
