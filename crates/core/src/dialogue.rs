use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DialogueError;

pub const FALLBACK_REPLY: &str = "Sorry, I don't understand.";
pub const DEFAULT_MAX_LENGTH: u32 = 50;

/// Closed set of response-generation strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    RuleBased,
    RetrievalBased,
    Generative,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Self::RuleBased, Self::RetrievalBased, Self::Generative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RuleBased => "rule_based",
            Self::RetrievalBased => "retrieval_based",
            Self::Generative => "generative",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = DialogueError;

    /// Names are matched exactly; there is no case folding or best-effort default.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "rule_based" => Ok(Self::RuleBased),
            "retrieval_based" => Ok(Self::RetrievalBased),
            "generative" => Ok(Self::Generative),
            other => Err(DialogueError::UnsupportedStrategy(other.to_string())),
        }
    }
}

/// A single user input, immutable once received.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Utterance(String);

impl Utterance {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl From<&str> for Utterance {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Utterance {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Utterance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One earlier user/assistant exchange carried as retrieval context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub user: String,
    pub assistant: String,
}

/// Input for the retrieval path. History is passed through to the adapter untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub utterance: Utterance,
    pub history: Vec<Exchange>,
}

impl ConversationTurn {
    pub fn new(utterance: impl Into<Utterance>) -> Self {
        Self { utterance: utterance.into(), history: Vec::new() }
    }

    pub fn with_history(mut self, history: Vec<Exchange>) -> Self {
        self.history = history;
        self
    }
}

impl From<Utterance> for ConversationTurn {
    fn from(utterance: Utterance) -> Self {
        Self { utterance, history: Vec::new() }
    }
}

/// Output of a responder. `Fallback` marks "no understanding" while still
/// rendering as the fixed apology text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Reply {
    Answer(String),
    Fallback,
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Self::Answer(text) => text,
            Self::Fallback => FALLBACK_REPLY,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback)
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Answer(text) => text,
            Self::Fallback => FALLBACK_REPLY.to_string(),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Positive output budget for generative replies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct MaxLength(u32);

impl MaxLength {
    pub fn new(value: i64) -> Result<Self, DialogueError> {
        if value <= 0 {
            return Err(DialogueError::Configuration(format!(
                "max_length must be greater than zero (got {value})"
            )));
        }
        u32::try_from(value).map(Self).map_err(|_| {
            DialogueError::Configuration(format!("max_length {value} exceeds {}", u32::MAX))
        })
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for MaxLength {
    fn default() -> Self {
        Self(DEFAULT_MAX_LENGTH)
    }
}

impl TryFrom<i64> for MaxLength {
    type Error = DialogueError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MaxLength> for u32 {
    fn from(value: MaxLength) -> Self {
        value.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrategyRequest {
    pub utterance: Utterance,
    pub strategy: Strategy,
    pub max_length: Option<MaxLength>,
    /// Prior exchanges; only the retrieval path reads them.
    pub history: Vec<Exchange>,
}

impl StrategyRequest {
    pub fn new(utterance: impl Into<Utterance>, strategy: Strategy) -> Self {
        Self { utterance: utterance.into(), strategy, max_length: None, history: Vec::new() }
    }

    /// Parses the strategy name; unknown names fail before any dispatch happens.
    pub fn parse(utterance: impl Into<Utterance>, strategy: &str) -> Result<Self, DialogueError> {
        Ok(Self::new(utterance, strategy.parse()?))
    }

    pub fn with_max_length(mut self, max_length: MaxLength) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_history(mut self, history: Vec<Exchange>) -> Self {
        self.history = history;
        self
    }

    pub fn conversation_turn(&self) -> ConversationTurn {
        ConversationTurn { utterance: self.utterance.clone(), history: self.history.clone() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    Received,
    Dispatching,
    Classifying,
    RuleBasedPath,
    RetrievalPath,
    GenerativePath,
    Completed,
    Failed,
}

impl DialogueState {
    pub fn path_for(strategy: Strategy) -> Self {
        match strategy {
            Strategy::RuleBased => Self::RuleBasedPath,
            Strategy::RetrievalBased => Self::RetrievalPath,
            Strategy::Generative => Self::GenerativePath,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Traced result of one completed orchestration call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueOutcome {
    pub correlation_id: String,
    pub strategy: Strategy,
    pub intent: Option<String>,
    pub reply: Reply,
    pub path: Vec<DialogueState>,
}
