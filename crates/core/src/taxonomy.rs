//! Intent taxonomy store: intent name to candidate canned replies.
//!
//! Loaded once from an external resource and never mutated afterwards. Share it
//! behind an `Arc` so independent orchestrators (for example one per tenant)
//! can hold their own taxonomy in the same process.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::errors::DialogueError;

#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("could not read intent taxonomy `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse intent taxonomy as JSON: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("could not parse intent taxonomy as TOML: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("intent taxonomy contains an empty intent name")]
    EmptyIntentName,
    #[error("intent `{intent}` has no candidate replies")]
    NoReplies { intent: String },
    #[error("intent `{intent}` has a blank reply at position {index}")]
    BlankReply { intent: String, index: usize },
}

impl From<TaxonomyError> for DialogueError {
    fn from(value: TaxonomyError) -> Self {
        DialogueError::Configuration(value.to_string())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntentTaxonomy {
    intents: BTreeMap<String, Vec<String>>,
}

impl IntentTaxonomy {
    /// Builds a taxonomy after checking that every intent has at least one
    /// non-blank reply.
    pub fn from_map(intents: BTreeMap<String, Vec<String>>) -> Result<Self, TaxonomyError> {
        for (intent, replies) in &intents {
            if intent.trim().is_empty() {
                return Err(TaxonomyError::EmptyIntentName);
            }
            if replies.is_empty() {
                return Err(TaxonomyError::NoReplies { intent: intent.clone() });
            }
            if let Some(index) = replies.iter().position(|reply| reply.trim().is_empty()) {
                return Err(TaxonomyError::BlankReply { intent: intent.clone(), index });
            }
        }
        Ok(Self { intents })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, TaxonomyError> {
        Self::from_map(serde_json::from_str(raw)?)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, TaxonomyError> {
        Self::from_map(toml::from_str(raw)?)
    }

    /// Reads the taxonomy from disk. `.toml` files are parsed as TOML, anything
    /// else as JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TaxonomyError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|source| TaxonomyError::ReadFile { path: path.to_path_buf(), source })?;

        let is_toml = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case("toml"));
        if is_toml {
            Self::from_toml_str(&raw)
        } else {
            Self::from_json_str(&raw)
        }
    }

    pub fn replies(&self, intent: &str) -> Option<&[String]> {
        self.intents.get(intent).map(Vec::as_slice)
    }

    pub fn contains(&self, intent: &str) -> bool {
        self.intents.contains_key(intent)
    }

    pub fn intents(&self) -> impl Iterator<Item = &str> {
        self.intents.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}
