use parlance_agent::{IntentClassifier, KeywordClassifier, UNKNOWN_INTENT};
use serde_json::json;

use super::CommandResult;

pub fn run(utterance: &str) -> CommandResult {
    let intent = KeywordClassifier::default().classify(utterance);
    let recognized = intent != UNKNOWN_INTENT;
    CommandResult::success_with_details(
        "classify",
        intent.clone(),
        Some(json!({ "intent": intent, "recognized": recognized })),
    )
}
