use parlance_agent::nlp::SentimentLabel;
use parlance_agent::{Annotator, LexiconAnnotator};
use serde_json::json;

use super::CommandResult;

pub fn run(text: &str) -> CommandResult {
    let annotator = LexiconAnnotator::new();
    let sentiment = annotator.sentiment(text);
    let details = json!({
        "tokens": annotator.tokenize(text),
        "pos": annotator.pos_tag(text),
        "entities": annotator.named_entities(text),
        "sentiment": sentiment,
    });

    CommandResult::success_with_details(
        "annotate",
        format!("{} ({:.2})", label_name(sentiment.label), sentiment.score),
        Some(details),
    )
}

fn label_name(label: SentimentLabel) -> &'static str {
    match label {
        SentimentLabel::Positive => "positive",
        SentimentLabel::Negative => "negative",
    }
}
