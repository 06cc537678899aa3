/// Label returned when no keyword rule matches.
pub const UNKNOWN_INTENT: &str = "unknown";

/// Maps an utterance to an intent label.
///
/// Implementations must be total and deterministic with no side effects: every
/// input, including the empty string, yields a label, and the same input always
/// yields the same label. Swapping in a statistical classifier only requires a
/// new implementation of this trait.
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, utterance: &str) -> String;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeywordRule {
    keyword: String,
    intent: String,
}

impl KeywordRule {
    pub fn new(keyword: impl AsRef<str>, intent: impl Into<String>) -> Self {
        Self { keyword: normalize_text(keyword.as_ref()), intent: intent.into() }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn intent(&self) -> &str {
        &self.intent
    }
}

/// Case-insensitive substring matcher over an ordered rule list; first match wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeywordClassifier {
    rules: Vec<KeywordRule>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(vec![KeywordRule::new("weather", "weather"), KeywordRule::new("news", "news")])
    }
}

impl KeywordClassifier {
    /// Rules with an empty keyword would match everything and are dropped.
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        Self { rules: rules.into_iter().filter(|rule| !rule.keyword.is_empty()).collect() }
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }
}

impl IntentClassifier for KeywordClassifier {
    fn classify(&self, utterance: &str) -> String {
        let normalized = normalize_text(utterance);
        self.rules
            .iter()
            .find(|rule| normalized.contains(&rule.keyword))
            .map(|rule| rule.intent.clone())
            .unwrap_or_else(|| UNKNOWN_INTENT.to_string())
    }
}

fn normalize_text(text: &str) -> String {
    text.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{IntentClassifier, KeywordClassifier, KeywordRule, UNKNOWN_INTENT};

    #[test]
    fn matches_keywords_case_insensitively() {
        let classifier = KeywordClassifier::default();
        assert_eq!(classifier.classify("What's the WEATHER like today?"), "weather");
        assert_eq!(classifier.classify("Tell me the News"), "news");
    }

    #[test]
    fn first_rule_wins_when_several_match() {
        let classifier = KeywordClassifier::default();
        assert_eq!(classifier.classify("news about the weather"), "weather");
    }

    #[test]
    fn unmatched_and_empty_input_fall_back_to_unknown() {
        let classifier = KeywordClassifier::default();
        assert_eq!(classifier.classify(""), UNKNOWN_INTENT);
        assert_eq!(classifier.classify("play some music"), UNKNOWN_INTENT);
    }

    #[test]
    fn custom_rules_are_normalized_and_ordered() {
        let classifier = KeywordClassifier::new(vec![
            KeywordRule::new("Hello", "greeting"),
            KeywordRule::new("", "catch_all"),
            KeywordRule::new("hell", "complaint"),
        ]);

        assert_eq!(classifier.rules().len(), 2);
        assert_eq!(classifier.classify("hello there"), "greeting");
        assert_eq!(classifier.classify("what the hell"), "complaint");
        assert_eq!(classifier.classify("goodbye"), UNKNOWN_INTENT);
    }

    #[test]
    fn classification_is_deterministic_over_common_phrases() {
        let classifier = KeywordClassifier::default();
        let phrases = [
            "",
            " ",
            "weather please",
            "Tell me the news",
            "Is it going to rain?",
            "WEATHERMAN",
            "newsletter signup",
            "¿Qué tiempo hace?",
            "\u{1F326} weather",
        ];

        for phrase in phrases {
            let first = classifier.classify(phrase);
            let second = classifier.classify(phrase);
            assert_eq!(first, second, "classification of `{phrase}` must be stable");
            assert!(!first.is_empty(), "classification of `{phrase}` must yield a label");
        }
    }
}
