//! Linguistic annotation seam: tokens, part-of-speech tags, named entities and
//! sentiment. Every operation is a pure function of the input text.
//!
//! [`LexiconAnnotator`] is a rule-and-word-list implementation good enough for
//! short assistant queries. A statistical backend can replace it behind the
//! [`Annotator`] trait.

use serde::{Deserialize, Serialize};

pub trait Annotator: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
    fn pos_tag(&self, text: &str) -> Vec<TaggedToken>;
    fn named_entities(&self, text: &str) -> Vec<Entity>;
    fn sentiment(&self, text: &str) -> Sentiment;
}

/// Universal part-of-speech categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartOfSpeech {
    Noun,
    Propn,
    Verb,
    Aux,
    Adj,
    Adv,
    Pron,
    Det,
    Adp,
    Cconj,
    Part,
    Num,
    Punct,
    Sym,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedToken {
    pub text: String,
    pub pos: PartOfSpeech,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityLabel {
    Name,
    Money,
    Percent,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    /// Confidence in `[0.5, 1.0)`.
    pub score: f32,
}

const DETERMINERS: &[&str] =
    &["the", "a", "an", "this", "that", "these", "those", "every", "some", "any", "each", "no"];
const PRONOUNS: &[&str] = &[
    "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them", "my", "your",
    "his", "its", "our", "their", "what", "who", "which",
];
const ADPOSITIONS: &[&str] = &[
    "in", "on", "at", "by", "for", "with", "about", "of", "to", "from", "into", "over", "under",
    "after", "before", "between", "through", "like",
];
const CONJUNCTIONS: &[&str] = &["and", "or", "but", "nor", "so", "yet"];
const AUXILIARIES: &[&str] = &[
    "is", "am", "are", "was", "were", "be", "been", "being", "do", "does", "did", "have", "has",
    "had", "will", "would", "can", "could", "shall", "should", "may", "might", "must", "'s",
];
const NUMBER_WORDS: &[&str] = &[
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "hundred",
    "thousand", "million", "billion", "trillion",
];
const SCALE_WORDS: &[&str] = &["thousand", "million", "billion", "trillion"];
const ADJECTIVE_SUFFIXES: &[&str] = &["ous", "ful", "ive", "able", "ible", "al", "ic", "less"];

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "love", "like", "happy", "sunny", "surged", "gain", "gains",
    "nice", "wonderful", "amazing", "best", "thanks", "thank", "helpful", "glad", "awesome",
];
const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "hate", "sad", "angry", "fell", "dropped", "loss", "losses",
    "worst", "poor", "wrong", "broken", "useless", "annoying", "rain", "crash",
];
const NEGATORS: &[&str] = &["not", "no", "never", "n't"];

#[derive(Clone, Debug, Default)]
pub struct LexiconAnnotator;

impl LexiconAnnotator {
    pub fn new() -> Self {
        Self
    }
}

impl Annotator for LexiconAnnotator {
    fn tokenize(&self, text: &str) -> Vec<String> {
        tokenize(text)
    }

    fn pos_tag(&self, text: &str) -> Vec<TaggedToken> {
        tag_tokens(tokenize(text))
    }

    fn named_entities(&self, text: &str) -> Vec<Entity> {
        extract_entities(&tag_tokens(tokenize(text)))
    }

    fn sentiment(&self, text: &str) -> Sentiment {
        score_sentiment(&tokenize(text))
    }
}

fn is_split_punctuation(character: char) -> bool {
    matches!(
        character,
        '.' | ',' | '!' | '?' | ';' | ':' | '"' | '(' | ')' | '[' | ']' | '{' | '}' | '$' | '%'
    )
}

/// "U.K." style abbreviations keep their final period.
fn is_abbreviation(word: &str) -> bool {
    word.len() > 2 && word[..word.len() - 1].contains('.')
}

fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();

    for chunk in text.split_whitespace() {
        let mut rest = chunk;

        while let Some(first) = rest.chars().next() {
            if !is_split_punctuation(first) {
                break;
            }
            tokens.push(first.to_string());
            rest = &rest[first.len_utf8()..];
        }

        let mut trailing = Vec::new();
        while let Some(last) = rest.chars().last() {
            if !is_split_punctuation(last) || (last == '.' && is_abbreviation(rest)) {
                break;
            }
            trailing.push(last.to_string());
            rest = &rest[..rest.len() - last.len_utf8()];
        }

        if !rest.is_empty() {
            push_with_clitics(&mut tokens, rest);
        }
        tokens.extend(trailing.into_iter().rev());
    }

    tokens
}

fn push_with_clitics(tokens: &mut Vec<String>, word: &str) {
    let lowered = word.to_lowercase();
    for clitic in ["n't", "'s", "'re", "'ll", "'ve", "'m", "'d"] {
        if lowered.len() > clitic.len() && lowered.ends_with(clitic) {
            let split_at = word.len() - clitic.len();
            if word.is_char_boundary(split_at) {
                tokens.push(word[..split_at].to_string());
                tokens.push(word[split_at..].to_string());
                return;
            }
        }
    }
    tokens.push(word.to_string());
}

fn is_numeric(token: &str) -> bool {
    let digits = token.replace([',', '.'], "");
    !digits.is_empty() && digits.chars().all(|character| character.is_ascii_digit())
}

fn starts_uppercase(token: &str) -> bool {
    token.chars().next().is_some_and(char::is_uppercase)
}

fn base_tag(token: &str) -> PartOfSpeech {
    let lowered = token.to_lowercase();
    let word = lowered.as_str();

    if token.chars().all(|character| matches!(character, '$' | '%' | '#' | '&' | '+' | '=')) {
        return PartOfSpeech::Sym;
    }
    if token.chars().all(|character| character.is_ascii_punctuation()) {
        return PartOfSpeech::Punct;
    }
    if is_numeric(token) || NUMBER_WORDS.contains(&word) {
        return PartOfSpeech::Num;
    }
    if DETERMINERS.contains(&word) {
        return PartOfSpeech::Det;
    }
    if PRONOUNS.contains(&word) {
        return PartOfSpeech::Pron;
    }
    if ADPOSITIONS.contains(&word) {
        return PartOfSpeech::Adp;
    }
    if CONJUNCTIONS.contains(&word) {
        return PartOfSpeech::Cconj;
    }
    if AUXILIARIES.contains(&word) {
        return PartOfSpeech::Aux;
    }
    if NEGATORS.contains(&word) {
        return PartOfSpeech::Part;
    }
    if word.len() > 3 && word.ends_with("ly") {
        return PartOfSpeech::Adv;
    }
    if word.len() > 4 && (word.ends_with("ing") || word.ends_with("ed")) {
        return PartOfSpeech::Verb;
    }
    if word.len() > 4 && ADJECTIVE_SUFFIXES.iter().any(|suffix| word.ends_with(suffix)) {
        return PartOfSpeech::Adj;
    }
    PartOfSpeech::Noun
}

fn tag_tokens(tokens: Vec<String>) -> Vec<TaggedToken> {
    let base = tokens.iter().map(|token| base_tag(token)).collect::<Vec<_>>();
    let sentence_initial = (0..tokens.len())
        .map(|index| index == 0 || matches!(tokens[index - 1].as_str(), "." | "!" | "?"))
        .collect::<Vec<_>>();

    tokens
        .into_iter()
        .enumerate()
        .map(|(index, text)| {
            let mut pos = base[index];
            let open_class =
                matches!(pos, PartOfSpeech::Noun | PartOfSpeech::Adj | PartOfSpeech::Verb);
            if open_class && starts_uppercase(&text) {
                // A capitalized first word is only a name when it reads as a subject.
                let is_subject = base
                    .get(index + 1)
                    .is_some_and(|next| matches!(next, PartOfSpeech::Aux | PartOfSpeech::Verb));
                if !sentence_initial[index] || is_subject {
                    pos = PartOfSpeech::Propn;
                }
            }
            TaggedToken { text, pos }
        })
        .collect()
}

fn extract_entities(tagged: &[TaggedToken]) -> Vec<Entity> {
    let mut entities = Vec::new();
    let mut index = 0;

    while index < tagged.len() {
        let token = &tagged[index];

        if token.text == "$" && tagged.get(index + 1).is_some_and(|next| is_numeric(&next.text)) {
            let mut text = format!("${}", tagged[index + 1].text);
            index += 2;
            if let Some(scale) = tagged.get(index) {
                if SCALE_WORDS.contains(&scale.text.to_lowercase().as_str()) {
                    text.push(' ');
                    text.push_str(&scale.text);
                    index += 1;
                }
            }
            entities.push(Entity { text, label: EntityLabel::Money });
            continue;
        }

        if is_numeric(&token.text) {
            if let Some(next) = tagged.get(index + 1) {
                if next.text == "%" || next.text.eq_ignore_ascii_case("percent") {
                    let separator = if next.text == "%" { "" } else { " " };
                    entities.push(Entity {
                        text: format!("{}{separator}{}", token.text, next.text),
                        label: EntityLabel::Percent,
                    });
                    index += 2;
                    continue;
                }
            }
        }

        if token.pos == PartOfSpeech::Propn {
            let start = index;
            while index < tagged.len() && tagged[index].pos == PartOfSpeech::Propn {
                index += 1;
            }
            let text =
                tagged[start..index].iter().map(|token| token.text.as_str()).collect::<Vec<_>>();
            entities.push(Entity { text: text.join(" "), label: EntityLabel::Name });
            continue;
        }

        index += 1;
    }

    entities
}

fn score_sentiment(tokens: &[String]) -> Sentiment {
    let mut total = 0i32;
    let mut negate_next = false;

    for token in tokens {
        let word = token.to_lowercase();
        if NEGATORS.contains(&word.as_str()) {
            negate_next = true;
            continue;
        }

        let polarity = if POSITIVE_WORDS.contains(&word.as_str()) {
            1
        } else if NEGATIVE_WORDS.contains(&word.as_str()) {
            -1
        } else {
            0
        };
        if polarity != 0 {
            total += if negate_next { -polarity } else { polarity };
            negate_next = false;
        } else if matches!(word.as_str(), "." | "!" | "?" | "," | "but") {
            negate_next = false;
        }
    }

    let magnitude = total.unsigned_abs() as f32;
    Sentiment {
        label: if total < 0 { SentimentLabel::Negative } else { SentimentLabel::Positive },
        score: 0.5 + 0.5 * magnitude / (magnitude + 1.0),
    }
}
