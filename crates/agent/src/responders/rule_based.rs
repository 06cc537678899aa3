use std::sync::Arc;

use parlance_core::{IntentTaxonomy, Reply};
use rand::seq::SliceRandom;
use rand::Rng;

/// Picks a canned reply for an intent from the taxonomy.
///
/// Unknown intents are not an error: they yield [`Reply::Fallback`].
#[derive(Clone, Debug)]
pub struct RuleBasedResponder {
    taxonomy: Arc<IntentTaxonomy>,
}

impl RuleBasedResponder {
    pub fn new(taxonomy: Arc<IntentTaxonomy>) -> Self {
        Self { taxonomy }
    }

    pub fn taxonomy(&self) -> &IntentTaxonomy {
        &self.taxonomy
    }

    pub fn respond(&self, intent: &str) -> Reply {
        self.respond_with_rng(intent, &mut rand::thread_rng())
    }

    /// Uniform choice among the intent's candidates using the supplied RNG.
    pub fn respond_with_rng<R>(&self, intent: &str, rng: &mut R) -> Reply
    where
        R: Rng + ?Sized,
    {
        match self.taxonomy.replies(intent).and_then(|replies| replies.choose(rng)) {
            Some(reply) => Reply::Answer(reply.clone()),
            None => Reply::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use parlance_core::{IntentTaxonomy, Reply, FALLBACK_REPLY};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::RuleBasedResponder;

    fn responder(raw: &str) -> RuleBasedResponder {
        let taxonomy = IntentTaxonomy::from_json_str(raw).expect("valid taxonomy");
        RuleBasedResponder::new(Arc::new(taxonomy))
    }

    #[test]
    fn known_intent_returns_candidate_reply() {
        let responder = responder(r#"{"weather": ["Sunny today."]}"#);
        assert_eq!(responder.respond("weather"), Reply::Answer("Sunny today.".to_string()));
    }

    #[test]
    fn absent_intent_returns_fixed_fallback() {
        let responder = responder(r#"{"weather": ["Sunny today."]}"#);
        for intent in ["news", "unknown", "", "Weather"] {
            let reply = responder.respond(intent);
            assert!(reply.is_fallback(), "`{intent}` should fall back");
            assert_eq!(reply.text(), FALLBACK_REPLY);
        }
    }

    #[test]
    fn replies_are_always_drawn_from_the_intent_candidates() {
        let responder = responder(r#"{"greeting": ["Hi!", "Hello!", "Hey there!"]}"#);
        let candidates = ["Hi!", "Hello!", "Hey there!"];
        for _ in 0..200 {
            let reply = responder.respond("greeting");
            assert!(candidates.contains(&reply.text()), "unexpected reply {reply:?}");
        }
    }

    #[test]
    fn selection_is_approximately_uniform() {
        let responder = responder(r#"{"greeting": ["Hi!", "Hello!", "Hey there!"]}"#);
        let mut rng = StdRng::seed_from_u64(7);
        let draws = 3_000;

        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..draws {
            let reply = responder.respond_with_rng("greeting", &mut rng);
            *counts.entry(reply.into_text()).or_default() += 1;
        }

        assert_eq!(counts.len(), 3);
        for (reply, count) in counts {
            assert!(
                (800..=1_200).contains(&count),
                "reply `{reply}` drawn {count} times out of {draws}"
            );
        }
    }
}
