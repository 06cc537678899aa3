//! Response-generation strategies behind a uniform reply contract.

pub mod generative;
pub mod retrieval;
pub mod rule_based;

pub use generative::GenerativeResponder;
pub use retrieval::RetrievalResponder;
pub use rule_based::RuleBasedResponder;
