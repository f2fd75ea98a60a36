// Interview prep pipeline: requirement extraction, template library,
// per-category content generation and the concurrent orchestrator,
// plus cover letters and rejection analyses on the same fallback contract.
// All LLM calls go through llm_client; nothing here talks HTTP directly.

pub mod content;
pub mod documents;
pub mod handlers;
pub mod orchestrator;
pub mod prompts;
pub mod requirements;
pub mod templates;

#[cfg(test)]
pub(crate) mod test_support;
