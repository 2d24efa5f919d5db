//! External advisor seam
//!
//! The language model is an unreliable capability behind one trait
//! (`LanguageModel`). Everything that talks to it degrades to a deterministic
//! answer on failure; callers never see whether the model was down or talking
//! nonsense.
//!
//! - **llm**: the `LanguageModel` trait, `Prompt`, `ModelError`
//! - **openai**: chat-completions implementation over `reqwest`
//! - **context**: verbatim user context passed into prompts
//! - **prompts**: prompt builders for strategy advice and plan generation
//! - **strategy**: the strategy advisor with its heuristic fallback

pub mod context;
pub mod llm;
pub mod openai;
pub mod prompts;
pub mod strategy;

pub use context::UserContext;
pub use llm::{extract_json_object, LanguageModel, ModelError, Prompt};
pub use openai::OpenAiClient;
pub use strategy::{RecommendationSource, StrategyAdvisor, StrategyRecommendation};
