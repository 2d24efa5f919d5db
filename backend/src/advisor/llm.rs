//! Language model abstraction
//!
//! A single async method returning raw text or a typed failure. Parsing and
//! validation of that text are the caller's job.

use async_trait::async_trait;
use thiserror::Error;

/// Failures talking to a language model
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Model credentials missing: {0}")]
    MissingCredentials(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Model API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Model returned no content")]
    EmptyResponse,
}

/// One request to the model
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    /// Ask the provider to constrain output to a JSON object
    pub json_mode: bool,
}

impl Prompt {
    pub fn json(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            json_mode: true,
        }
    }
}

/// A text-completion capability
///
/// Implementations must be shareable across concurrent optimization runs.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete `prompt`, returning the raw response text
    async fn complete(&self, prompt: &Prompt) -> Result<String, ModelError>;

    /// Model identifier for logs
    fn model_name(&self) -> &str;
}

/// Slice the first `{` .. last `}` span out of model output
///
/// Models wrap JSON in prose or code fences; this recovers the object text.
///
/// # Example
/// ```
/// use debt_optimizer_core::advisor::extract_json_object;
///
/// let text = "Sure! ```json\n{\"strategy\": \"snowball\"}\n```";
/// assert_eq!(extract_json_object(text), Some("{\"strategy\": \"snowball\"}"));
/// assert_eq!(extract_json_object("no json here"), None);
/// ```
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}
