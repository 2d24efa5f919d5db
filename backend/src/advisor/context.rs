//! Free-form user context
//!
//! Income, stress level, goals and similar facts supplied by the host. The
//! engine never interprets them; they are rendered verbatim into prompts.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Ordered key/value context passed through to the model
///
/// # Example
/// ```
/// use debt_optimizer_core::UserContext;
///
/// let mut context = UserContext::new();
/// context.insert("goals", "Be debt free before 2030");
/// context.insert("monthly_income", 4200);
/// assert_eq!(
///     context.render(),
///     "- goals: Be debt free before 2030\n- monthly_income: 4200"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserContext(BTreeMap<String, Value>);

impl UserContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// One `- key: value` line per entry, strings unquoted
    pub fn render(&self) -> String {
        self.0
            .iter()
            .map(|(key, value)| match value {
                Value::String(s) => format!("- {}: {}", key, s),
                other => format!("- {}: {}", key, other),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl FromIterator<(String, Value)> for UserContext {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
