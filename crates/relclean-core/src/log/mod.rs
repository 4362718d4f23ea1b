//! Execution logs
//!
//! An execution log collects the messages of a single (non dry-run) cleanup
//! run. Messages are either literal text or a localization key with
//! positional arguments, resolved when the log is displayed.

use crate::localization::Localizer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Messages recorded during one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLog {
    /// Identifier of the service that produced the log
    pub service: String,
    pub created_at: DateTime<Utc>,
    /// Acting user, if known
    pub created_by: Option<i64>,
    pub messages: Vec<LogMessage>,
}

/// A single log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogMessage {
    Text(String),
    Localized { key: String, arguments: Vec<String> },
}

impl ExecutionLog {
    pub fn new(service: impl Into<String>, created_by: Option<i64>) -> Self {
        Self {
            service: service.into(),
            created_at: Utc::now(),
            created_by,
            messages: Vec::new(),
        }
    }

    pub fn push(&mut self, message: LogMessage) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Resolve every message to text
    pub fn render(&self, localizer: &dyn Localizer) -> Vec<String> {
        self.messages.iter().map(|m| m.render(localizer)).collect()
    }
}

impl LogMessage {
    /// Resolve to text, falling back to the raw key
    pub fn render(&self, localizer: &dyn Localizer) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Localized { key, arguments } => localizer
                .translate(key, arguments)
                .unwrap_or_else(|| key.clone()),
        }
    }
}
