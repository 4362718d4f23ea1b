//! Cleanup service contract
//!
//! A cleanup service is a unit of work that scans the store, reports what it
//! found and, unless running dry, repairs it. Services borrow their
//! collaborators through a [`ServiceContext`] and record messages into a
//! [`Journal`].

mod journal;

pub use journal::Journal;

use crate::db::DataStore;
use crate::error::Result;
use crate::localization::Localizer;
use crate::log::ExecutionLog;
use crate::schema::SchemaProvider;
use serde::Serialize;
use std::fmt;

/// Localization key of the default outcome headline
pub const FALLBACK_HEADLINE_KEY: &str = "messages.fallback.headline";

/// Localization key of the default success message
pub const SUCCESS_MESSAGE_KEY: &str = "messages.success.message";

/// Collaborators a service runs against
#[derive(Clone, Copy)]
pub struct ServiceContext<'a> {
    pub store: &'a dyn DataStore,
    pub schema: &'a dyn SchemaProvider,
    pub localizer: &'a dyn Localizer,
    /// Acting user, recorded on execution logs
    pub user: Option<i64>,
}

impl<'a> ServiceContext<'a> {
    pub fn new(
        store: &'a dyn DataStore,
        schema: &'a dyn SchemaProvider,
        localizer: &'a dyn Localizer,
    ) -> Self {
        Self {
            store,
            schema,
            localizer,
            user: None,
        }
    }

    pub fn with_user(mut self, user: Option<i64>) -> Self {
        self.user = user;
        self
    }
}

/// The contract every cleanup service implements
pub trait CleanupService {
    /// Registry identifier of the service
    fn identifier(&self) -> &'static str;

    fn dry_run(&self) -> bool;

    /// Must be called before [`CleanupService::execute`]
    fn set_dry_run(&mut self, dry_run: bool);

    /// Run the cleanup and summarize the result
    fn execute(&mut self) -> Result<Outcome>;

    /// Log of the last run; `None` for dry runs or runs without messages
    fn log(&self) -> Option<&ExecutionLog>;

    fn take_log(&mut self) -> Option<ExecutionLog>;
}

/// Severity of a run outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Ok,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Ok => write!(f, "ok"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Summary returned by a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub severity: Severity,
    pub headline: String,
    pub message: String,
}

/// Build an outcome, filling headline and message from the fallback keys
pub fn outcome(
    localizer: &dyn Localizer,
    severity: Severity,
    message: Option<String>,
    headline: Option<String>,
) -> Outcome {
    let headline = headline
        .or_else(|| localizer.translate(FALLBACK_HEADLINE_KEY, &[]))
        .unwrap_or_else(|| FALLBACK_HEADLINE_KEY.to_string());
    let message = message
        .or_else(|| localizer.translate(SUCCESS_MESSAGE_KEY, &[]))
        .unwrap_or_else(|| SUCCESS_MESSAGE_KEY.to_string());

    Outcome {
        severity,
        headline,
        message,
    }
}

/// Informational outcome with the given message
pub fn info(localizer: &dyn Localizer, message: impl Into<String>) -> Outcome {
    outcome(localizer, Severity::Info, Some(message.into()), None)
}

/// Successful outcome; without a message the generic success text is used
pub fn success(localizer: &dyn Localizer, message: Option<String>) -> Outcome {
    outcome(localizer, Severity::Ok, message, None)
}
