//! Message sink shared by all cleanup services

use crate::localization::Localizer;
use crate::log::{ExecutionLog, LogMessage};

/// Collects the messages of a run into a lazily created [`ExecutionLog`].
///
/// In dry-run mode nothing is recorded and no log is ever created;
/// localized messages are still resolved so callers can show them.
pub struct Journal<'a> {
    service: &'static str,
    user: Option<i64>,
    dry_run: bool,
    localizer: &'a dyn Localizer,
    log: Option<ExecutionLog>,
}

impl<'a> Journal<'a> {
    pub fn new(service: &'static str, user: Option<i64>, localizer: &'a dyn Localizer) -> Self {
        Self {
            service,
            user,
            dry_run: true,
            localizer,
            log: None,
        }
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    pub fn localizer(&self) -> &'a dyn Localizer {
        self.localizer
    }

    /// Record a literal message
    pub fn add_message(&mut self, message: impl Into<String>) {
        if self.dry_run {
            return;
        }
        self.log_mut().push(LogMessage::Text(message.into()));
    }

    /// Record a localized message and return its resolved text.
    ///
    /// An unknown key is reported and falls back to the key itself.
    pub fn add_localized(&mut self, key: &str, arguments: &[String]) -> String {
        if !self.dry_run {
            self.log_mut().push(LogMessage::Localized {
                key: key.to_string(),
                arguments: arguments.to_vec(),
            });
        }

        match self.localizer.translate(key, arguments) {
            Some(text) => text,
            None => {
                tracing::warn!(service = self.service, key, "message could not be localized");
                key.to_string()
            }
        }
    }

    pub fn log(&self) -> Option<&ExecutionLog> {
        self.log.as_ref()
    }

    pub fn take_log(&mut self) -> Option<ExecutionLog> {
        self.log.take()
    }

    fn log_mut(&mut self) -> &mut ExecutionLog {
        let (service, user) = (self.service, self.user);
        self.log
            .get_or_insert_with(|| ExecutionLog::new(service, user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localization::Catalog;

    #[test]
    fn test_dry_run_never_creates_log() {
        let catalog = Catalog::with_defaults();
        let mut journal = Journal::new("corruptRelations", Some(1), &catalog);
        assert!(journal.dry_run());

        journal.add_message("hidden");
        let text = journal.add_localized("corrupt_relations.nothing_to_do", &[]);

        assert_eq!(text, "Nothing to do, no corrupt M:N relations found.");
        assert!(journal.log().is_none());
    }

    #[test]
    fn test_log_created_on_first_message() {
        let catalog = Catalog::with_defaults();
        let mut journal = Journal::new("corruptRelations", Some(4), &catalog);
        journal.set_dry_run(false);
        assert!(journal.log().is_none());

        journal.add_message("one");
        journal.add_localized("corrupt_relations.no_relations", &[]);

        let log = journal.take_log().unwrap();
        assert_eq!(log.service, "corruptRelations");
        assert_eq!(log.created_by, Some(4));
        assert_eq!(log.len(), 2);
        assert!(journal.log().is_none());
    }

    #[test]
    fn test_unknown_key_falls_back_to_key() {
        let catalog = Catalog::new();
        let mut journal = Journal::new("x", None, &catalog);
        assert_eq!(journal.add_localized("some.key", &[]), "some.key");
    }
}
