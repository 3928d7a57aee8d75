// ============================================================================
// aved-core/src/context.rs
// ============================================================================
//
// APPLICATION CONTEXT: Shared services passed explicitly to components
//
// Holds what the editor kept in process-wide singletons: the configuration,
// the history of launched commands, the error log, and the process
// launching services. Tests build their own context with mock services.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};

use crate::config::CoreConfig;
use crate::error::CoreError;
use crate::external::{CommandRunner, Prober, ProcessProber, SystemRunner, ToolLocator};
use crate::util::lock;

/// A launched command line and when it was launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Local>,
    pub command: String,
}

/// Append-only record of command lines launched through the context.
#[derive(Debug, Default)]
pub struct CommandHistory {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl CommandHistory {
    pub fn record(&self, command: impl Into<String>) {
        let command = command.into();
        log::debug!("History: {}", command);
        lock(&self.entries).push(HistoryEntry {
            timestamp: Local::now(),
            command,
        });
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        lock(&self.entries).clone()
    }

    pub fn last(&self) -> Option<HistoryEntry> {
        lock(&self.entries).last().cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An error reported to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEntry {
    pub timestamp: DateTime<Local>,
    pub message: String,
}

/// Errors collected for display by the front end.
#[derive(Debug, Default)]
pub struct ErrorLog {
    entries: Mutex<Vec<ErrorEntry>>,
}

impl ErrorLog {
    pub fn record(&self, message: impl Into<String>) {
        lock(&self.entries).push(ErrorEntry {
            timestamp: Local::now(),
            message: message.into(),
        });
    }

    pub fn entries(&self) -> Vec<ErrorEntry> {
        lock(&self.entries).clone()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }
}

/// Configuration and services shared by the pipeline components.
pub struct AppContext {
    config: CoreConfig,
    history: CommandHistory,
    errors: ErrorLog,
    runner: Arc<dyn CommandRunner>,
    prober: Arc<dyn Prober>,
}

impl AppContext {
    /// A context that launches real processes.
    pub fn new(config: CoreConfig) -> Self {
        let runner = Arc::new(SystemRunner::new(config.fallback_dirs.clone()));
        Self::with_services(config, runner, Arc::new(ProcessProber))
    }

    /// A context with caller-supplied process services.
    pub fn with_services(
        config: CoreConfig,
        runner: Arc<dyn CommandRunner>,
        prober: Arc<dyn Prober>,
    ) -> Self {
        Self {
            config,
            history: CommandHistory::default(),
            errors: ErrorLog::default(),
            runner,
            prober,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    /// Locator over the current `PATH` plus the configured fallbacks.
    pub fn locator(&self) -> ToolLocator {
        ToolLocator::from_config(&self.config, Arc::clone(&self.prober))
    }

    /// Logs `err` and keeps it in the error log.
    pub fn record_error(&self, err: &CoreError) {
        log::error!("{}", err);
        self.errors.record(err.to_string());
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("history", &self.history.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_records_in_order() {
        let history = CommandHistory::default();
        assert!(history.is_empty());
        history.record("tar -x");
        history.record("transcode -i a.avi");
        assert_eq!(history.len(), 2);
        assert_eq!(history.last().unwrap().command, "transcode -i a.avi");
        assert_eq!(history.entries()[0].command, "tar -x");
    }

    #[test]
    fn test_record_error_keeps_message() {
        let ctx = AppContext::new(CoreConfig::default());
        ctx.record_error(&CoreError::ToolNotFound("avidump".to_string()));
        let entries = ctx.errors().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "Command not found: avidump");
    }
}
