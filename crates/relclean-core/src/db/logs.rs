//! Execution log persistence

use super::Database;
use crate::error::Result;
use crate::log::{ExecutionLog, LogMessage};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, OptionalExtension};

/// Stored log overview
#[derive(Debug, Clone, serde::Serialize)]
pub struct LogSummary {
    pub id: i64,
    pub service: String,
    pub created_at: String,
    pub created_by: Option<i64>,
    pub message_count: usize,
}

impl Database {
    /// Persist a log with its messages, returning the new log id
    pub fn save_log(&self, log: &ExecutionLog) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO cleanup_log (service, created_at, created_by) VALUES (?1, ?2, ?3)",
            params![log.service, log.created_at.to_rfc3339(), log.created_by],
        )?;
        let log_id = tx.last_insert_rowid();

        for (position, message) in log.messages.iter().enumerate() {
            let (text, key, arguments) = match message {
                LogMessage::Text(text) => (Some(text.as_str()), None, None),
                LogMessage::Localized { key, arguments } => (
                    None,
                    Some(key.as_str()),
                    Some(serde_json::to_string(arguments)?),
                ),
            };
            tx.execute(
                "INSERT INTO cleanup_log_message (log_id, position, message, key, arguments)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![log_id, position as i64, text, key, arguments],
            )?;
        }

        tx.commit()?;
        tracing::debug!(log_id, service = %log.service, messages = log.len(), "execution log saved");
        Ok(log_id)
    }

    /// List stored logs, newest first
    pub fn list_logs(&self, limit: usize) -> Result<Vec<LogSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT l.id, l.service, l.created_at, l.created_by,
                    (SELECT COUNT(*) FROM cleanup_log_message m WHERE m.log_id = l.id)
             FROM cleanup_log l
             ORDER BY l.created_at DESC, l.id DESC
             LIMIT ?1",
        )?;

        let results = stmt
            .query_map(params![limit as i64], |row| {
                Ok(LogSummary {
                    id: row.get(0)?,
                    service: row.get(1)?,
                    created_at: row.get(2)?,
                    created_by: row.get(3)?,
                    message_count: row.get::<_, i64>(4)? as usize,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(results)
    }

    /// Load a stored log with its messages
    pub fn load_log(&self, log_id: i64) -> Result<Option<ExecutionLog>> {
        let header = self
            .conn
            .query_row(
                "SELECT service, created_at, created_by FROM cleanup_log WHERE id = ?1",
                params![log_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<i64>>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((service, created_at, created_by)) = header else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT message, key, arguments FROM cleanup_log_message
             WHERE log_id = ?1 ORDER BY position",
        )?;
        let rows = stmt
            .query_map(params![log_id], |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut messages = Vec::with_capacity(rows.len());
        for (text, key, arguments) in rows {
            let message = match key {
                Some(key) => LogMessage::Localized {
                    key,
                    arguments: match arguments {
                        Some(json) => serde_json::from_str(&json)?,
                        None => Vec::new(),
                    },
                },
                None => LogMessage::Text(text.unwrap_or_default()),
            };
            messages.push(message);
        }

        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Some(ExecutionLog {
            service,
            created_at,
            created_by,
            messages,
        }))
    }

    /// Delete logs older than the given number of days
    pub fn prune_logs(&self, older_than_days: u32) -> Result<usize> {
        let cutoff = (Utc::now() - Duration::days(older_than_days as i64)).to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM cleanup_log_message WHERE log_id IN
             (SELECT id FROM cleanup_log WHERE created_at < ?1)",
            params![cutoff],
        )?;
        let rows = tx.execute(
            "DELETE FROM cleanup_log WHERE created_at < ?1",
            params![cutoff],
        )?;
        tx.commit()?;
        Ok(rows)
    }
}
