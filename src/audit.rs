//! Decision log
//!
//! Append-only record of every decision the engine makes. Entries are
//! hash-chained: each hash covers the entry's own fields plus the hash of
//! the entry before it, so any later edit or reordering shows up in
//! [`DecisionLog::verify_integrity`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// One immutable log record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionLogEntry {
    sequence: u64,
    id: Uuid,
    timestamp: DateTime<Utc>,
    action: String,
    reason: String,
    severity: Severity,
    hash: String,
    previous_hash: Option<String>,
}

impl DecisionLogEntry {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn previous_hash(&self) -> Option<&str> {
        self.previous_hash.as_deref()
    }

    fn compute_hash(&self) -> String {
        chain_hash(
            self.sequence,
            &self.timestamp,
            &self.action,
            &self.reason,
            self.severity,
            self.previous_hash.as_deref(),
        )
    }
}

fn chain_hash(
    sequence: u64,
    timestamp: &DateTime<Utc>,
    action: &str,
    reason: &str,
    severity: Severity,
    previous_hash: Option<&str>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!(
        "{}:{}:{}:{}:{}",
        sequence,
        timestamp.to_rfc3339(),
        action,
        reason,
        severity
    ));
    if let Some(prev) = previous_hash {
        hasher.update(prev);
    }
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, Default)]
pub struct DecisionLog {
    entries: Vec<DecisionLogEntry>,
}

impl DecisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return a copy of it. Never fails.
    pub fn log(
        &mut self,
        action: impl Into<String>,
        reason: impl Into<String>,
        severity: Severity,
    ) -> DecisionLogEntry {
        let action = action.into();
        let reason = reason.into();
        let sequence = self.entries.len() as u64;
        let timestamp = Utc::now();
        let previous_hash = self.entries.last().map(|e| e.hash.clone());
        let hash = chain_hash(
            sequence,
            &timestamp,
            &action,
            &reason,
            severity,
            previous_hash.as_deref(),
        );

        match severity {
            Severity::Info => info!(sequence, action = %action, "{}", reason),
            Severity::Warning => warn!(sequence, action = %action, "{}", reason),
            Severity::Error | Severity::Critical => {
                error!(sequence, action = %action, severity = %severity, "{}", reason)
            }
        }

        let entry = DecisionLogEntry {
            sequence,
            id: Uuid::new_v4(),
            timestamp,
            action,
            reason,
            severity,
            hash,
            previous_hash,
        };
        debug!(hash = %entry.hash, "decision log entry appended");

        self.entries.push(entry.clone());
        entry
    }

    /// Last `n` entries, oldest first
    pub fn recent(&self, n: usize) -> &[DecisionLogEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecisionLogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recompute every hash and check each link to its predecessor
    pub fn verify_integrity(&self) -> bool {
        let mut previous: Option<&str> = None;
        for (index, entry) in self.entries.iter().enumerate() {
            if entry.sequence != index as u64
                || entry.previous_hash.as_deref() != previous
                || entry.compute_hash() != entry.hash
            {
                warn!(sequence = entry.sequence, "decision log chain broken");
                return false;
            }
            previous = Some(&entry.hash);
        }
        true
    }
}
