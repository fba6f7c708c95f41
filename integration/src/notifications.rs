//! Notification sink for user-facing toasts and error reports

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use outreach_core::{OutreachError, RelocationError, StorageError, SystemError};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// Records may be in an inconsistent state
    Critical,
    /// An operation failed
    Error,
    /// Rejected input
    Warning,
    /// Informational message
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
}

/// One fire-and-forget message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub kind: ToastKind,
    pub message: String,
    pub severity: ErrorSeverity,
    pub context: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn success(message: impl Into<String>, context: &str) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
            severity: ErrorSeverity::Info,
            context: context.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn failure(error: &OutreachError, context: &str) -> Self {
        Self {
            kind: ToastKind::Error,
            message: error.to_string(),
            severity: classify_error(error),
            context: context.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Receiver of success and error notices; delivery is never awaited on
/// for correctness
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: Notification);
}

/// Classify error severity
pub fn classify_error(error: &OutreachError) -> ErrorSeverity {
    match error {
        OutreachError::Validation { .. } => ErrorSeverity::Warning,
        OutreachError::Storage { source } => match source {
            StorageError::RecordNotFound { .. } => ErrorSeverity::Warning,
            StorageError::Backend { .. } => ErrorSeverity::Error,
        },
        OutreachError::Relocation { source } => match source {
            RelocationError::RolledBack { .. } => ErrorSeverity::Error,
            RelocationError::Inconsistent { .. } => ErrorSeverity::Critical,
        },
        OutreachError::System { source } => match source {
            SystemError::Configuration { .. } | SystemError::IO { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        },
    }
}

/// Default sink: logs every notice and keeps the most recent ones
pub struct NotificationCenter {
    /// Recent notifications for reporting
    recent: RwLock<Vec<Notification>>,
    /// Maximum number of notifications to keep
    max_entries: usize,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            recent: RwLock::new(Vec::new()),
            max_entries,
        }
    }

    pub async fn recent(&self) -> Vec<Notification> {
        self.recent.read().await.clone()
    }

    pub async fn stats(&self) -> NotificationStatistics {
        let recent = self.recent.read().await;

        let mut stats = NotificationStatistics {
            total: recent.len(),
            ..Default::default()
        };

        for entry in recent.iter() {
            match (entry.kind, entry.severity) {
                (ToastKind::Success, _) => stats.successes += 1,
                (ToastKind::Error, ErrorSeverity::Critical) => stats.critical += 1,
                (ToastKind::Error, ErrorSeverity::Error) => stats.errors += 1,
                (ToastKind::Error, _) => stats.warnings += 1,
            }
        }

        stats
    }

    pub async fn clear(&self) {
        self.recent.write().await.clear();
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationSink for NotificationCenter {
    async fn notify(&self, notification: Notification) {
        match (notification.kind, notification.severity) {
            (ToastKind::Success, _) => info!("{}: {}", notification.context, notification.message),
            (_, ErrorSeverity::Critical) => {
                error!("CRITICAL in {}: {}", notification.context, notification.message)
            }
            (_, ErrorSeverity::Error) => error!("{}: {}", notification.context, notification.message),
            _ => warn!("{}: {}", notification.context, notification.message),
        }

        let mut recent = self.recent.write().await;
        recent.push(notification);

        // Keep only recent entries
        if recent.len() > self.max_entries {
            let excess = recent.len() - self.max_entries;
            recent.drain(0..excess);
        }
    }
}

/// Counts over the retained notifications
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationStatistics {
    pub total: usize,
    pub successes: usize,
    pub critical: usize,
    pub errors: usize,
    pub warnings: usize,
}
