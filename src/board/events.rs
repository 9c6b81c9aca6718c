use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::error;

use super::transfer::MoveState;

/// Text shown to the user when a stage move is rolled back.
pub const MOVE_FAILED_MESSAGE: &str = "Failed to update job status. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Error,
}

impl NotificationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

impl FromStr for NotificationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Self::Info),
            "error" => Ok(Self::Error),
            _ => Err(format!("Invalid notification level: {}", s)),
        }
    }
}

// ── Board event types ────────────────────────────────────────────────

/// Events published by a board session for views and notification toasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum BoardEvent {
    BoardLoaded {
        workflow_id: i64,
        stage_count: usize,
        job_count: usize,
        skipped_jobs: usize,
    },
    BoardLoadFailed {
        workflow_id: i64,
        error: String,
    },
    JobMoved {
        job_id: i64,
        from_stage: i64,
        to_stage: i64,
        position: usize,
        state: MoveState,
    },
    JobReordered {
        job_id: i64,
        stage_id: i64,
        position: usize,
    },
    MoveConfirmed {
        job_id: i64,
        stage_id: i64,
    },
    MoveRolledBack {
        job_id: i64,
        stage_id: i64,
        position: usize,
        reason: String,
    },
    /// Transient, dismissible user notification.
    Notification {
        level: NotificationLevel,
        message: String,
    },
}

impl BoardEvent {
    pub fn move_failed() -> Self {
        Self::Notification {
            level: NotificationLevel::Error,
            message: MOVE_FAILED_MESSAGE.to_string(),
        }
    }
}

pub fn broadcast_event(tx: &broadcast::Sender<String>, event: &BoardEvent) {
    match serde_json::to_string(event) {
        Ok(json) => {
            let _ = tx.send(json); // Ignore error if no receivers
        }
        Err(e) => {
            error!(error = %e, "Failed to serialize BoardEvent");
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
