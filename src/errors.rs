//! Typed error hierarchy for the workflow board.
//!
//! `BoardError` covers both the remote collaborator (`RemoteUnavailable`,
//! `NotFound`, `StageUpdateRejected`, `Decode`) and local gesture validation
//! (`UnknownStage`, `JobNotInStage`). `InconsistentStageReference` exists so
//! callers can name the condition, but the bucketing index never raises it:
//! jobs pointing at unknown stages are skipped.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Remote service unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("{what} not found")]
    NotFound { what: String },

    #[error("Stage update for job {job_id} to stage {stage_id} rejected: {reason}")]
    StageUpdateRejected {
        job_id: i64,
        stage_id: i64,
        reason: String,
    },

    #[error("Job {job_id} references stage {stage_id} which is not part of the active workflow")]
    InconsistentStageReference { job_id: i64, stage_id: i64 },

    #[error("Stage {stage_id} is not a column of the active board")]
    UnknownStage { stage_id: i64 },

    #[error("Job {job_id} is not in stage {stage_id}")]
    JobNotInStage { job_id: i64, stage_id: i64 },

    #[error("Failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BoardError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// True for failures that a drag rollback recovers from locally.
    pub fn is_recoverable_move_failure(&self) -> bool {
        matches!(
            self,
            Self::StageUpdateRejected { .. } | Self::RemoteUnavailable(_) | Self::Decode { .. }
        )
    }
}

pub type BoardResult<T> = std::result::Result<T, BoardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_update_rejected_carries_ids() {
        let err = BoardError::StageUpdateRejected {
            job_id: 7,
            stage_id: 3,
            reason: "invalid transition".into(),
        };
        match &err {
            BoardError::StageUpdateRejected {
                job_id, stage_id, ..
            } => {
                assert_eq!(*job_id, 7);
                assert_eq!(*stage_id, 3);
            }
            _ => panic!("Expected StageUpdateRejected"),
        }
        let msg = err.to_string();
        assert!(msg.contains("job 7"));
        assert!(msg.contains("invalid transition"));
    }

    #[test]
    fn not_found_formats_subject() {
        let err = BoardError::not_found("Workflow 12");
        assert_eq!(err.to_string(), "Workflow 12 not found");
    }

    #[test]
    fn recoverable_move_failures() {
        assert!(BoardError::RemoteUnavailable("down".into()).is_recoverable_move_failure());
        assert!(
            BoardError::StageUpdateRejected {
                job_id: 1,
                stage_id: 2,
                reason: "no".into()
            }
            .is_recoverable_move_failure()
        );
        assert!(!BoardError::UnknownStage { stage_id: 9 }.is_recoverable_move_failure());
    }

    #[test]
    fn converts_from_anyhow() {
        let err: BoardError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, BoardError::Other(_)));
    }

    #[test]
    fn board_error_implements_std_error() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&BoardError::UnknownStage { stage_id: 1 });
    }
}
