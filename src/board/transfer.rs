//! Drag-transfer controller: optimistic stage moves with compensation.
//!
//! Each cross-column drop goes `Idle → Applied` synchronously (bucket move +
//! denormalized stage update on the job), then `Applied → Confirmed` or
//! `Applied → RolledBack` when the remote stage update resolves. The
//! controller never performs I/O itself; the caller issues the remote call
//! for the returned ticket and feeds the result back through [`complete`].
//!
//! Pending moves are tracked per job in issue order, so completions for
//! different jobs never interact and several drags of the same job resolve
//! against the newest one.
//!
//! [`complete`]: DragTransferController::complete

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::buckets::StageBuckets;
use super::directory::JobDirectory;
use super::models::{Job, Workflow};
use crate::errors::{BoardError, BoardResult};

/// A drop gesture as reported by the board view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropEvent {
    pub job_id: i64,
    pub source_stage: i64,
    pub source_index: usize,
    pub dest_stage: i64,
    pub dest_index: usize,
}

impl DropEvent {
    pub fn is_reorder(&self) -> bool {
        self.source_stage == self.dest_stage
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveState {
    Idle,
    Applied,
    Confirmed,
    RolledBack,
}

impl MoveState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Applied => "applied",
            Self::Confirmed => "confirmed",
            Self::RolledBack => "rolled_back",
        }
    }
}

impl std::fmt::Display for MoveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoveState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "applied" => Ok(Self::Applied),
            "confirmed" => Ok(Self::Confirmed),
            "rolled_back" => Ok(Self::RolledBack),
            _ => Err(format!("Invalid move state: {}", s)),
        }
    }
}

/// Identifies one in-flight move. `seq` is unique per controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveTicket {
    pub job_id: i64,
    pub seq: u64,
}

/// Everything needed to invert an applied move exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackRecord {
    pub job_id: i64,
    pub source_stage: i64,
    pub source_index: usize,
    pub source_stage_name: String,
    pub dest_stage: i64,
    pub dest_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingMove {
    pub ticket: MoveTicket,
    pub rollback: RollbackRecord,
    pub state: MoveState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// Same-column permutation; nothing to send.
    Reordered,
    /// Optimistically applied; the caller must send the stage update.
    Applied(MoveTicket),
}

/// Result of feeding a remote response back into the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Confirmed {
        ticket: MoveTicket,
        /// False when the server's stage differs from the local one (a newer
        /// local move exists), so only non-placement fields were taken.
        placement_merged: bool,
    },
    RolledBack {
        ticket: MoveTicket,
        record: RollbackRecord,
        reason: String,
    },
    /// Failed while a newer move of the same job is pending. The newer move
    /// inherits this move's rollback target; the board is not touched.
    Superseded { ticket: MoveTicket, reason: String },
    /// Unknown ticket: retired by a newer confirmation or discarded.
    Stale { ticket: MoveTicket },
}

impl Completion {
    pub fn ticket(&self) -> MoveTicket {
        match self {
            Self::Confirmed { ticket, .. }
            | Self::RolledBack { ticket, .. }
            | Self::Superseded { ticket, .. }
            | Self::Stale { ticket } => *ticket,
        }
    }

    pub fn state(&self) -> Option<MoveState> {
        match self {
            Self::Confirmed { .. } => Some(MoveState::Confirmed),
            Self::RolledBack { .. } | Self::Superseded { .. } => Some(MoveState::RolledBack),
            Self::Stale { .. } => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct DragTransferController {
    next_seq: u64,
    pending: HashMap<i64, Vec<PendingMove>>,
}

impl DragTransferController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a drop. Cross-column drops are applied optimistically and
    /// return a ticket for the remote call; same-column drops are reordered
    /// locally and need nothing further.
    pub fn on_drop(
        &mut self,
        buckets: &mut StageBuckets,
        directory: &mut JobDirectory,
        workflow: Option<&Workflow>,
        event: DropEvent,
    ) -> BoardResult<DropOutcome> {
        if event.is_reorder() {
            self.on_reorder_within_column(buckets, event)?;
            return Ok(DropOutcome::Reordered);
        }

        let from_index =
            buckets.move_local(event.job_id, event.source_stage, event.dest_stage, event.dest_index)?;
        if from_index != event.source_index {
            warn!(
                job_id = event.job_id,
                reported = event.source_index,
                actual = from_index,
                "Drop source index disagrees with board; using board position"
            );
        }

        let dest_stage_name = stage_name(workflow, event.dest_stage);
        let source_stage_name = match directory.get_mut(event.job_id) {
            Some(job) => {
                let previous = job.current_stage_name.clone();
                job.current_stage_id = event.dest_stage;
                job.current_stage_name = dest_stage_name.unwrap_or_default();
                previous
            }
            None => {
                debug!(job_id = event.job_id, "Dropped job missing from directory");
                stage_name(workflow, event.source_stage).unwrap_or_default()
            }
        };

        self.next_seq += 1;
        let ticket = MoveTicket {
            job_id: event.job_id,
            seq: self.next_seq,
        };
        let rollback = RollbackRecord {
            job_id: event.job_id,
            source_stage: event.source_stage,
            source_index: from_index,
            source_stage_name,
            dest_stage: event.dest_stage,
            dest_index: event.dest_index,
        };
        self.pending.entry(event.job_id).or_default().push(PendingMove {
            ticket,
            rollback,
            state: MoveState::Applied,
        });

        debug!(
            job_id = event.job_id,
            seq = ticket.seq,
            from = event.source_stage,
            to = event.dest_stage,
            "Move applied optimistically"
        );
        Ok(DropOutcome::Applied(ticket))
    }

    /// Column-internal permutation. Never leaves the client.
    pub fn on_reorder_within_column(
        &mut self,
        buckets: &mut StageBuckets,
        event: DropEvent,
    ) -> BoardResult<()> {
        if !event.is_reorder() {
            return Err(BoardError::Other(anyhow::anyhow!(
                "Reorder of job {} spans stages {} and {}",
                event.job_id,
                event.source_stage,
                event.dest_stage
            )));
        }
        buckets.move_local(
            event.job_id,
            event.source_stage,
            event.dest_stage,
            event.dest_index,
        )?;
        Ok(())
    }

    /// Reconcile a remote response for `ticket`.
    pub fn complete(
        &mut self,
        buckets: &mut StageBuckets,
        directory: &mut JobDirectory,
        ticket: MoveTicket,
        result: BoardResult<Job>,
    ) -> Completion {
        let job_id = ticket.job_id;
        let Some(moves) = self.pending.get_mut(&job_id) else {
            debug!(job_id, seq = ticket.seq, "Ignoring completion for unknown move");
            return Completion::Stale { ticket };
        };
        let Some(pos) = moves.iter().position(|m| m.ticket == ticket) else {
            debug!(job_id, seq = ticket.seq, "Ignoring completion for retired move");
            return Completion::Stale { ticket };
        };

        let completion = match result {
            Ok(server_job) => {
                // Older moves of this job are settled by this confirmation.
                moves.drain(..=pos);
                let placement_merged = directory
                    .get_mut(job_id)
                    .map(|job| job.merge_from_server(&server_job))
                    .unwrap_or(false);
                info!(
                    job_id,
                    seq = ticket.seq,
                    stage_id = server_job.current_stage_id,
                    placement_merged,
                    "Stage update confirmed"
                );
                Completion::Confirmed {
                    ticket,
                    placement_merged,
                }
            }
            Err(err) => {
                let mut failed = moves.remove(pos);
                failed.state = MoveState::RolledBack;
                let reason = err.to_string();
                let recoverable = err.is_recoverable_move_failure();
                if let Some(newer) = moves.get_mut(pos) {
                    newer.rollback.source_stage = failed.rollback.source_stage;
                    newer.rollback.source_index = failed.rollback.source_index;
                    newer.rollback.source_stage_name = failed.rollback.source_stage_name;
                    warn!(
                        job_id,
                        seq = ticket.seq,
                        newer_seq = newer.ticket.seq,
                        recoverable,
                        %reason,
                        "Stage update rejected; newer move pending, deferring rollback"
                    );
                    Completion::Superseded { ticket, reason }
                } else {
                    Self::roll_back(buckets, directory, &failed.rollback);
                    warn!(
                        job_id,
                        seq = ticket.seq,
                        stage_id = failed.rollback.source_stage,
                        index = failed.rollback.source_index,
                        recoverable,
                        %reason,
                        "Stage update rejected; move rolled back"
                    );
                    Completion::RolledBack {
                        ticket,
                        record: failed.rollback,
                        reason,
                    }
                }
            }
        };

        if moves.is_empty() {
            self.pending.remove(&job_id);
        }
        completion
    }

    fn roll_back(buckets: &mut StageBuckets, directory: &mut JobDirectory, record: &RollbackRecord) {
        // The job normally sits in the destination column, but a local
        // reorder may have moved it within it; use wherever it is now.
        match buckets.position(record.job_id) {
            Some((current_stage, _)) => {
                if let Err(e) = buckets.move_local(
                    record.job_id,
                    current_stage,
                    record.source_stage,
                    record.source_index,
                ) {
                    warn!(job_id = record.job_id, error = %e, "Rollback could not restore bucket");
                }
            }
            None => debug!(job_id = record.job_id, "Rolled back job no longer on board"),
        }

        if let Some(job) = directory.get_mut(record.job_id) {
            job.current_stage_id = record.source_stage;
            job.current_stage_name = record.source_stage_name.clone();
        }
    }

    /// `Applied` while any move of the job is in flight, `Idle` otherwise.
    pub fn state_of(&self, job_id: i64) -> MoveState {
        if self.pending.contains_key(&job_id) {
            MoveState::Applied
        } else {
            MoveState::Idle
        }
    }

    pub fn pending(&self, job_id: i64) -> &[PendingMove] {
        self.pending.get(&job_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn in_flight(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    /// Put every job with a move in flight back at its newest optimistic
    /// destination after the buckets were rebuilt from a fresh fetch.
    ///
    /// Pending records are kept, so the eventual completion confirms or
    /// rolls back the reloaded board like any other. Jobs missing from the
    /// board, or whose destination column no longer exists, are left where
    /// the fetch put them.
    ///
    /// Returns the number of jobs moved.
    pub fn reapply_pending(
        &self,
        buckets: &mut StageBuckets,
        directory: &mut JobDirectory,
        workflow: Option<&Workflow>,
    ) -> usize {
        let mut reapplied = 0;
        for (job_id, moves) in &self.pending {
            let Some(newest) = moves.last() else {
                continue;
            };
            let target = newest.rollback.dest_stage;
            let Some((current, _)) = buckets.position(*job_id) else {
                debug!(job_id, "Pending move for job not on reloaded board");
                continue;
            };
            if current == target {
                continue;
            }
            if let Err(e) = buckets.move_local(*job_id, current, target, newest.rollback.dest_index) {
                debug!(job_id, stage_id = target, error = %e, "Cannot re-apply pending move");
                continue;
            }
            if let Some(job) = directory.get_mut(*job_id) {
                job.current_stage_id = target;
                job.current_stage_name = stage_name(workflow, target).unwrap_or_default();
            }
            reapplied += 1;
        }
        reapplied
    }
}

fn stage_name(workflow: Option<&Workflow>, stage_id: i64) -> Option<String> {
    workflow
        .and_then(|w| w.stage(stage_id))
        .map(|s| s.name.clone())
}
