use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

use super::backend::BoardBackend;
use super::buckets::StageBuckets;
use super::catalog::WorkflowCatalog;
use super::directory::JobDirectory;
use super::events::{BoardEvent, broadcast_event};
use super::models::{Job, Stage, Workflow};
use super::transfer::{
    Completion, DragTransferController, DropEvent, DropOutcome, MoveState, MoveTicket,
};
use crate::errors::BoardResult;

#[derive(Debug, Clone, PartialEq)]
pub enum BoardStatus {
    /// No workflow opened yet.
    Empty,
    Ready,
    /// Loading failed; buckets hold no jobs. Reopen the workflow to retry.
    Error(String),
}

/// A remote stage-update response routed back to the session.
#[derive(Debug)]
pub struct StageCompletion {
    pub ticket: MoveTicket,
    pub result: BoardResult<Job>,
}

/// Single owner of all board state.
///
/// Every mutation goes through `&mut self`, so the board needs no locks:
/// the caller's event loop serializes gestures and completions. Remote
/// stage updates run as tokio tasks and report back over a channel drained
/// by [`next_completion`](Self::next_completion).
pub struct BoardSession {
    backend: Arc<dyn BoardBackend>,
    catalog: WorkflowCatalog,
    directory: JobDirectory,
    buckets: StageBuckets,
    controller: DragTransferController,
    status: BoardStatus,
    completions_tx: mpsc::UnboundedSender<StageCompletion>,
    completions_rx: mpsc::UnboundedReceiver<StageCompletion>,
    events_tx: broadcast::Sender<String>,
}

impl BoardSession {
    pub fn new(backend: Arc<dyn BoardBackend>) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (events_tx, _rx) = broadcast::channel::<String>(256);
        Self {
            backend,
            catalog: WorkflowCatalog::new(),
            directory: JobDirectory::new(),
            buckets: StageBuckets::new(),
            controller: DragTransferController::new(),
            status: BoardStatus::Empty,
            completions_tx,
            completions_rx,
            events_tx,
        }
    }

    /// JSON-encoded [`BoardEvent`]s.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.events_tx.subscribe()
    }

    pub async fn refresh_workflows(&mut self) -> BoardResult<&[Workflow]> {
        self.catalog.list_workflows(self.backend.as_ref()).await
    }

    /// Refresh the catalog, select a workflow, fetch its jobs and rebuild
    /// the buckets.
    ///
    /// Moves still in flight survive the reload: they are re-applied onto
    /// the rebuilt buckets and their completions reconcile as usual. A
    /// failed fetch leaves the board in [`BoardStatus::Error`] with empty
    /// columns.
    pub async fn open_workflow(&mut self, workflow_id: i64) -> BoardResult<()> {
        let refreshed = self.refresh_workflows().await.map(|_| ());
        if let Err(e) = refreshed {
            self.fail_load(workflow_id, e.to_string());
            return Err(e);
        }
        let selected = self
            .catalog
            .select_workflow(workflow_id)
            .map(|workflow| workflow.stages.clone());
        let stages = match selected {
            Ok(stages) => stages,
            Err(e) => {
                self.fail_load(workflow_id, e.to_string());
                return Err(e);
            }
        };

        let fetched = self
            .directory
            .list_jobs(self.backend.as_ref(), workflow_id)
            .await
            .map(|_| ());
        if let Err(e) = fetched {
            self.fail_load(workflow_id, e.to_string());
            return Err(e);
        }

        let skipped_jobs = self.buckets.rebuild(&stages, self.directory.jobs());
        let reapplied = self.controller.reapply_pending(
            &mut self.buckets,
            &mut self.directory,
            self.catalog.active(),
        );
        self.status = BoardStatus::Ready;
        info!(
            workflow_id,
            stages = stages.len(),
            jobs = self.directory.jobs().len(),
            skipped_jobs,
            reapplied,
            in_flight = self.controller.in_flight(),
            "Board loaded"
        );
        broadcast_event(
            &self.events_tx,
            &BoardEvent::BoardLoaded {
                workflow_id,
                stage_count: stages.len(),
                job_count: self.buckets.job_count(),
                skipped_jobs,
            },
        );
        Ok(())
    }

    /// Columns of `workflow_id` stay when it is the selected workflow;
    /// otherwise the selection is cleared along with the board.
    fn fail_load(&mut self, workflow_id: i64, error: String) {
        warn!(workflow_id, %error, "Board load failed");
        let stages: Vec<Stage> = match self.catalog.active() {
            Some(workflow) if workflow.id == workflow_id => workflow.stages.clone(),
            _ => {
                self.catalog.clear_selection();
                Vec::new()
            }
        };
        self.directory.clear();
        self.buckets.rebuild(&stages, &[]);
        self.status = BoardStatus::Error(error.clone());
        broadcast_event(
            &self.events_tx,
            &BoardEvent::BoardLoadFailed { workflow_id, error },
        );
    }

    /// Handle a drop. Must be called from within a tokio runtime: a
    /// cross-column move spawns the remote stage update.
    pub fn on_drop(&mut self, event: DropEvent) -> BoardResult<DropOutcome> {
        let outcome = self.controller.on_drop(
            &mut self.buckets,
            &mut self.directory,
            self.catalog.active(),
            event,
        )?;

        let position = self
            .buckets
            .position(event.job_id)
            .map(|(_, index)| index)
            .unwrap_or(event.dest_index);

        match outcome {
            DropOutcome::Reordered => {
                broadcast_event(
                    &self.events_tx,
                    &BoardEvent::JobReordered {
                        job_id: event.job_id,
                        stage_id: event.dest_stage,
                        position,
                    },
                );
            }
            DropOutcome::Applied(ticket) => {
                broadcast_event(
                    &self.events_tx,
                    &BoardEvent::JobMoved {
                        job_id: event.job_id,
                        from_stage: event.source_stage,
                        to_stage: event.dest_stage,
                        position,
                        state: MoveState::Applied,
                    },
                );

                let backend = Arc::clone(&self.backend);
                let tx = self.completions_tx.clone();
                let stage_id = event.dest_stage;
                tokio::spawn(async move {
                    let result =
                        JobDirectory::set_job_stage(backend.as_ref(), ticket.job_id, stage_id)
                            .await;
                    let _ = tx.send(StageCompletion { ticket, result });
                });
            }
        }
        Ok(outcome)
    }

    pub fn on_reorder_within_column(&mut self, event: DropEvent) -> BoardResult<()> {
        self.controller
            .on_reorder_within_column(&mut self.buckets, event)?;
        let position = self
            .buckets
            .position(event.job_id)
            .map(|(_, index)| index)
            .unwrap_or(event.dest_index);
        broadcast_event(
            &self.events_tx,
            &BoardEvent::JobReordered {
                job_id: event.job_id,
                stage_id: event.dest_stage,
                position,
            },
        );
        Ok(())
    }

    /// Wait for the next remote response and reconcile it.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        let completion = self.completions_rx.recv().await?;
        Some(self.apply_completion(completion))
    }

    /// Reconcile every response that has already arrived, without waiting.
    pub fn drain_completions(&mut self) -> Vec<Completion> {
        let mut applied = Vec::new();
        while let Ok(completion) = self.completions_rx.try_recv() {
            applied.push(self.apply_completion(completion));
        }
        applied
    }

    /// Wait until no move is in flight.
    pub async fn settle(&mut self) -> Vec<Completion> {
        let mut applied = Vec::new();
        while self.controller.in_flight() > 0 {
            match self.next_completion().await {
                Some(completion) => applied.push(completion),
                None => break,
            }
        }
        applied
    }

    pub fn apply_completion(&mut self, completion: StageCompletion) -> Completion {
        let StageCompletion { ticket, result } = completion;
        let server_stage = result.as_ref().ok().map(|job| job.current_stage_id);
        let completion =
            self.controller
                .complete(&mut self.buckets, &mut self.directory, ticket, result);

        match &completion {
            Completion::Confirmed { ticket, .. } => {
                if let Some(stage_id) = server_stage {
                    broadcast_event(
                        &self.events_tx,
                        &BoardEvent::MoveConfirmed {
                            job_id: ticket.job_id,
                            stage_id,
                        },
                    );
                }
            }
            Completion::RolledBack { record, reason, .. } => {
                let position = self
                    .buckets
                    .position(record.job_id)
                    .map(|(_, index)| index)
                    .unwrap_or(record.source_index);
                broadcast_event(
                    &self.events_tx,
                    &BoardEvent::MoveRolledBack {
                        job_id: record.job_id,
                        stage_id: record.source_stage,
                        position,
                        reason: reason.clone(),
                    },
                );
                broadcast_event(&self.events_tx, &BoardEvent::move_failed());
            }
            Completion::Superseded { .. } | Completion::Stale { .. } => {}
        }
        completion
    }

    pub fn active_workflow(&self) -> Option<&Workflow> {
        self.catalog.active()
    }

    pub fn workflows(&self) -> &[Workflow] {
        self.catalog.workflows()
    }

    pub fn buckets(&self) -> &StageBuckets {
        &self.buckets
    }

    pub fn jobs(&self) -> &[Job] {
        self.directory.jobs()
    }

    pub fn job(&self, job_id: i64) -> Option<&Job> {
        self.directory.get(job_id)
    }

    pub fn status(&self) -> &BoardStatus {
        &self.status
    }

    pub fn move_state(&self, job_id: i64) -> MoveState {
        self.controller.state_of(job_id)
    }

    pub fn in_flight(&self) -> usize {
        self.controller.in_flight()
    }
}
