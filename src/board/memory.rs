//! In-memory `BoardBackend` used by tests and offline demos.
//!
//! Behaves like the real server for the happy path (a stage update rewrites
//! the stored job and refreshes its denormalized stage name) and can be
//! scripted to reject specific jobs or stages, or to be unreachable.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::backend::BoardBackend;
use super::models::{Job, Workflow};
use crate::errors::{BoardError, BoardResult};

#[derive(Default)]
struct MemoryState {
    workflows: Vec<Workflow>,
    jobs: Vec<Job>,
    rejected_jobs: HashMap<i64, String>,
    rejected_stages: HashMap<i64, String>,
    unavailable: bool,
    stage_calls: Vec<(i64, i64)>,
    revision: u64,
}

#[derive(Default)]
pub struct InMemoryBackend {
    state: Mutex<MemoryState>,
}

impl InMemoryBackend {
    pub fn new(workflows: Vec<Workflow>, jobs: Vec<Job>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                workflows,
                jobs,
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reject every stage update for `job_id` with `reason`.
    pub fn reject_job(&self, job_id: i64, reason: &str) {
        self.state().rejected_jobs.insert(job_id, reason.to_string());
    }

    /// Reject every stage update targeting `stage_id` with `reason`.
    pub fn reject_stage(&self, stage_id: i64, reason: &str) {
        self.state()
            .rejected_stages
            .insert(stage_id, reason.to_string());
    }

    pub fn clear_rejections(&self) {
        let mut state = self.state();
        state.rejected_jobs.clear();
        state.rejected_stages.clear();
    }

    /// Make every call fail with `RemoteUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    /// `(job_id, stage_id)` for every `set_job_stage` call received, in order.
    pub fn stage_calls(&self) -> Vec<(i64, i64)> {
        self.state().stage_calls.clone()
    }

    pub fn job(&self, job_id: i64) -> Option<Job> {
        self.state().jobs.iter().find(|j| j.id == job_id).cloned()
    }

    /// Insert `workflow`, replacing any stored workflow with the same id.
    pub fn upsert_workflow(&self, workflow: Workflow) {
        let mut state = self.state();
        match state.workflows.iter_mut().find(|w| w.id == workflow.id) {
            Some(existing) => *existing = workflow,
            None => state.workflows.push(workflow),
        }
    }

    pub fn insert_job(&self, job: Job) {
        let mut state = self.state();
        state.jobs.retain(|j| j.id != job.id);
        state.jobs.push(job);
    }
}

#[async_trait]
impl BoardBackend for InMemoryBackend {
    async fn list_workflows(&self) -> BoardResult<Vec<Workflow>> {
        let state = self.state();
        if state.unavailable {
            return Err(BoardError::RemoteUnavailable("in-memory backend offline".into()));
        }
        Ok(state.workflows.clone())
    }

    async fn list_jobs(&self, workflow_id: i64) -> BoardResult<Vec<Job>> {
        let state = self.state();
        if state.unavailable {
            return Err(BoardError::RemoteUnavailable("in-memory backend offline".into()));
        }
        if !state.workflows.iter().any(|w| w.id == workflow_id) {
            return Err(BoardError::not_found(format!("Workflow {}", workflow_id)));
        }
        Ok(state
            .jobs
            .iter()
            .filter(|j| j.workflow_id == workflow_id)
            .cloned()
            .collect())
    }

    async fn set_job_stage(&self, job_id: i64, stage_id: i64) -> BoardResult<Job> {
        let mut state = self.state();
        state.stage_calls.push((job_id, stage_id));
        if state.unavailable {
            return Err(BoardError::RemoteUnavailable("in-memory backend offline".into()));
        }

        let rejected = |reason: &str| BoardError::StageUpdateRejected {
            job_id,
            stage_id,
            reason: reason.to_string(),
        };
        if let Some(reason) = state.rejected_jobs.get(&job_id) {
            return Err(rejected(reason));
        }
        if let Some(reason) = state.rejected_stages.get(&stage_id) {
            return Err(rejected(reason));
        }

        let workflow_id = state
            .jobs
            .iter()
            .find(|j| j.id == job_id)
            .map(|j| j.workflow_id)
            .ok_or_else(|| rejected("job not found"))?;
        let stage_name = state
            .workflows
            .iter()
            .find(|w| w.id == workflow_id)
            .and_then(|w| w.stage(stage_id))
            .map(|s| s.name.clone())
            .ok_or_else(|| rejected("stage belongs to a different workflow"))?;

        state.revision += 1;
        let revision = state.revision;
        let job = state
            .jobs
            .iter_mut()
            .find(|j| j.id == job_id)
            .ok_or_else(|| rejected("job not found"))?;
        job.current_stage_id = stage_id;
        job.current_stage_name = stage_name;
        job.updated_at = Some(format!("rev-{}", revision));
        Ok(job.clone())
    }
}
