use tracing::debug;

use super::backend::BoardBackend;
use super::models::Job;
use crate::errors::BoardResult;

/// Jobs of the selected workflow, in server order.
///
/// Read-only relative to the board except for the optimistic stage
/// assignment and server merges made by the drag-transfer controller.
#[derive(Debug, Default)]
pub struct JobDirectory {
    workflow_id: Option<i64>,
    jobs: Vec<Job>,
}

impl JobDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn list_jobs(
        &mut self,
        backend: &dyn BoardBackend,
        workflow_id: i64,
    ) -> BoardResult<&[Job]> {
        let jobs = backend.list_jobs(workflow_id).await?;
        debug!(workflow_id, count = jobs.len(), "Job directory loaded");
        self.load(workflow_id, jobs);
        Ok(&self.jobs)
    }

    pub fn load(&mut self, workflow_id: i64, jobs: Vec<Job>) {
        self.workflow_id = Some(workflow_id);
        self.jobs = jobs;
    }

    pub fn clear(&mut self) {
        self.workflow_id = None;
        self.jobs.clear();
    }

    pub fn workflow_id(&self) -> Option<i64> {
        self.workflow_id
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn get(&self, job_id: i64) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == job_id)
    }

    pub fn get_mut(&mut self, job_id: i64) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|j| j.id == job_id)
    }

    /// Remote stage change. The directory itself is not touched; reconciling
    /// the result is the controller's job.
    pub async fn set_job_stage(
        backend: &dyn BoardBackend,
        job_id: i64,
        stage_id: i64,
    ) -> BoardResult<Job> {
        backend.set_job_stage(job_id, stage_id).await
    }
}
