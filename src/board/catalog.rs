use tracing::{debug, warn};

use super::backend::BoardBackend;
use super::models::Workflow;
use crate::errors::{BoardError, BoardResult};

/// The set of available workflows and the one currently on the board.
///
/// Stages of the active workflow are always exposed sorted ascending by
/// `order_index`; downstream consumers never sort.
#[derive(Debug, Default)]
pub struct WorkflowCatalog {
    workflows: Vec<Workflow>,
    active: Option<Workflow>,
}

impl WorkflowCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch all workflows. An empty list is a valid result.
    pub async fn list_workflows(&mut self, backend: &dyn BoardBackend) -> BoardResult<&[Workflow]> {
        let workflows = backend.list_workflows().await?;
        debug!(count = workflows.len(), "Workflow catalog loaded");
        self.load(workflows);
        Ok(&self.workflows)
    }

    /// Replace the catalog contents. The active selection is refreshed from
    /// the new list, or cleared if it disappeared.
    pub fn load(&mut self, workflows: Vec<Workflow>) {
        self.workflows = workflows;
        if let Some(active_id) = self.active.as_ref().map(|w| w.id) {
            self.active = None;
            if self.select_workflow(active_id).is_err() {
                debug!(workflow_id = active_id, "Active workflow no longer in catalog");
            }
        }
    }

    pub fn workflows(&self) -> &[Workflow] {
        &self.workflows
    }

    pub fn select_workflow(&mut self, id: i64) -> BoardResult<&Workflow> {
        let mut workflow = self
            .workflows
            .iter()
            .find(|w| w.id == id)
            .cloned()
            .ok_or_else(|| BoardError::not_found(format!("Workflow {}", id)))?;

        for warning in workflow.stage_warnings() {
            warn!(workflow_id = id, %warning, "Irregular workflow stage model");
        }
        workflow.sort_stages();

        Ok(self.active.insert(workflow))
    }

    pub fn active(&self) -> Option<&Workflow> {
        self.active.as_ref()
    }

    pub fn clear_selection(&mut self) {
        self.active = None;
    }
}
