use serde::{Deserialize, Serialize};

/// One ordered step of a workflow, rendered as one board column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: i64,
    pub name: String,
    pub order_index: i32,
    #[serde(default)]
    pub is_initial: bool,
    #[serde(default)]
    pub is_final: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stages: Vec<Stage>,
}

/// Irregularities in a workflow's stage list. Reported, never rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum StageWarning {
    DuplicateStageId { stage_id: i64, count: usize },
    DuplicateOrderIndex { order_index: i32, stage_ids: Vec<i64> },
    MultipleInitial { stage_ids: Vec<i64> },
    MultipleFinal { stage_ids: Vec<i64> },
}

impl std::fmt::Display for StageWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateStageId { stage_id, count } => {
                write!(f, "stage id {} appears {} times", stage_id, count)
            }
            Self::DuplicateOrderIndex {
                order_index,
                stage_ids,
            } => write!(f, "stages {:?} share orderIndex {}", stage_ids, order_index),
            Self::MultipleInitial { stage_ids } => {
                write!(f, "stages {:?} are all flagged initial", stage_ids)
            }
            Self::MultipleFinal { stage_ids } => {
                write!(f, "stages {:?} are all flagged final", stage_ids)
            }
        }
    }
}

impl Workflow {
    pub fn stage(&self, stage_id: i64) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == stage_id)
    }

    pub fn has_stage(&self, stage_id: i64) -> bool {
        self.stage(stage_id).is_some()
    }

    /// Stable sort by `order_index`; equal indices keep their server order.
    pub fn sort_stages(&mut self) {
        self.stages.sort_by_key(|s| s.order_index);
    }

    pub fn stage_warnings(&self) -> Vec<StageWarning> {
        let mut warnings = Vec::new();

        let mut ids: Vec<i64> = self.stages.iter().map(|s| s.id).collect();
        ids.sort_unstable();
        for group in ids.chunk_by(|a, b| a == b) {
            if group.len() > 1 {
                warnings.push(StageWarning::DuplicateStageId {
                    stage_id: group[0],
                    count: group.len(),
                });
            }
        }

        let mut by_order: Vec<(i32, i64)> =
            self.stages.iter().map(|s| (s.order_index, s.id)).collect();
        by_order.sort_by_key(|(order, _)| *order);
        for group in by_order.chunk_by(|a, b| a.0 == b.0) {
            if group.len() > 1 {
                warnings.push(StageWarning::DuplicateOrderIndex {
                    order_index: group[0].0,
                    stage_ids: group.iter().map(|(_, id)| *id).collect(),
                });
            }
        }

        let initial: Vec<i64> = self
            .stages
            .iter()
            .filter(|s| s.is_initial)
            .map(|s| s.id)
            .collect();
        if initial.len() > 1 {
            warnings.push(StageWarning::MultipleInitial { stage_ids: initial });
        }

        let final_ids: Vec<i64> = self
            .stages
            .iter()
            .filter(|s| s.is_final)
            .map(|s| s.id)
            .collect();
        if final_ids.len() > 1 {
            warnings.push(StageWarning::MultipleFinal {
                stage_ids: final_ids,
            });
        }

        warnings
    }
}

/// A unit of work located in exactly one stage of one workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i64,
    pub name: String,
    pub workflow_id: i64,
    #[serde(default)]
    pub workflow_name: String,
    pub current_stage_id: i64,
    #[serde(default)]
    pub current_stage_name: String,
    pub contact_id: i64,
    #[serde(default)]
    pub contact_name: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<i64>,
    #[serde(default)]
    pub task_count: Option<u32>,
    #[serde(default)]
    pub completed_task_count: Option<u32>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Job {
    /// Merge an authoritative server record onto this job.
    ///
    /// Denormalized text, dates and counts always come from the server.
    /// Placement fields (`current_stage_id`, `current_stage_name`) are only
    /// taken when the server agrees with the local stage, so a late response
    /// for an intermediate position never moves the card.
    ///
    /// Returns true when placement fields were merged.
    pub fn merge_from_server(&mut self, server: &Job) -> bool {
        self.name = server.name.clone();
        self.workflow_name = server.workflow_name.clone();
        self.contact_id = server.contact_id;
        self.contact_name = server.contact_name.clone();
        self.due_date = server.due_date.clone();
        self.assignee_id = server.assignee_id;
        self.task_count = server.task_count;
        self.completed_task_count = server.completed_task_count;
        self.updated_at = server.updated_at.clone();

        if server.current_stage_id == self.current_stage_id {
            self.current_stage_name = server.current_stage_name.clone();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn stage(id: i64, name: &str, order_index: i32) -> Stage {
        Stage {
            id,
            name: name.to_string(),
            order_index,
            is_initial: false,
            is_final: false,
        }
    }

    pub fn job(id: i64, name: &str, stage_id: i64) -> Job {
        Job {
            id,
            name: name.to_string(),
            workflow_id: 1,
            workflow_name: "Engagement".to_string(),
            current_stage_id: stage_id,
            current_stage_name: String::new(),
            contact_id: 100,
            contact_name: "Acme Ltd".to_string(),
            due_date: None,
            assignee_id: None,
            task_count: None,
            completed_task_count: None,
            updated_at: None,
        }
    }
}
