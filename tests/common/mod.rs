//! Shared fixtures: workflow W with stages Intake(0), Review(1), Done(2).

#![allow(dead_code)]

use std::sync::Arc;

use workboard::board::{InMemoryBackend, Job, Stage, Workflow};

pub const WORKFLOW: i64 = 1;
pub const INTAKE: i64 = 10;
pub const REVIEW: i64 = 11;
pub const DONE: i64 = 12;

pub fn stage(id: i64, name: &str, order_index: i32) -> Stage {
    Stage {
        id,
        name: name.to_string(),
        order_index,
        is_initial: order_index == 0,
        is_final: false,
    }
}

pub fn workflow() -> Workflow {
    let mut done = stage(DONE, "Done", 2);
    done.is_final = true;
    Workflow {
        id: WORKFLOW,
        name: "W".to_string(),
        description: Some("Year-end engagement".to_string()),
        // Deliberately unsorted: the catalog owns sorting.
        stages: vec![done, stage(INTAKE, "Intake", 0), stage(REVIEW, "Review", 1)],
    }
}

pub fn job(id: i64, stage_id: i64) -> Job {
    let stage_name = match stage_id {
        INTAKE => "Intake",
        REVIEW => "Review",
        DONE => "Done",
        _ => "",
    };
    Job {
        id,
        name: format!("J{}", id),
        workflow_id: WORKFLOW,
        workflow_name: "W".to_string(),
        current_stage_id: stage_id,
        current_stage_name: stage_name.to_string(),
        contact_id: 500 + id,
        contact_name: format!("Client {}", id),
        due_date: None,
        assignee_id: None,
        task_count: Some(3),
        completed_task_count: Some(0),
        updated_at: None,
    }
}

pub fn backend(jobs: Vec<Job>) -> Arc<InMemoryBackend> {
    Arc::new(InMemoryBackend::new(vec![workflow()], jobs))
}
