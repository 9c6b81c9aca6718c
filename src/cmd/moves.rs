//! Stage move: `workboard move <workflow-id> <job-id> <stage-id>`.
//!
//! Runs the same path as a drop on the board: optimistic apply, remote
//! stage update, then confirmation or rollback.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use console::style;

use workboard::board::events::NotificationLevel;
use workboard::board::{BoardBackend, BoardEvent, BoardSession, Completion, DropEvent, DropOutcome};

use super::board::print_board;

pub async fn cmd_move(
    backend: Arc<dyn BoardBackend>,
    workflow_id: i64,
    job_id: i64,
    stage_id: i64,
    index: Option<usize>,
) -> Result<()> {
    let mut session = BoardSession::new(backend);
    session
        .open_workflow(workflow_id)
        .await
        .with_context(|| format!("Failed to load board for workflow {}", workflow_id))?;

    let Some((source_stage, source_index)) = session.buckets().position(job_id) else {
        bail!("Job {} is not on the board of workflow {}", job_id, workflow_id);
    };
    let Some(dest_len) = session.buckets().bucket(stage_id).map(<[i64]>::len) else {
        bail!("Stage {} is not part of workflow {}", stage_id, workflow_id);
    };
    let dest_index = index.unwrap_or(dest_len);

    let mut events = session.subscribe();
    let outcome = session.on_drop(DropEvent {
        job_id,
        source_stage,
        source_index,
        dest_stage: stage_id,
        dest_index,
    })?;

    match outcome {
        DropOutcome::Reordered => {
            println!("{} Reordered job {} within its column", style("✓").green(), job_id);
        }
        DropOutcome::Applied(_) => match session.next_completion().await {
            Some(Completion::Confirmed { .. }) => {
                let stage_name = session
                    .job(job_id)
                    .map(|j| j.current_stage_name.clone())
                    .unwrap_or_default();
                println!(
                    "{} Job {} moved to {}",
                    style("✓").green(),
                    job_id,
                    style(stage_name).cyan()
                );
            }
            Some(Completion::RolledBack { reason, .. }) => {
                println!("{} Move rolled back: {}", style("✗").red(), reason);
            }
            Some(other) => println!("Move ended as {:?}", other.state()),
            None => bail!("Completion channel closed"),
        },
    }

    while let Ok(raw) = events.try_recv() {
        if let Ok(BoardEvent::Notification { level, message }) = serde_json::from_str(&raw) {
            let label = match level {
                NotificationLevel::Error => style(level.as_str()).red(),
                NotificationLevel::Info => style(level.as_str()).dim(),
            };
            eprintln!("[{}] {}", label, message);
        }
    }

    println!();
    print_board(&session)
}
