//! Board rendering: `workboard board <workflow-id>`.

use std::sync::Arc;

use anyhow::{Context, Result};

use workboard::board::render::render_board;
use workboard::board::{BoardBackend, BoardSession};

pub async fn cmd_board(backend: Arc<dyn BoardBackend>, workflow_id: i64) -> Result<()> {
    let mut session = BoardSession::new(backend);
    session
        .open_workflow(workflow_id)
        .await
        .with_context(|| format!("Failed to load board for workflow {}", workflow_id))?;
    print_board(&session)
}

pub fn print_board(session: &BoardSession) -> Result<()> {
    let workflow = session
        .active_workflow()
        .context("No workflow selected")?;
    print!("{}", render_board(workflow, session.buckets(), session.jobs()));
    Ok(())
}
