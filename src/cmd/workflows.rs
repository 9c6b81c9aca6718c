//! Workflow catalog listing: `workboard workflows`.

use std::sync::Arc;

use anyhow::Result;
use console::style;

use workboard::board::{BoardBackend, WorkflowCatalog};

pub async fn cmd_workflows(backend: Arc<dyn BoardBackend>) -> Result<()> {
    let mut catalog = WorkflowCatalog::new();
    let ids: Vec<i64> = catalog
        .list_workflows(backend.as_ref())
        .await?
        .iter()
        .map(|w| w.id)
        .collect();

    if ids.is_empty() {
        println!("No workflows defined.");
        return Ok(());
    }

    for id in ids {
        let workflow = catalog.select_workflow(id)?;
        println!("{} {}", style(format!("#{}", workflow.id)).dim(), style(&workflow.name).bold());
        if let Some(description) = &workflow.description {
            println!("    {}", style(description).dim());
        }
        let stages: Vec<&str> = workflow.stages.iter().map(|s| s.name.as_str()).collect();
        println!("    {}", stages.join(" → "));
    }
    Ok(())
}
