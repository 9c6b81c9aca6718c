//! Plain-terminal board view: one block per column, in stage order.

use std::collections::HashMap;
use std::fmt::Write;

use console::{Emoji, style};

use super::buckets::StageBuckets;
use super::models::{Job, Workflow};

static INITIAL: Emoji<'_, '_> = Emoji("▶ ", "> ");
static FINAL: Emoji<'_, '_> = Emoji("✔ ", "* ");

pub fn render_board(workflow: &Workflow, buckets: &StageBuckets, jobs: &[Job]) -> String {
    let by_id: HashMap<i64, &Job> = jobs.iter().map(|j| (j.id, j)).collect();
    let mut out = String::new();

    let _ = writeln!(out, "{}", style(&workflow.name).bold().underlined());
    if let Some(description) = &workflow.description {
        let _ = writeln!(out, "{}", style(description).dim());
    }

    for (stage_id, job_ids) in buckets.columns() {
        let Some(stage) = workflow.stage(stage_id) else {
            continue;
        };
        let marker = if stage.is_initial {
            INITIAL.to_string()
        } else if stage.is_final {
            FINAL.to_string()
        } else {
            String::new()
        };
        let _ = writeln!(
            out,
            "\n{}{} {}",
            marker,
            style(&stage.name).cyan().bold(),
            style(format!("({})", job_ids.len())).dim()
        );
        if job_ids.is_empty() {
            let _ = writeln!(out, "  {}", style("(empty)").dim());
        }
        for job_id in job_ids {
            match by_id.get(job_id) {
                Some(job) => {
                    let _ = writeln!(out, "  {}", job_line(job));
                }
                None => {
                    let _ = writeln!(out, "  #{}", job_id);
                }
            }
        }
    }
    out
}

fn job_line(job: &Job) -> String {
    let mut line = format!("#{} {} - {}", job.id, job.name, job.contact_name);
    if let Some(due) = &job.due_date {
        let _ = write!(line, " {}", style(format!("due {}", due)).yellow());
    }
    if let (Some(done), Some(total)) = (job.completed_task_count, job.task_count) {
        let _ = write!(line, " {}", style(format!("[{}/{}]", done, total)).dim());
    }
    line
}
