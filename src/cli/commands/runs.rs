//! Runs Command
//!
//! List recent reviews from the run history.

use console::style;

use crate::cli::CommandContext;
use crate::cli::ui::output::Output;
use crate::storage::{RunStore, RunSummary};
use crate::types::Result;

pub fn run(ctx: &CommandContext, limit: usize, format: &str) -> Result<()> {
    let db = ctx.require_database()?;
    let runs = RunStore::new(&db).list_recent_runs(limit)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&runs)?),
        _ => print_text(&runs),
    }
    Ok(())
}

fn print_text(runs: &[RunSummary]) {
    let output = Output::new();
    if runs.is_empty() {
        output.info("No runs recorded yet. Try 'complyflow analyze'.");
        return;
    }

    output.header(&format!("Recent runs ({})", runs.len()));
    for run in runs {
        println!();
        println!(
            "{}  {}  {}",
            style(&run.run_id).cyan(),
            style(&run.run_time).dim(),
            style(&run.feature_name).bold()
        );
        output.field("score", run.risk_score.as_deref().unwrap_or("-"));
        if !run.regions.is_empty() {
            output.field("regions", &run.regions.join(", "));
        }
        if !run.regulations.is_empty() {
            output.field("regulations", &run.regulations.join(", "));
        }
    }
}
