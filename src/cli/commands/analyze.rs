//! Analyze Command
//!
//! Run one review from the terminal against the configured agents.

use crate::cli::CommandContext;
use crate::cli::ui::output::Output;
use crate::normalize::MergedResult;
use crate::pipeline::{AnalyzeRequest, ReviewOutcome};
use crate::types::{Result, format_number};

/// Options for `complyflow analyze`
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub title: String,
    pub description: String,
    pub regions: Vec<String>,
    /// Output format: text, json
    pub format: String,
    /// Skip writing the run to the database
    pub no_persist: bool,
}

pub async fn run(ctx: &CommandContext, options: AnalyzeOptions) -> Result<()> {
    let database = if options.no_persist {
        None
    } else {
        Some(ctx.open_database()?)
    };
    let pipeline = ctx.pipeline(database)?;

    let request = AnalyzeRequest::new(options.title, options.description, options.regions);
    let outcome = pipeline.analyze(&request).await?;

    match options.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&outcome.result)?),
        _ => print_text(&outcome, !options.no_persist),
    }
    Ok(())
}

fn print_text(outcome: &ReviewOutcome, persist: bool) {
    let output = Output::new();
    let MergedResult {
        findings, score, ..
    } = &outcome.result;

    output.header("Compliance Review");
    output.score(score.value, &format_number(score.value));

    output.section("Rationale");
    for line in score.rationale.lines() {
        println!("  {}", line);
    }

    output.list("Regions", &findings.regions_hit);
    output.list("Regulations", &findings.regulations_hit);
    output.list("Key obligations", &findings.key_obligations);
    output.list("Citations", &findings.citations);
    output.list("Evidence", &findings.evidence_urls);

    println!();
    match &outcome.run_id {
        Some(run_id) => output.success(&format!("Saved as {}", run_id)),
        None if persist => output.warning("Run could not be saved; see the log for details"),
        None => output.info("Run not saved (--no-persist)"),
    }
}
