//! Init Command
//!
//! Initialize complyflow in the current directory.

use crate::cli::ui::output::Output;
use crate::cli::{CommandContext, is_initialized};
use crate::config::ConfigLoader;
use crate::types::{Result, ReviewError};

pub fn run(force: bool) -> Result<()> {
    if is_initialized() && !force {
        return Err(ReviewError::Config(
            "Already initialized. Use --force to overwrite.".to_string(),
        ));
    }

    let project_dir = ConfigLoader::init_project(force)?;

    // Reload so env overrides decide where the database lives
    let ctx = CommandContext::load(None)?;
    ctx.open_database()?;

    let output = Output::new();
    output.success(&format!("Initialized complyflow in {}/", project_dir.display()));
    output.field("config", &ConfigLoader::project_config_path().display().to_string());
    output.field("database", &ctx.database_path().display().to_string());
    println!();
    println!("Next steps:");
    println!("  1. Point AGENT1_URL / AGENT2_URL (or the config file) at your agents");
    println!("  2. Run 'complyflow serve' to start the API on port {}", ctx.config.server.port);

    Ok(())
}
