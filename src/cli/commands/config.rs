//! Config Command
//!
//! Inspect complyflow configuration.
//!
//! Usage:
//!   complyflow config show [-f toml|json|yaml]
//!   complyflow config path

use crate::cli::CommandContext;
use crate::config::ConfigLoader;
use crate::types::Result;

/// Show the merged effective configuration
pub fn show(ctx: &CommandContext, format: &str) -> Result<()> {
    if format == "toml" {
        match &ctx.config_path {
            Some(path) => println!("# Effective config (project layer: {})\n", path.display()),
            None => println!("# Effective config\n"),
        }
    }
    println!("{}", ConfigLoader::render(&ctx.config, format)?);
    Ok(())
}

/// Show configuration paths
pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}
