//! Serve Command
//!
//! Run the HTTP service.

use crate::cli::CommandContext;
use crate::server::{self, AppState};
use crate::types::Result;

pub async fn run(ctx: &CommandContext, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = ctx.config.clone();
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate()?;

    let database = ctx.open_database()?;
    tracing::info!("Run history: {}", ctx.database_path().display());

    let pipeline = ctx.pipeline(Some(database.clone()))?;
    server::serve(AppState::new(config, pipeline, Some(database))).await
}
