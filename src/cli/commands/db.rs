use clap::Subcommand;

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::database::DatabaseManager;

#[derive(Subcommand)]
pub enum DbCommands {
    #[command(about = "Apply the embedded schema migrations")]
    Migrate,

    #[command(about = "Check that the configured database is reachable")]
    Check,
}

pub async fn handle(cmd: DbCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        DbCommands::Migrate => {
            DatabaseManager::migrate().await?;
            output_success(output_format, "Migrations applied", None)?;
        }
        DbCommands::Check => match DatabaseManager::health_check().await {
            Ok(()) => output_success(output_format, "Database reachable", None)?,
            Err(e) => {
                output_error(output_format, &format!("Database unreachable: {}", e))?;
                DatabaseManager::close().await;
                anyhow::bail!("database check failed");
            }
        },
    }

    DatabaseManager::close().await;
    Ok(())
}
