use anyhow::Context;

use crate::cli::utils::output_success;
use crate::cli::{connect, OutputFormat};
use crate::config::AppConfig;
use crate::database::DatabaseManager;

pub async fn handle(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = connect(config).await?;
    DatabaseManager::migrate(store.pool())
        .await
        .context("failed to apply migrations")?;

    output_success(&output_format, "Migrations applied", None)
}
