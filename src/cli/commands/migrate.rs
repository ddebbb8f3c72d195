use anyhow::Context;
use std::path::Path;

use crate::config::AppConfig;
use crate::database::DatabaseManager;

pub async fn handle(config: AppConfig, dir: &str) -> anyhow::Result<()> {
    let db = DatabaseManager::open(&config.database)
        .await
        .context("failed to connect to database")?;

    db.migrate(Path::new(dir)).await.with_context(|| format!("failed to apply migrations from {}", dir))?;
    db.close().await;

    println!("Migrations applied from {}", dir);
    Ok(())
}
