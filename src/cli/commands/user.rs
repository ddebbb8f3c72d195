use anyhow::Context;
use std::sync::Arc;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::database::models::account::CreateUserInput;
use crate::database::{DatabaseManager, PgAccountStore};

pub async fn handle(config: AppConfig, email: String, password: String, name: String, role: String) -> anyhow::Result<()> {
    let db = DatabaseManager::open(&config.database)
        .await
        .context("failed to connect to database")?;

    let auth = AuthService::new(&config.security, Arc::new(PgAccountStore::new(db.clone())))?;
    let result = auth
        .create_user(CreateUserInput {
            email: Some(email),
            password: Some(password),
            display_name: Some(name),
            role: Some(role),
        })
        .await;
    db.close().await;

    let user = result?;
    println!("Created {} ({}) with role {}", user.email, user.id, user.role);
    Ok(())
}
