use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::account::{Account, NewAccount, Profile};

/// Persistence port for accounts and their profiles.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Lookup by already-lowercased email.
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError>;

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, DatabaseError>;

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, DatabaseError>;

    /// Writes the failed-login counter and lock. `false` when the account is gone.
    async fn set_login_state(
        &self,
        id: Uuid,
        login_attempts: i32,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<bool, DatabaseError>;

    /// Clears the counter and lock and stamps `last_login_at`.
    async fn record_successful_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DatabaseError>;

    /// Inserts the account and its profile together. A taken email surfaces as
    /// `DatabaseError::UniqueViolation`.
    async fn create_account(&self, account: NewAccount) -> Result<(Account, Profile), DatabaseError>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, DatabaseError>;
}

pub struct PgAccountStore {
    db: DatabaseManager,
}

impl PgAccountStore {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError> {
        let row = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = $1")
            .bind(email)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row)
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, DatabaseError> {
        let row = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row)
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        let row = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row)
    }

    async fn set_login_state(
        &self,
        id: Uuid,
        login_attempts: i32,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE accounts SET login_attempts = $1, locked_until = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(login_attempts)
        .bind(locked_until)
        .bind(id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_successful_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        sqlx::query(
            "UPDATE accounts SET login_attempts = 0, locked_until = NULL, last_login_at = $1, updated_at = $1 WHERE id = $2",
        )
        .bind(at)
        .bind(id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn create_account(&self, account: NewAccount) -> Result<(Account, Profile), DatabaseError> {
        let mut tx = self.db.pool().begin().await?;

        let created = sqlx::query_as::<_, Account>(
            "INSERT INTO accounts (id, email, password_hash) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&account.email)
        .bind(&account.password_hash)
        .fetch_one(&mut *tx)
        .await?;

        let profile = sqlx::query_as::<_, Profile>(
            "INSERT INTO profiles (id, display_name, role) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(created.id)
        .bind(&account.display_name)
        .bind(account.role)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((created, profile))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE accounts SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
