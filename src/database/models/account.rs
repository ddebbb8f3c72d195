use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::Role;

pub const ACCOUNTS_TABLE: &str = "accounts";
pub const PROFILES_TABLE: &str = "profiles";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email_verified: bool,
    pub login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.map_or(false, |until| until > now)
    }

    /// A lock that has already elapsed. The attempt counter restarts from zero.
    pub fn lock_expired(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.map_or(false, |until| until <= now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub display_name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account plus profile as created together by the admin endpoint and CLI.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserInput {
    pub email: Option<String>,
    pub password: Option<String>,
    pub display_name: Option<String>,
    pub role: Option<String>,
}

/// Public view of an account and its profile.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl UserSummary {
    pub fn new(account: &Account, profile: &Profile) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            display_name: profile.display_name.clone(),
            role: profile.role,
            is_active: profile.is_active,
            last_login_at: account.last_login_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn account(locked_until: Option<DateTime<Utc>>) -> Account {
        let now = Utc::now();
        Account {
            id: Uuid::new_v4(),
            email: "editor@kmci.org".to_string(),
            password_hash: "hash".to_string(),
            email_verified: true,
            login_attempts: 0,
            locked_until,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn lock_state_follows_the_clock() {
        let now = Utc::now();
        assert!(!account(None).is_locked(now));
        assert!(account(Some(now + Duration::minutes(5))).is_locked(now));

        let elapsed = account(Some(now - Duration::seconds(1)));
        assert!(!elapsed.is_locked(now));
        assert!(elapsed.lock_expired(now));
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let value = serde_json::to_value(account(None)).unwrap();
        assert!(value.get("password_hash").is_none());
    }
}
