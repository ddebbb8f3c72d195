use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::error::AuthError;
use super::extract::{default_extractors, CredentialExtractor};
use super::identity::{AuthenticatedUser, ClientInfo};
use super::password::PasswordHasher;
use super::role::Role;
use super::token::{IssuedToken, TokenIssuer};
use crate::config::SecurityConfig;
use crate::database::accounts::AccountStore;
use crate::database::manager::DatabaseError;
use crate::database::models::account::{Account, CreateUserInput, NewAccount, Profile, UserSummary};
use crate::validation::ValidationErrors;

const AUTH_TARGET: &str = "kmci_api::auth";

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: AuthenticatedUser,
    pub token: IssuedToken,
}

/// Credential verification, session tokens, lockout bookkeeping and account
/// administration. Transport concerns live in the identity middleware.
pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    extractors: Vec<Box<dyn CredentialExtractor>>,
    max_login_attempts: i32,
    lockout: Duration,
}

impl AuthService {
    pub fn new(config: &SecurityConfig, accounts: Arc<dyn AccountStore>) -> Result<Self, AuthError> {
        Ok(Self {
            accounts,
            hasher: PasswordHasher::new(config.bcrypt_cost),
            tokens: TokenIssuer::new(&config.jwt_secret, config.jwt_expiry_hours)?,
            extractors: default_extractors(&config.session_cookie_name),
            max_login_attempts: config.max_login_attempts,
            lockout: Duration::minutes(config.lockout_minutes),
        })
    }

    pub fn extractors(&self) -> &[Box<dyn CredentialExtractor>] {
        &self.extractors
    }

    pub fn token_lifetime(&self) -> Duration {
        self.tokens.expiry()
    }

    // ========================================
    // Login
    // ========================================

    pub async fn login(&self, email: &str, password: &str, client: &ClientInfo) -> Result<LoginOutcome, AuthError> {
        let email = email.trim().to_lowercase();
        let ip = client.ip.as_deref().unwrap_or("unknown");

        let Some(account) = self.accounts.find_account_by_email(&email).await? else {
            info!(target: AUTH_TARGET, email = %email, ip, reason = "unknown_email", "login failed");
            return Err(AuthError::InvalidCredentials);
        };

        let now = Utc::now();
        if account.is_locked(now) {
            warn!(target: AUTH_TARGET, email = %email, ip, reason = "locked", "login failed");
            return Err(AuthError::AccountLocked);
        }

        if !self.hasher.verify(password, &account.password_hash).await {
            return Err(self.record_failure(&account, now, &email, ip).await?);
        }

        self.accounts.record_successful_login(account.id, now).await?;

        let profile = match self.accounts.find_profile(account.id).await? {
            Some(profile) if profile.is_active => profile,
            _ => {
                warn!(target: AUTH_TARGET, email = %email, ip, reason = "profile_inactive", "login failed");
                return Err(AuthError::ProfileInactive);
            }
        };

        let token = self.tokens.issue(account.id, &account.email)?;
        info!(target: AUTH_TARGET, email = %email, ip, reason = "ok", role = %profile.role, "login succeeded");

        Ok(LoginOutcome { user: authenticated(&account, &profile), token })
    }

    /// Counts a bad password. Returns the error the caller should see.
    async fn record_failure(
        &self,
        account: &Account,
        now: DateTime<Utc>,
        email: &str,
        ip: &str,
    ) -> Result<AuthError, DatabaseError> {
        let previous = if account.lock_expired(now) { 0 } else { account.login_attempts };
        let attempts = previous + 1;

        if attempts >= self.max_login_attempts {
            let locked_until = now + self.lockout;
            self.accounts.set_login_state(account.id, attempts, Some(locked_until)).await?;
            warn!(
                target: AUTH_TARGET,
                email,
                ip,
                reason = "lockout_triggered",
                attempts,
                locked_until = %locked_until,
                "login failed"
            );
            Ok(AuthError::AccountLocked)
        } else {
            self.accounts.set_login_state(account.id, attempts, None).await?;
            info!(target: AUTH_TARGET, email, ip, reason = "bad_password", attempts, "login failed");
            Ok(AuthError::InvalidCredentials)
        }
    }

    // ========================================
    // Sessions
    // ========================================

    /// Resolves a raw token to the caller it was issued to. The account must
    /// still exist and its profile must be active.
    pub async fn authenticate_token(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let claims = self.tokens.verify(token)?;
        let account = self.accounts.find_account(claims.sub).await?.ok_or(AuthError::InvalidToken)?;
        match self.accounts.find_profile(account.id).await? {
            Some(profile) if profile.is_active => Ok(authenticated(&account, &profile)),
            _ => Err(AuthError::ProfileInactive),
        }
    }

    pub async fn change_password(&self, user_id: Uuid, current: &str, new: &str) -> Result<(), AuthError> {
        let mut errors = ValidationErrors::new();
        errors.check_password("new_password", new);
        errors.into_result(())?;

        let account = self.accounts.find_account(user_id).await?.ok_or(AuthError::UserNotFound)?;
        if !self.hasher.verify(current, &account.password_hash).await {
            info!(target: AUTH_TARGET, email = %account.email, reason = "bad_password", "password change rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let hash = self.hasher.hash(new).await?;
        self.accounts.update_password(user_id, &hash).await?;
        info!(target: AUTH_TARGET, email = %account.email, "password changed");
        Ok(())
    }

    // ========================================
    // Administration
    // ========================================

    pub async fn create_user(&self, input: CreateUserInput) -> Result<UserSummary, AuthError> {
        let mut errors = ValidationErrors::new();

        let email = input.email.unwrap_or_default().trim().to_lowercase();
        errors.check_email("email", &email);

        let password = input.password.unwrap_or_default();
        errors.check_password("password", &password);

        let display_name = input.display_name.unwrap_or_default().trim().to_string();
        errors.check_length("display_name", &display_name, 1, 100);

        let role = match input.role.as_deref() {
            None => Role::Viewer,
            Some(raw) => raw.parse().unwrap_or_else(|msg: String| {
                errors.add("role", msg);
                Role::Viewer
            }),
        };
        errors.into_result(())?;

        let password_hash = self.hasher.hash(&password).await?;
        let created = self
            .accounts
            .create_account(NewAccount { email: email.clone(), password_hash, display_name, role })
            .await;

        match created {
            Ok((account, profile)) => {
                info!(target: AUTH_TARGET, email = %email, role = %role, "account created");
                Ok(UserSummary::new(&account, &profile))
            }
            Err(DatabaseError::UniqueViolation { .. }) => Err(AuthError::DuplicateEmail),
            Err(err) => {
                error!(email = %email, error = %err, "account creation failed");
                Err(err.into())
            }
        }
    }

    pub async fn unlock(&self, user_id: Uuid) -> Result<(), AuthError> {
        if self.accounts.set_login_state(user_id, 0, None).await? {
            info!(target: AUTH_TARGET, user_id = %user_id, "account unlocked");
            Ok(())
        } else {
            Err(AuthError::UserNotFound)
        }
    }
}

fn authenticated(account: &Account, profile: &Profile) -> AuthenticatedUser {
    AuthenticatedUser {
        id: account.id,
        email: account.email.clone(),
        display_name: profile.display_name.clone(),
        role: profile.role,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::database::memory::MemoryAccountStore;

    async fn service() -> (AuthService, Arc<MemoryAccountStore>, Uuid) {
        let store = Arc::new(MemoryAccountStore::new());
        let mut security = AppConfig::development().security;
        security.bcrypt_cost = 4;
        let auth = AuthService::new(&security, store.clone()).unwrap();
        let user = auth
            .create_user(CreateUserInput {
                email: Some("Editor@KMCI.org".to_string()),
                password: Some("correct-password".to_string()),
                display_name: Some("Editor".to_string()),
                role: Some("editor".to_string()),
            })
            .await
            .unwrap();
        (auth, store, user.id)
    }

    #[tokio::test]
    async fn login_is_case_insensitive_on_email() {
        let (auth, _, id) = service().await;
        let outcome = auth.login("EDITOR@kmci.org", "correct-password", &ClientInfo::default()).await.unwrap();
        assert_eq!(outcome.user.id, id);
        assert_eq!(outcome.user.role, Role::Editor);
        assert_eq!(auth.authenticate_token(&outcome.token.token).await.unwrap().id, id);
    }

    #[tokio::test]
    async fn unknown_email_and_bad_password_look_the_same() {
        let (auth, _, _) = service().await;
        let client = ClientInfo::default();
        let unknown = auth.login("nobody@kmci.org", "whatever1", &client).await.unwrap_err();
        let wrong = auth.login("editor@kmci.org", "wrong-password", &client).await.unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn fifth_failure_locks_even_correct_password() {
        let (auth, store, id) = service().await;
        let client = ClientInfo::default();
        for _ in 0..4 {
            assert!(matches!(
                auth.login("editor@kmci.org", "nope-nope", &client).await,
                Err(AuthError::InvalidCredentials)
            ));
        }
        assert!(matches!(
            auth.login("editor@kmci.org", "nope-nope", &client).await,
            Err(AuthError::AccountLocked)
        ));
        assert!(matches!(
            auth.login("editor@kmci.org", "correct-password", &client).await,
            Err(AuthError::AccountLocked)
        ));

        let account = store.find_account(id).await.unwrap().unwrap();
        assert_eq!(account.login_attempts, 5);
        assert!(account.locked_until.is_some());
    }

    #[tokio::test]
    async fn elapsed_lock_allows_login_and_resets_counter() {
        let (auth, store, id) = service().await;
        store.set_login_state(id, 5, Some(Utc::now() - Duration::seconds(1))).await.unwrap();

        auth.login("editor@kmci.org", "correct-password", &ClientInfo::default()).await.unwrap();
        let account = store.find_account(id).await.unwrap().unwrap();
        assert_eq!(account.login_attempts, 0);
        assert!(account.locked_until.is_none());
        assert!(account.last_login_at.is_some());
    }

    #[tokio::test]
    async fn elapsed_lock_restarts_the_count() {
        let (auth, store, id) = service().await;
        store.set_login_state(id, 5, Some(Utc::now() - Duration::seconds(1))).await.unwrap();

        let err = auth.login("editor@kmci.org", "wrong-password", &ClientInfo::default()).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(store.find_account(id).await.unwrap().unwrap().login_attempts, 1);
    }

    #[tokio::test]
    async fn inactive_profile_blocks_login_and_tokens() {
        let (auth, store, id) = service().await;
        let token = auth.login("editor@kmci.org", "correct-password", &ClientInfo::default()).await.unwrap().token;

        store.set_profile_active(id, false).await;
        assert!(matches!(
            auth.login("editor@kmci.org", "correct-password", &ClientInfo::default()).await,
            Err(AuthError::ProfileInactive)
        ));
        assert!(matches!(auth.authenticate_token(&token.token).await, Err(AuthError::ProfileInactive)));
    }

    #[tokio::test]
    async fn duplicate_email_is_reported() {
        let (auth, _, _) = service().await;
        let err = auth
            .create_user(CreateUserInput {
                email: Some("editor@kmci.org".to_string()),
                password: Some("another-password".to_string()),
                display_name: Some("Second".to_string()),
                role: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateEmail));
    }

    #[tokio::test]
    async fn change_password_requires_current() {
        let (auth, _, id) = service().await;
        assert!(matches!(
            auth.change_password(id, "wrong-password", "brand-new-pass").await,
            Err(AuthError::InvalidCredentials)
        ));
        auth.change_password(id, "correct-password", "brand-new-pass").await.unwrap();
        auth.login("editor@kmci.org", "brand-new-pass", &ClientInfo::default()).await.unwrap();
    }
}
