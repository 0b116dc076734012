//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tokio::task;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::models::{Role, User};
use crate::services::credentials;
use crate::services::auth_service::{AuthError, AuthService, MAX_USERNAME_LEN, UserInfo};

/// Password checked against the stand-in digest for unknown usernames.
const DUMMY_PASSWORD: &str = "intelboard-unknown-user";

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
    /// Hashed with the configured params so a miss costs the same as a hit.
    dummy_digest: OnceCell<String>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(store: Store, security: SecurityConfig) -> Self {
        Self {
            store,
            security,
            dummy_digest: OnceCell::new(),
        }
    }

    async fn dummy_digest(&self) -> Result<String, AuthError> {
        self.dummy_digest
            .get_or_try_init(|| async {
                let security = self.security.clone();
                let digest = task::spawn_blocking(move || {
                    credentials::hash_password(DUMMY_PASSWORD, &security)
                })
                .await??;
                Ok::<_, AuthError>(digest)
            })
            .await
            .cloned()
    }

    fn validate_username(username: &str) -> Result<(), AuthError> {
        if username.trim().is_empty() {
            return Err(AuthError::Validation("Username cannot be empty".to_string()));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(AuthError::Validation(format!(
                "Username must be at most {MAX_USERNAME_LEN} characters"
            )));
        }
        Ok(())
    }

    fn validate_password(&self, password: &str) -> Result<(), AuthError> {
        let min = self.security.min_password_length;
        if password.chars().count() < min {
            return Err(AuthError::Validation(format!(
                "Password must be at least {min} characters"
            )));
        }
        Ok(())
    }

    /// Looks up `username` and checks `password` off the async runtime.
    async fn authenticate(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let Some(user) = self.store.users().find_by_username(username).await? else {
            // Same Argon2 work as a real check, so timing does not reveal the miss
            let digest = self.dummy_digest().await?;
            let password = password.to_string();
            task::spawn_blocking(move || credentials::verify_password(&password, &digest))
                .await?;
            return Err(AuthError::InvalidCredentials);
        };

        let password = password.to_string();
        let (user, valid) = task::spawn_blocking(move || {
            let valid = user.verify_password(&password);
            (user, valid)
        })
        .await?;

        if valid {
            Ok(user)
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<UserInfo, AuthError> {
        Self::validate_username(username)?;
        self.validate_password(password)?;

        let users = self.store.users();
        if users.exists(username).await? {
            return Err(AuthError::DuplicateUsername);
        }

        let name = username.to_string();
        let password = password.to_string();
        let security = self.security.clone();
        let user = task::spawn_blocking(move || User::register(name, &password, role, &security))
            .await??;

        // A concurrent insert of the same name surfaces as a constraint violation
        let user = users.insert(user).await?;

        info!(username = %user.username(), role = %user.role(), "Registered user");
        Ok(UserInfo::from(&user))
    }

    async fn login(&self, username: &str, password: &str) -> Result<UserInfo, AuthError> {
        let result = self.authenticate(username, password).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(AuthError::InvalidCredentials) => "invalid",
            Err(_) => "error",
        };
        metrics::counter!("auth_login_attempts_total", "outcome" => outcome).increment(1);

        match result {
            Ok(user) => {
                info!(username = %user.username(), "User logged in");
                Ok(UserInfo::from(&user))
            }
            Err(err) => {
                warn!(username = %username, "Login failed: {err}");
                Err(err)
            }
        }
    }

    async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        self.validate_password(new_password)?;

        let user = self.authenticate(username, current_password).await?;

        let password = new_password.to_string();
        let security = self.security.clone();
        let user = task::spawn_blocking(move || {
            let mut user = user;
            user.rehash(&password, &security).map(|()| user)
        })
        .await??;

        if !self.store.users().update_password(&user).await? {
            return Err(AuthError::UserNotFound);
        }

        info!(username = %username, "Password changed");
        Ok(())
    }

    async fn get_user_role(&self, username: &str) -> Result<Option<Role>, AuthError> {
        Ok(self.store.users().role_of(username).await?)
    }

    async fn user_exists(&self, username: &str) -> Result<bool, AuthError> {
        Ok(self.store.users().exists(username).await?)
    }

    async fn get_user_info(&self, username: &str) -> Result<UserInfo, AuthError> {
        let user = self
            .store
            .users()
            .find_by_username(username)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(UserInfo::from(&user))
    }
}
