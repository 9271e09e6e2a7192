use std::sync::Arc;

use eyre::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::authorization::TokenKeys;
use crate::credentials::CredentialHasher;
use crate::error::{ApiError, persistence};
use crate::model::{NewUser, User};
use crate::store::UserStore;

const MIN_PASSWORD_LEN: usize = 3;

/// Body of a registration request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Login {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub name: String,
}

/// Registration and login.
///
/// Cheaply cloneable.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn CredentialHasher>,
    keys: TokenKeys,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn CredentialHasher>,
        keys: TokenKeys,
    ) -> Self {
        Self {
            users,
            hasher,
            keys,
        }
    }

    pub async fn register(&self, registration: Registration) -> Result<User, ApiError> {
        if registration.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::Validation("password too short".into()));
        }
        let hasher = self.hasher.clone();
        let password = registration.password;
        let password_hash = blocking(move || hasher.hash(&password))
            .await
            .map_err(persistence("cannot hash password"))?;

        let user = NewUser {
            username: registration.username,
            name: registration.name,
            password_hash,
        }
        .into_user()?;

        let inserted = self
            .users
            .insert_user(user.clone())
            .await
            .map_err(persistence("cannot save user"))?;
        if !inserted {
            return Err(ApiError::Validation("username must be unique".into()));
        }
        info!("registered user {}", user.id);
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>, ApiError> {
        self.users
            .list_users()
            .await
            .map_err(persistence("cannot list users"))
    }

    /// Checks the credentials and issues a bearer token for the user.
    pub async fn login(&self, login: Login) -> Result<LoginResponse, ApiError> {
        let Some(user) = self
            .users
            .find_by_username(&login.username)
            .await
            .map_err(persistence("cannot look up user"))?
        else {
            debug!("login for unknown username {:?}", login.username);
            return Err(ApiError::InvalidCredentials);
        };

        let hasher = self.hasher.clone();
        let hash = user.password_hash.clone();
        let matches = blocking(move || hasher.verify(&login.password, &hash))
            .await
            .map_err(persistence("cannot check password"))?;
        if !matches {
            debug!("wrong password for user {}", user.id);
            return Err(ApiError::InvalidCredentials);
        }

        let token = self
            .keys
            .issue(user.id)
            .map_err(persistence("cannot issue token"))?;
        Ok(LoginResponse {
            token,
            username: user.username,
            name: user.name,
        })
    }
}

/// Hashing is CPU bound, keep it off the async workers.
async fn blocking<T, F>(f: F) -> eyre::Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> eyre::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .context("credential task did not complete")?
}
