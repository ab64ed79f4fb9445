//! Domain service for sign-in and account management.

use serde::Serialize;
use thiserror::Error;

use crate::domain::UserId;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Credenciales inválidas")]
    InvalidCredentials,

    #[error("Usuario no encontrado")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: UserId,
    pub username: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub user_id: UserId,
    pub username: String,
    pub api_key: String,
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown user or a wrong password.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// The owner of an API key, if any.
    async fn verify_api_key(&self, api_key: &str) -> Result<Option<UserInfo>, AuthError>;

    async fn get_user_info(&self, username: &str) -> Result<UserInfo, AuthError>;

    /// Registers a new account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for a blank username or a short password.
    async fn register(&self, username: &str, password: &str) -> Result<UserInfo, AuthError>;

    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if the current password is wrong or the new one is invalid.
    async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    async fn get_api_key(&self, username: &str) -> Result<String, AuthError>;

    async fn regenerate_api_key(&self, username: &str) -> Result<String, AuthError>;
}
