//! `SeaORM` implementation of the `AuthService` trait.

use crate::config::SecurityConfig;
use crate::db::{Store, User};
use crate::services::auth_service::{AuthError, AuthService, LoginResult, UserInfo};
use async_trait::async_trait;

const MIN_PASSWORD_LEN: usize = 8;

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

fn check_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        let user = self
            .store
            .verify_user_password(username, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        Ok(LoginResult {
            user_id: user.id,
            username: user.username,
            api_key: user.api_key,
        })
    }

    async fn verify_api_key(&self, api_key: &str) -> Result<Option<UserInfo>, AuthError> {
        let user = self.store.verify_api_key(api_key).await?;
        Ok(user.map(UserInfo::from))
    }

    async fn get_user_info(&self, username: &str) -> Result<UserInfo, AuthError> {
        self.store
            .get_user_by_username(username)
            .await?
            .map(UserInfo::from)
            .ok_or(AuthError::UserNotFound)
    }

    async fn register(&self, username: &str, password: &str) -> Result<UserInfo, AuthError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::Validation("Username is required".to_string()));
        }
        check_password(password)?;

        if self.store.get_user_by_username(username).await?.is_some() {
            return Err(AuthError::Validation(format!(
                "User {username} already exists"
            )));
        }

        let user = self
            .store
            .create_user(username, password, &self.security)
            .await?;
        Ok(user.into())
    }

    async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        check_password(new_password)?;

        if current_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        if self
            .store
            .verify_user_password(username, current_password)
            .await?
            .is_none()
        {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        self.store
            .update_user_password(username, new_password, &self.security)
            .await?;

        Ok(())
    }

    async fn get_api_key(&self, username: &str) -> Result<String, AuthError> {
        self.store
            .get_user_by_username(username)
            .await?
            .map(|user| user.api_key)
            .ok_or(AuthError::UserNotFound)
    }

    async fn regenerate_api_key(&self, username: &str) -> Result<String, AuthError> {
        Ok(self.store.regenerate_user_api_key(username).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn service() -> SeaOrmAuthService {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let security = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        };
        SeaOrmAuthService::new(store, security)
    }

    #[tokio::test]
    async fn test_seeded_admin_can_log_in() {
        let auth = service().await;

        let login = auth.login("admin", "password").await.unwrap();
        assert_eq!(login.username, "admin");
        assert!(matches!(
            auth.login("admin", "nope").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("ghost", "password").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_then_login_and_api_key() {
        let auth = service().await;

        let info = auth.register("lucia", "sup3rsecret").await.unwrap();
        let login = auth.login("lucia", "sup3rsecret").await.unwrap();
        assert_eq!(login.user_id, info.id);

        let owner = auth.verify_api_key(&login.api_key).await.unwrap().unwrap();
        assert_eq!(owner.username, "lucia");

        assert!(matches!(
            auth.register("lucia", "sup3rsecret").await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            auth.register("pablo", "short").await,
            Err(AuthError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_change_password_requires_current() {
        let auth = service().await;

        assert!(auth
            .change_password("admin", "wrong-password", "n3wpassword")
            .await
            .is_err());
        auth.change_password("admin", "password", "n3wpassword")
            .await
            .unwrap();
        assert!(auth.login("admin", "n3wpassword").await.is_ok());
    }
}
