use axum::{
    Extension, Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::services::UserInfo;
use crate::session::Identity;
use crate::shelf::Shelves;

/// Session key holding the signed-in [`Identity`].
const IDENTITY_KEY: &str = "identity";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub username: String,
    pub api_key: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct ApiKeyResponse {
    pub api_key: String,
}

/// Identity resolved for the current request, if any.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<Identity>);

impl CurrentUser {
    pub fn require(&self) -> Result<&Identity, ApiError> {
        self.0
            .as_ref()
            .ok_or_else(|| ApiError::Unauthorized("Debes iniciar sesión".to_string()))
    }

    /// Shelves of the signed-in user, shared with concurrent requests.
    #[must_use]
    pub fn shelves(&self, state: &AppState) -> Option<Arc<Shelves>> {
        self.0
            .as_ref()
            .map(|identity| state.shelves().acquire(identity))
    }

    pub fn require_shelves(&self, state: &AppState) -> Result<Arc<Shelves>, ApiError> {
        let identity = self.require()?;
        Ok(state.shelves().acquire(identity))
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the caller from:
/// 1. Session cookie (from login)
/// 2. `X-Api-Key` header
/// 3. `Authorization: Bearer <api_key>` header
///
/// Anonymous requests pass through; handlers decide what needs sign-in.
pub async fn identity_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let mut identity = session
        .get::<Identity>(IDENTITY_KEY)
        .await
        .ok()
        .flatten();

    if identity.is_none()
        && let Some(key) = extract_api_key(&headers)
        && let Ok(Some(user)) = state.auth().verify_api_key(&key).await
    {
        identity = Some(Identity::new(user.id, user.username));
    }

    if let Some(identity) = &identity {
        tracing::Span::current().record("user_id", identity.user_id.value());
    }

    request.extensions_mut().insert(CurrentUser(identity));
    next.run(request).await
}

fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(key_str.to_string());
    }

    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    if payload.username.trim().is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state
        .auth()
        .login(payload.username.trim(), &payload.password)
        .await?;

    let identity = Identity::new(result.user_id, result.username.clone());
    session
        .insert(IDENTITY_KEY, &identity)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    Ok(Json(ApiResponse::success(LoginResponse {
        username: result.username,
        api_key: result.api_key,
    })))
}

/// POST /auth/logout
pub async fn logout(session: Session) -> Json<ApiResponse<MessageResponse>> {
    let _ = session.flush().await;
    Json(ApiResponse::success(MessageResponse::new("Sesión cerrada")))
}

/// GET /auth/me
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let identity = user.require()?;
    let info = state.auth().get_user_info(&identity.username).await?;
    Ok(Json(ApiResponse::success(info)))
}

/// PUT /auth/password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let identity = user.require()?;

    if payload.current_password == payload.new_password {
        return Err(ApiError::validation(
            "New password must be different from current password",
        ));
    }

    state
        .auth()
        .change_password(
            &identity.username,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password updated successfully",
    ))))
}

/// GET /auth/api-key
pub async fn get_api_key(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<ApiKeyResponse>>, ApiError> {
    let identity = user.require()?;
    let api_key = state.auth().get_api_key(&identity.username).await?;
    Ok(Json(ApiResponse::success(ApiKeyResponse { api_key })))
}

/// POST /auth/api-key/regenerate
pub async fn regenerate_api_key(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<ApiKeyResponse>>, ApiError> {
    let identity = user.require()?;
    let api_key = state.auth().regenerate_api_key(&identity.username).await?;
    Ok(Json(ApiResponse::success(ApiKeyResponse { api_key })))
}
