use axum::{
    Extension, Json,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::validation::validate_username_base;
use super::{ApiError, ApiResponse, AppState, IdentityDto, MessageResponse};
use crate::constants::session::USER_ID_KEY;
use crate::domain::{Identity, IdentityKind, RecordId};
use crate::services::{IdentityError, NewIdentity, ProviderProfile};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    /// `User` (default) or `Applicant`.
    #[serde(default, rename = "_type")]
    pub kind: Option<IdentityKind>,

    #[serde(flatten)]
    pub identity: NewIdentity,
}

#[derive(Deserialize)]
pub struct SigninRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// The identity loaded by the session middleware for the current request.
#[derive(Clone)]
pub struct CurrentUser(pub Identity);

// ============================================================================
// Middleware
// ============================================================================

/// Requires a signed-in session and exposes the identity as [`CurrentUser`].
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = session_identity(&state, &session).await?;
    tracing::Span::current().record("user_id", identity.username());

    request.extensions_mut().insert(CurrentUser(identity));
    Ok(next.run(request).await)
}

/// Like [`auth_middleware`], and additionally requires the admin role.
pub async fn admin_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = session_identity(&state, &session).await?;

    if !identity.is_admin() {
        tracing::warn!(username = %identity.username(), "Non-admin tried an admin route");
        return Err(ApiError::Forbidden("User is not authorized".to_string()));
    }

    request.extensions_mut().insert(CurrentUser(identity));
    Ok(next.run(request).await)
}

async fn session_identity(state: &AppState, session: &Session) -> Result<Identity, ApiError> {
    let id = session
        .get::<String>(USER_ID_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("User is not logged in".to_string()))?;

    match state.identity_service().get(&RecordId::from(id)).await {
        Ok(identity) => Ok(identity),
        Err(IdentityError::NotFound(_)) => {
            // The account was deleted while the session was alive.
            let _ = session.flush().await;
            Err(ApiError::Unauthorized("User is not logged in".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

async fn start_session(session: &Session, identity: &Identity) -> Result<(), ApiError> {
    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    session
        .insert(USER_ID_KEY, identity.id().as_str())
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/signup
/// Register a local account and sign it in
pub async fn signup(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<ApiResponse<IdentityDto>>, ApiError> {
    let kind = payload.kind.unwrap_or(IdentityKind::User);
    if kind == IdentityKind::Instructor {
        return Err(ApiError::validation(
            "Instructors are created by an administrator",
        ));
    }

    let identity = state
        .identity_service()
        .register(kind, payload.identity)
        .await?;

    start_session(&session, &identity).await?;

    Ok(Json(ApiResponse::success(IdentityDto::from(&identity))))
}

/// POST /auth/signin
pub async fn signin(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<SigninRequest>,
) -> Result<Json<ApiResponse<IdentityDto>>, ApiError> {
    if payload.username.trim().is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let identity = state
        .identity_service()
        .sign_in(&payload.username, &payload.password)
        .await?;

    start_session(&session, &identity).await?;

    Ok(Json(ApiResponse::success(IdentityDto::from(&identity))))
}

/// POST /auth/provider
/// Sign in with a profile from an external identity provider
pub async fn provider_signin(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(mut profile): Json<ProviderProfile>,
) -> Result<Json<ApiResponse<IdentityDto>>, ApiError> {
    if !state.config().read().await.server.allow_provider_login {
        return Err(ApiError::Forbidden(
            "Provider login is disabled".to_string(),
        ));
    }

    profile.username = validate_username_base(&profile.username)?.to_string();

    let identity = state
        .identity_service()
        .sign_in_with_provider(profile)
        .await?;

    start_session(&session, &identity).await?;

    Ok(Json(ApiResponse::success(IdentityDto::from(&identity))))
}

/// POST /auth/signout
pub async fn signout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    Json(ApiResponse::success(MessageResponse::new("Signed out")))
}

/// GET /auth/me
pub async fn get_current_user(
    Extension(CurrentUser(identity)): Extension<CurrentUser>,
) -> Json<ApiResponse<IdentityDto>> {
    Json(ApiResponse::success(IdentityDto::from(&identity)))
}

/// PUT /auth/password
/// Change password (requires current password verification)
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(identity)): Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .identity_service()
        .change_password(
            identity.id(),
            &payload.current_password,
            &payload.new_password,
        )
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password updated successfully",
    ))))
}
