//! Auth routes for login, current-user info, and logout

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::auth::models::{CurrentUser, LoginRequest, TokenResponse};
use crate::database::models::UserAccount;
use crate::error::ApiError;
use crate::server::AppState;

/// `POST /api/v1/auth/login`
///
/// Verifies the password against the stored argon2 hash and answers with a
/// freshly issued token plus the account's identity snapshot. Unknown
/// usernames and wrong passwords are indistinguishable from the outside.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let username = payload.username.trim();

    let account = UserAccount::fetch_active_by_username(state.db.pool(), username)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid username or password"))?;

    let parsed_hash = PasswordHash::new(&account.password_hash).map_err(|e| {
        tracing::error!(user_id = account.user_id, "stored password hash unreadable: {e}");
        ApiError::Internal
    })?;
    if Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(ApiError::unauthorized("Invalid username or password"));
    }

    let token = state.authenticator.tokens().issue(
        account.user_id,
        account.employee_id,
        &account.username,
        account.role_id,
        &account.role_name,
    );

    let user = CurrentUser {
        user_id: account.user_id,
        employee_id: account.employee_id,
        username: account.username,
        role_id: account.role_id,
        role_name: account.role_name,
    };

    tracing::info!(user_id = user.user_id, username = %user.username, "login succeeded");
    Ok(Json(TokenResponse::new(token, user)))
}

/// `GET /api/v1/auth/me`
///
/// Echoes the authenticated identity the middleware resolved for this
/// request.
pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<Value> {
    Json(json!({ "data": user }))
}

/// `POST /api/v1/auth/logout`
///
/// Tokens are stateless, so logout is client-side; this endpoint exists so
/// clients have something idempotent to call.
pub async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}
