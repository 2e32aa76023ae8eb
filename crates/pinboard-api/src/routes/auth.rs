//! Authentication extractor and login route

use axum::{
    Form, Json, Router,
    extract::{FromRef, FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts},
    routing::post,
};
use pinboard_auth::verify_password;
use pinboard_db::User;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{LoginForm, TokenResponse};

// ==================== Identity Resolution ====================

/// Extractor for the authenticated user
///
/// Verifies the bearer token, then resolves the subject against the database
/// on every request. A valid signature is not enough: if the subject row no
/// longer exists the request is rejected, so deleted accounts lose access
/// immediately.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        let subject_id = app_state
            .tokens
            .verify(token)
            .map_err(|_| ApiError::Unauthorized)?;

        let user = app_state
            .db
            .get_user_by_id(subject_id)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        debug!("Authenticated user: {} ({})", user.email, user.id);
        Ok(CurrentUser(user))
    }
}

// ==================== Login Route ====================

/// POST /login
async fn login(
    State(state): State<AppState>,
    Form(credentials): Form<LoginForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    // Field presence is checked before touching the database
    if credentials.username.is_empty() || credentials.password.is_empty() {
        return Err(ApiError::Unprocessable(
            "Username and password are required".to_string(),
        ));
    }

    debug!("Login attempt for user: {}", credentials.username);

    let user_result = state.db.get_user_by_email(&credentials.username).await?;

    // Always run a password verification, against a dummy hash when the user
    // doesn't exist, to keep unknown-email and wrong-password timing close.
    // This dummy hash is a valid Argon2 hash that will always fail verification.
    const DUMMY_HASH: &str =
        "$argon2id$v=19$m=19456,t=2,p=1$dGltaW5nX2F0dGFja19wcmV2ZW50aW9u$K8rI5T7VdQ8xkO0GqK5K2w";

    let (hash_to_verify, user) = match user_result {
        Some(u) => (u.password_hash.clone(), Some(u)),
        None => (DUMMY_HASH.to_string(), None),
    };

    let password_valid = verify_password(&credentials.password, &hash_to_verify)?;

    // Unknown email and wrong password are indistinguishable to the caller
    let user = match (user, password_valid) {
        (Some(u), true) => u,
        _ => return Err(ApiError::InvalidCredentials),
    };

    let token = state.tokens.issue(user.id)?;

    metrics::counter!("pinboard_logins_total").increment(1);
    info!("User {} logged in successfully", user.email);

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "Bearer token".to_string(),
    }))
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}
