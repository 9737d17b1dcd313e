use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use validator::Validate;

use crate::auth::password::verify_password;
use crate::auth::{extractors::AppState, AuthError, AuthenticatedUser, AUTH_COOKIE};
use crate::models::user::{GlobalRole, User};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub job_title: Option<String>,
    pub department_id: Option<i64>,
    pub global_role: GlobalRole,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            job_title: user.job_title,
            department_id: user.department_id,
            global_role: user.global_role,
        }
    }
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

async fn login(
    State(app_state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, AuthError> {
    req.validate().map_err(|_| AuthError::InvalidCredentials)?;

    let user = app_state
        .store
        .find_user_by_email(&req.email)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(&req.password, &user.password_hash) {
        warn!("Failed login for user {}", user.id);
        return Err(AuthError::InvalidCredentials);
    }

    let token = app_state
        .jwt_service
        .create_token_for_user(user.id, user.global_role.to_string())
        .map_err(|e| AuthError::TokenIssue(e.to_string()))?;

    let cookie = session_cookie(&token, app_state.jwt_service.expires_in().num_seconds())?;

    info!("User {} logged in", user.id);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse { token, user: UserInfo::from(user) }),
    )
        .into_response())
}

async fn logout() -> Result<Response, AuthError> {
    let cookie = session_cookie("", 0)?;
    Ok(([(header::SET_COOKIE, cookie)], Json(json!({ "ok": true }))).into_response())
}

async fn me(auth_user: AuthenticatedUser) -> Json<UserInfo> {
    Json(UserInfo::from(auth_user.user))
}

fn session_cookie(token: &str, max_age: i64) -> Result<HeaderValue, AuthError> {
    HeaderValue::from_str(&format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        AUTH_COOKIE, token, max_age
    ))
    .map_err(|e| AuthError::TokenIssue(e.to_string()))
}
