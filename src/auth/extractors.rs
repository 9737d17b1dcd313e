use crate::auth::{claims::TokenClaims, errors::AuthError, jwt::JwtService};
use crate::models::{Requester, User};
use crate::repositories::RecordStore;
use crate::services::file::FileService;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Name of the cookie carrying the session token.
pub const AUTH_COOKIE: &str = "auth_token";

// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub file_service: Arc<FileService>,
    pub jwt_service: JwtService,
    pub config: crate::config::AppConfig,
}

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    #[allow(dead_code)]
    pub claims: TokenClaims,
}

impl AuthenticatedUser {
    pub fn requester(&self) -> Requester {
        self.user.requester()
    }
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers)?;
        extract_authenticated_user(state, &token).await
    }
}

// Optional authentication extractor for endpoints that can work with or without auth
pub struct OptionalUser(pub Option<AuthenticatedUser>);

impl OptionalUser {
    pub fn requester(&self) -> Option<Requester> {
        self.0.as_ref().map(AuthenticatedUser::requester)
    }
}

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = match extract_token(&parts.headers) {
            Ok(t) => t,
            Err(_) => return Ok(OptionalUser(None)),
        };

        match extract_authenticated_user(state, &token).await {
            Ok(user) => Ok(OptionalUser(Some(user))),
            Err(e) => {
                debug!("Treating request as anonymous: {}", e);
                Ok(OptionalUser(None))
            }
        }
    }
}

/// Bearer header first, then the session cookie.
fn extract_token(headers: &HeaderMap) -> Result<String, AuthError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_header = auth_header.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
        return auth_header
            .strip_prefix("Bearer ")
            .map(str::to_string)
            .ok_or(AuthError::InvalidAuthHeader);
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookies| cookie_value(cookies, AUTH_COOKIE))
        .ok_or(AuthError::MissingToken)
}

fn cookie_value(cookies: &str, name: &str) -> Option<String> {
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name && !value.is_empty()).then(|| value.to_string())
    })
}

/// Helper function to extract and validate an authenticated user from a token
async fn extract_authenticated_user(
    state: &AppState,
    token: &str,
) -> Result<AuthenticatedUser, AuthError> {
    let claims = state.jwt_service.decode_token(token).map_err(|e| {
        debug!("Failed to decode token: {:?}", e);
        AuthError::InvalidToken(e.to_string())
    })?;

    if claims.is_expired() {
        warn!("Token expired for user ID: {}", claims.sub);
        return Err(AuthError::TokenExpired);
    }

    let user_id = claims
        .user_id()
        .ok_or_else(|| AuthError::InvalidToken(format!("bad subject {:?}", claims.sub)))?;

    let user = state
        .store
        .find_user_by_id(user_id)
        .await
        .map_err(|e| {
            error!("Database error while fetching user {}: {:?}", user_id, e);
            AuthError::DatabaseError(e.to_string())
        })?
        .ok_or_else(|| {
            warn!("User not found for ID: {}", user_id);
            AuthError::UserNotFound
        })?;

    debug!("Authenticated user {}", user.id);
    Ok(AuthenticatedUser { user, claims })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_value_lookup() {
        assert_eq!(
            cookie_value("theme=dark; auth_token=abc.def.ghi; other=1", AUTH_COOKIE),
            Some("abc.def.ghi".to_string())
        );
        assert_eq!(cookie_value("auth_token=", AUTH_COOKIE), None);
        assert_eq!(cookie_value("xauth_token=abc", AUTH_COOKIE), None);
        assert_eq!(cookie_value("", AUTH_COOKIE), None);
    }

    #[test]
    fn test_bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(header::COOKIE, HeaderValue::from_static("auth_token=from-cookie"));

        assert_eq!(extract_token(&headers).unwrap(), "from-header");
    }

    #[test]
    fn test_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("auth_token=from-cookie"));

        assert_eq!(extract_token(&headers).unwrap(), "from-cookie");
    }

    #[test]
    fn test_missing_and_malformed_tokens() {
        assert!(matches!(extract_token(&HeaderMap::new()), Err(AuthError::MissingToken)));

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(matches!(extract_token(&headers), Err(AuthError::InvalidAuthHeader)));
    }
}
