use crate::db::{JournalRepo, SessionInfo, UserInfo};
use crate::handlers::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub session: SessionInfo,
    pub user: UserInfo,
}

/// Resolves bearer tokens to users; installed as a request extension
#[derive(Clone)]
pub struct AuthExtractor {
    pub repo: Arc<JournalRepo>,
}

/// Extractor for required authentication
///
/// Use this for protected endpoints - returns 401 if not authenticated
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthUser);

impl AuthExtractor {
    pub fn new(repo: Arc<JournalRepo>) -> Self {
        Self { repo }
    }

    /// Extract authentication from the Authorization header
    pub fn extract_auth(&self, parts: &Parts) -> Option<AuthUser> {
        let token = bearer_token(parts)?;
        validate_token(&self.repo, token)
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let extractor = parts
            .extensions
            .get::<AuthExtractor>()
            .cloned()
            .ok_or(AppError::AuthNotConfigured)?;

        extractor
            .extract_auth(parts)
            .map(RequireAuth)
            .ok_or_else(AppError::not_authorized)
    }
}

/// Validate a token and return the auth user
pub fn validate_token(repo: &JournalRepo, token: &str) -> Option<AuthUser> {
    let session = repo.validate_session(token).ok()??;
    let user = repo.get_user(session.user_id).ok()??;
    Some(AuthUser { session, user })
}
