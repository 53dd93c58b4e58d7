use super::{AppError, AppState};
use crate::auth::{RequireAuth, hash_password, verify_password};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use journal_core::entry::UserId;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Request body for registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Response for register and login
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub token: String,
}

/// Response for the profile endpoint
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub last_login_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Create user routes
pub fn user_routes(state: AppState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", get(profile))
        .route("/logout", post(logout))
        .with_state(state)
}

/// Field-level problems with a registration request
fn registration_violations(
    username: &str,
    email: &str,
    password: &str,
) -> IndexMap<String, String> {
    let mut violations = IndexMap::new();

    let username_len = username.chars().count();
    if !(3..=30).contains(&username_len) {
        violations.insert(
            "username".to_string(),
            "must be between 3 and 30 characters".to_string(),
        );
    }
    if !email.contains('@') || email.len() < 5 {
        violations.insert("email".to_string(), "is not a valid email address".to_string());
    }
    if password.chars().count() < 6 {
        violations.insert(
            "password".to_string(),
            "must be at least 6 characters".to_string(),
        );
    }

    violations
}

/// POST /api/users/register
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let username = body.username.trim();
    let email = body.email.trim().to_lowercase();

    let violations = registration_violations(username, &email, &body.password);
    if !violations.is_empty() {
        let message = violations
            .iter()
            .map(|(field, problem)| format!("{field} {problem}"))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(AppError::Validation {
            message,
            violations,
        });
    }

    if state.repo.user_exists(&email, username)? {
        return Err(AppError::BadRequest("User already exists".to_string()));
    }

    let password_hash = hash_password(&body.password)?;
    let id = state.repo.create_user(username, &email, &password_hash)?;
    let token = issue_session(&state, id)?;

    info!("Registered user {} ({})", username, id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            id,
            username: username.to_string(),
            email,
            token,
        }),
    ))
}

/// POST /api/users/login
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = body.email.trim().to_lowercase();

    let user = state
        .repo
        .get_user_by_email(&email)?
        .filter(|user| verify_password(&user.password_hash, &body.password))
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    state.repo.update_last_login(user.id)?;
    let token = issue_session(&state, user.id)?;

    info!("User {} logged in", user.id);

    Ok(Json(AuthResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        token,
    }))
}

/// GET /api/users/profile
async fn profile(RequireAuth(auth): RequireAuth) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        id: auth.user.id,
        username: auth.user.username,
        email: auth.user.email,
        created_at: auth.user.created_at,
        last_login_date: auth.user.last_login_at,
    })
}

/// POST /api/users/logout
async fn logout(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<MessageResponse>, AppError> {
    state.repo.delete_session(&auth.session.token)?;
    info!("User {} logged out", auth.user.id);
    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

fn issue_session(state: &AppState, user_id: UserId) -> Result<String, AppError> {
    let expires_at = Utc::now() + Duration::days(state.session_expiry_days);
    Ok(state.repo.create_session(user_id, expires_at)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_rules() {
        assert!(registration_violations("ada", "ada@x.io", "secret").is_empty());

        let violations = registration_violations("ab", "nope", "12345");
        let fields: Vec<_> = violations.keys().map(String::as_str).collect();
        assert_eq!(fields, vec!["username", "email", "password"]);

        assert!(registration_violations(&"a".repeat(30), "a@b.c", "123456").is_empty());
        assert!(!registration_violations(&"a".repeat(31), "a@b.c", "123456").is_empty());
    }
}
