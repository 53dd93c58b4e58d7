//! HTTP implementation of [`JournalService`].
//!
//! Every failure is mapped onto exactly one [`ApiError`] variant:
//!
//! | Response                  | Error                         |
//! |---------------------------|-------------------------------|
//! | 401 on an authorized call | `Auth`, and the session drops |
//! | 404                       | `NotFound`                    |
//! | 408, 429, 5xx, transport  | `Network`                     |
//! | any other 4xx             | `Validation` (with violations)|
//! | no response in time       | `Timeout`                     |

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use journal_core::config::Config;
use journal_core::entry::{EntryId, EntryPatch, EntryPayload, JournalEntry, UserId};
use journal_core::error::ApiError;
use journal_core::remote::{ApiResult, BoxFuture, JournalService};
use journal_core::session::{Session, SessionUser};
use journal_core::streak::StreakSummary;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

/// Body of register and login responses.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub token: String,
}

/// Account details returned by the profile endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub last_login_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    violations: IndexMap<String, String>,
}

/// Whether a request carries the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Public,
    Bearer,
}

/// Talks to the journal REST service on behalf of one [`Session`].
pub struct HttpJournalClient {
    http: reqwest::Client,
    session: RwLock<Session>,
    timeout: Duration,
    expired: AtomicBool,
}

impl HttpJournalClient {
    pub fn new(session: Session, timeout: Duration) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            session: RwLock::new(session),
            timeout,
            expired: AtomicBool::new(false),
        })
    }

    pub fn from_config(config: &Config) -> ApiResult<Self> {
        Self::new(Session::from_config(config), config.request_timeout())
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        self.session.read().unwrap().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.read().unwrap().is_authenticated()
    }

    /// True once the server rejected the credential during this run.
    pub fn session_expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }

    /// Create an account and sign in as it.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> ApiResult<SessionUser> {
        let request = self.http.post(self.url("/users/register")).json(&json!({
            "username": username,
            "email": email,
            "password": password,
        }));
        let auth: AuthResponse = self.send(request, Access::Public).await?;
        Ok(self.sign_in(auth))
    }

    /// Exchange credentials for a session token.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<SessionUser> {
        let request = self.http.post(self.url("/users/login")).json(&json!({
            "email": email,
            "password": password,
        }));
        let auth: AuthResponse = self.send(request, Access::Public).await?;
        Ok(self.sign_in(auth))
    }

    pub async fn profile(&self) -> ApiResult<Profile> {
        let request = self.http.get(self.url("/users/profile"));
        self.send(request, Access::Bearer).await
    }

    /// Revoke the token on the server. The local session is dropped even if
    /// the server cannot be reached.
    pub async fn logout(&self) -> ApiResult<()> {
        let request = self.http.post(self.url("/users/logout"));
        let result = self
            .send::<serde_json::Value>(request, Access::Bearer)
            .await
            .map(|_| ());
        self.session.write().unwrap().expire();
        result
    }

    fn sign_in(&self, auth: AuthResponse) -> SessionUser {
        let user = SessionUser {
            username: auth.username,
            email: auth.email,
        };
        self.session.write().unwrap().sign_in(auth.token, user.clone());
        self.expired.store(false, Ordering::SeqCst);
        log::info!("signed in as user {}", auth.id);
        user
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.session.read().unwrap().server_url(), path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        access: Access,
    ) -> ApiResult<T> {
        let request = match access {
            Access::Public => request,
            Access::Bearer => {
                let token = self.session.read().unwrap().bearer()?.to_string();
                request.bearer_auth(token)
            }
        };

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        self.read_response(response, access).await
    }

    async fn read_response<T: DeserializeOwned>(
        &self,
        response: Response,
        access: Access,
    ) -> ApiResult<T> {
        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|e| {
                if e.is_timeout() {
                    ApiError::Timeout(self.timeout)
                } else {
                    ApiError::Network(format!("Invalid response: {e}"))
                }
            });
        }

        let (message, violations) = match response.json::<ErrorBody>().await {
            Ok(body) => (body.message, body.violations),
            Err(_) => (
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string(),
                IndexMap::new(),
            ),
        };
        log::debug!("{status}: {message}");

        let error = status_error(status, access, message, violations);
        if error == ApiError::Auth {
            self.session.write().unwrap().expire();
            self.expired.store(true, Ordering::SeqCst);
        }
        Err(error)
    }

    fn transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.timeout)
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

/// Error for a non-success status. Only server-side and throttling failures
/// are transient; other 4xx responses are rejections of the request.
fn status_error(
    status: StatusCode,
    access: Access,
    message: String,
    violations: IndexMap<String, String>,
) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED if access == Access::Bearer => ApiError::Auth,
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            ApiError::Network(format!("{status}: {message}"))
        }
        // Includes bad credentials on login and axum's body rejections
        s if s.is_client_error() => ApiError::Validation {
            message,
            violations,
        },
        _ => ApiError::Network(format!("{status}: {message}")),
    }
}

impl JournalService for HttpJournalClient {
    fn create_entry(&self, payload: EntryPayload) -> BoxFuture<'_, ApiResult<JournalEntry>> {
        Box::pin(async move {
            let request = self.http.post(self.url("/journal")).json(&payload);
            self.send(request, Access::Bearer).await
        })
    }

    fn update_entry(
        &self,
        id: EntryId,
        patch: EntryPatch,
    ) -> BoxFuture<'_, ApiResult<JournalEntry>> {
        Box::pin(async move {
            let request = self
                .http
                .put(self.url(&format!("/journal/{id}")))
                .json(&patch);
            self.send(request, Access::Bearer).await
        })
    }

    fn get_entries(&self) -> BoxFuture<'_, ApiResult<Vec<JournalEntry>>> {
        Box::pin(async move {
            let request = self.http.get(self.url("/journal"));
            self.send(request, Access::Bearer).await
        })
    }

    fn get_entry(&self, id: EntryId) -> BoxFuture<'_, ApiResult<JournalEntry>> {
        Box::pin(async move {
            let request = self.http.get(self.url(&format!("/journal/{id}")));
            self.send(request, Access::Bearer).await
        })
    }

    fn search_entries(&self, query: String) -> BoxFuture<'_, ApiResult<Vec<JournalEntry>>> {
        Box::pin(async move {
            let request = self
                .http
                .get(self.url("/journal/search"))
                .query(&[("query", query.as_str())]);
            self.send(request, Access::Bearer).await
        })
    }

    fn get_streak(&self) -> BoxFuture<'_, ApiResult<StreakSummary>> {
        Box::pin(async move {
            let request = self.http.get(self.url("/journal/streak"));
            self.send(request, Access::Bearer).await
        })
    }

    fn delete_entry(&self, id: EntryId) -> BoxFuture<'_, ApiResult<()>> {
        Box::pin(async move {
            let request = self.http.delete(self.url(&format!("/journal/{id}")));
            self.send::<serde_json::Value>(request, Access::Bearer)
                .await
                .map(|_| ())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_are_rooted_at_api() {
        let client = HttpJournalClient::new(
            Session::new("http://localhost:3000/"),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.url("/journal/7"), "http://localhost:3000/api/journal/7");
    }

    #[tokio::test]
    async fn test_signed_out_calls_fail_without_request() {
        // Nothing listens on the discard port, so reaching the network would
        // surface as a Network error instead.
        let client =
            HttpJournalClient::new(Session::new("http://127.0.0.1:9"), Duration::from_secs(5))
                .unwrap();
        assert_eq!(client.get_entries().await, Err(ApiError::Auth));
        assert!(!client.session_expired());
    }

    fn error_for(status: u16, access: Access) -> ApiError {
        let status = StatusCode::from_u16(status).unwrap();
        status_error(status, access, "nope".to_string(), IndexMap::new())
    }

    #[test]
    fn test_client_errors_are_not_retried() {
        // Body rejections from the router (422, 415) and bad logins
        for status in [400, 401, 409, 415, 422] {
            let error = error_for(status, Access::Public);
            assert!(matches!(error, ApiError::Validation { .. }), "{status}: {error:?}");
            assert!(!error.is_transient());
        }
        assert!(matches!(error_for(422, Access::Bearer), ApiError::Validation { .. }));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(error_for(401, Access::Bearer), ApiError::Auth);
        assert_eq!(error_for(404, Access::Bearer), ApiError::NotFound("nope".into()));
        for status in [408, 429, 500, 503] {
            let error = error_for(status, Access::Bearer);
            assert!(matches!(error, ApiError::Network(_)), "{status}: {error:?}");
            assert!(error.is_transient());
        }
    }
}
