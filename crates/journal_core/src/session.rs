//! The signed-in account of a client.
//!
//! A [`Session`] is created at startup from the saved [`Config`], passed to
//! whatever talks to the service, and dropped on logout. There is no global
//! token storage.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::ApiError;

/// Account details kept alongside the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub username: String,
    pub email: String,
}

/// Server address plus the current credential, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    server_url: String,
    token: Option<String>,
    user: Option<SessionUser>,
}

impl Session {
    /// An anonymous session against `server_url`.
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into().trim_end_matches('/').to_string(),
            token: None,
            user: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut session = Self::new(config.base_url());
        session.token = config.session_token.clone();
        session.user = match (&config.username, &config.email) {
            (Some(username), Some(email)) => Some(SessionUser {
                username: username.clone(),
                email: email.clone(),
            }),
            _ => None,
        };
        session
    }

    /// Copy the credential back into `config` for persisting.
    pub fn store_in(&self, config: &mut Config) {
        config.session_token = self.token.clone();
        config.username = self.user.as_ref().map(|u| u.username.clone());
        config.email = self.user.as_ref().map(|u| u.email.clone());
    }

    pub fn sign_in(&mut self, token: impl Into<String>, user: SessionUser) {
        self.token = Some(token.into());
        self.user = Some(user);
    }

    /// The bearer token, or [`ApiError::Auth`] when signed out.
    pub fn bearer(&self) -> Result<&str, ApiError> {
        self.token.as_deref().ok_or(ApiError::Auth)
    }

    /// Drop the credential after the server rejected it.
    pub fn expire(&mut self) {
        if self.token.take().is_some() {
            log::info!("session expired");
        }
        self.user = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }
}
