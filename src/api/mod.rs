//! HTTP client for the notes service.
//!
//! Every request goes through [`ApiClient::execute`], which attaches the
//! session token and turns a 401 into a process-wide session invalidation.

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

mod auth;
mod error;
mod notes;
mod session;

#[cfg(test)]
pub(crate) mod stub;

pub use error::{ApiError, FieldErrors};
pub use notes::NoteGateway;
pub use session::{Session, TokenStore, TOKEN_LIFETIME_DAYS};

const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<Session>,
}

impl ApiClient {
    /// Create a client for the API rooted at `base_url` (e.g. `http://host/api`).
    pub fn new(base_url: &str, session: Arc<Session>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Start a request with the auth header attached when a token is present.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self
            .client
            .request(method, self.url(path))
            .header("Accept", "application/json");

        if let Some(token) = self.session.token() {
            req = req.header("Authorization", format!("Token {}", token));
        }
        req
    }

    /// Send a request and map non-success statuses onto [`ApiError`].
    fn execute(&self, req: RequestBuilder, entity: &'static str) -> Result<Response, ApiError> {
        let response = req.send().map_err(|e| {
            tracing::warn!(error = %e, "request failed");
            ApiError::from(e)
        })?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), url = %response.url(), "response");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        let err = ApiError::from_status(status, body, entity);
        if matches!(err, ApiError::Auth) {
            self.session.invalidate();
        }
        Err(err)
    }

    fn execute_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        entity: &'static str,
    ) -> Result<T, ApiError> {
        let response = self.execute(req, entity)?;
        response.json::<T>().map_err(|e| {
            tracing::warn!(error = %e, entity, "could not decode response");
            ApiError::Transport(format!("invalid {} response: {}", entity, e))
        })
    }
}
