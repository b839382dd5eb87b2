use reqwest::StatusCode;
use std::collections::BTreeMap;

use crate::validation::ValidationError;

/// Per-field messages from a rejected request body (HTTP 400).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(pub BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Parse the service's `{"field": ["message", ...]}` error body.
    /// Non-list values are kept as a single message.
    pub fn parse(body: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        let object = value.as_object()?;

        let mut fields = BTreeMap::new();
        for (field, messages) in object {
            let list = match messages {
                serde_json::Value::Array(items) => items
                    .iter()
                    .map(|m| m.as_str().map(str::to_string).unwrap_or_else(|| m.to_string()))
                    .collect(),
                serde_json::Value::String(s) => vec![s.clone()],
                other => vec![other.to_string()],
            };
            fields.insert(field.clone(), list);
        }
        if fields.is_empty() {
            None
        } else {
            Some(Self(fields))
        }
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn summary(&self) -> String {
        self.0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not signed in or session expired")]
    Auth,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Request rejected: {}", .0.summary())]
    Rejected(FieldErrors),

    #[error("Server error {status}: {body}")]
    Server { status: u16, body: String },

    #[error("Network error: {0}")]
    Transport(String),

    /// The local session file could not be written.
    #[error("Could not store session: {0}")]
    Storage(String),
}

impl ApiError {
    /// Map a non-success response onto the taxonomy.
    pub fn from_status(status: StatusCode, body: String, entity: &'static str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Auth,
            StatusCode::NOT_FOUND => ApiError::NotFound(entity),
            StatusCode::CONFLICT => ApiError::Conflict(body),
            StatusCode::BAD_REQUEST => match FieldErrors::parse(&body) {
                Some(fields) => ApiError::Rejected(fields),
                None => ApiError::Server {
                    status: status.as_u16(),
                    body,
                },
            },
            _ => ApiError::Server {
                status: status.as_u16(),
                body,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}
