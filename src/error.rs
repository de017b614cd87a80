use crate::pages;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;
use thiserror::Error;

/// Which outbound call a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    TokenExchange,
    ProfileFetch,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::TokenExchange => write!(f, "token exchange"),
            Stage::ProfileFetch => write!(f, "profile fetch"),
        }
    }
}

/// Terminal failures of the redirect callback. None of them is retried.
#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("{stage} failed: identity provider unreachable: {source}")]
    UpstreamUnavailable {
        stage: Stage,
        #[source]
        source: reqwest::Error,
    },
    #[error("{stage} failed: malformed response: {detail}")]
    MalformedUpstreamResponse { stage: Stage, detail: String },
    #[error("token exchange failed: {reason}")]
    TokenExtractionFailed { reason: String },
    #[error("profile fetch failed: {reason}")]
    ProfileExtractionFailed { reason: String },
}

impl CallbackError {
    pub fn upstream(stage: Stage, source: reqwest::Error) -> Self {
        CallbackError::UpstreamUnavailable { stage, source }
    }

    pub fn malformed(stage: Stage, detail: impl Into<String>) -> Self {
        CallbackError::MalformedUpstreamResponse {
            stage,
            detail: detail.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CallbackError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CallbackError::UpstreamUnavailable { source, .. } if source.is_timeout() => {
                StatusCode::GATEWAY_TIMEOUT
            }
            CallbackError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            CallbackError::MalformedUpstreamResponse { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            CallbackError::TokenExtractionFailed { .. } => StatusCode::BAD_GATEWAY,
            CallbackError::ProfileExtractionFailed { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message shown to the browser. Internal detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            CallbackError::InvalidRequest(msg) => msg.clone(),
            CallbackError::UpstreamUnavailable { source, .. } if source.is_timeout() => {
                "The identity provider did not respond in time.".to_string()
            }
            CallbackError::UpstreamUnavailable { .. } => {
                "The identity provider could not be reached.".to_string()
            }
            CallbackError::MalformedUpstreamResponse { .. } => {
                "The identity provider returned an unreadable response.".to_string()
            }
            CallbackError::TokenExtractionFailed { .. } => "parse access token failed".to_string(),
            CallbackError::ProfileExtractionFailed { .. } => "parse user name failed".to_string(),
        }
    }
}

impl IntoResponse for CallbackError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = pages::error_page(status.as_u16(), &self.public_message());

        (status, body).into_response()
    }
}
