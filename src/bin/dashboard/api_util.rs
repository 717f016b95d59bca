use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::{error::Error, fmt::Display};
use tracing::warn;

#[derive(Debug)]
pub enum ApiError {
    Core(aernhome::Error),
}

impl From<aernhome::Error> for ApiError {
    fn from(value: aernhome::Error) -> Self {
        Self::Core(value)
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Core(e) => e.fmt(f),
        }
    }
}

impl Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(error = %self, "request failed");
        match self {
            Self::Core(aernhome::Error::StoreClosed) => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            Self::Core(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        }
        .into_response()
    }
}
