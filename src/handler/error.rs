//! Dispatcher error taxonomy
//!
//! Every failure while handling a request ends up here and is turned into a
//! `{"error": ...}` response with the matching status code.

use hyper::header::{self, HeaderValue};
use hyper::StatusCode;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::http::{self, response::ALLOWED_METHODS, HttpResponse};
use crate::logger;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Required request fields missing or empty
    #[error("{0}")]
    Validation(&'static str),

    #[error("malformed request body: {0}")]
    MalformedRequest(String),

    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("request body too large (max {limit} bytes)")]
    PayloadTooLarge { limit: u64 },
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Catalog(CatalogError::Validation(_))
            | Self::Validation(_)
            | Self::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            Self::Catalog(CatalogError::Conflict { .. }) => StatusCode::CONFLICT,
            Self::Catalog(CatalogError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Catalog(CatalogError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    /// Message sent to the client. Storage details stay in the error log.
    pub fn client_message(&self) -> String {
        match self {
            Self::Catalog(CatalogError::Conflict { .. }) => {
                "Duplicate product (same name and price)".to_string()
            }
            Self::Catalog(CatalogError::NotFound { .. }) => "Product not found".to_string(),
            Self::Catalog(CatalogError::Storage(_)) => "Internal server error".to_string(),
            Self::MalformedRequest(_) => "Invalid JSON".to_string(),
            Self::MethodNotAllowed(_) => "Method not allowed".to_string(),
            other => capitalize(&other.to_string()),
        }
    }

    pub fn into_response(self) -> HttpResponse {
        let status = self.status();
        match &self {
            Self::Catalog(CatalogError::Storage(_)) => logger::log_error(&self.to_string()),
            Self::MalformedRequest(_) | Self::MethodNotAllowed(_) | Self::PayloadTooLarge { .. } => {
                logger::log_warning(&self.to_string());
            }
            _ => logger::log_debug(&format!("{status}: {self}")),
        }

        let mut response = http::build_error_response(status, &self.client_message());
        if matches!(self, Self::MethodNotAllowed(_)) {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
        }
        response
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}
