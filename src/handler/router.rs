//! Request entry point
//!
//! Reads the request off the wire, enforces the body size limit, dispatches to
//! the catalog and decorates the response with the common headers.

use crate::config::AppState;
use crate::handler::error::ApiError;
use crate::handler::products::{self, CatalogRequest};
use crate::http::{self, HttpResponse};
use crate::logger::{self, AccessLogEntry};
use http_body_util::{BodyExt, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Method, Request};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<HttpResponse, Infallible> {
    let started = Instant::now();
    let http_config = &state.config.http;

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = format_version(req.version());
    entry.referer = header_value(&req, "referer");
    entry.user_agent = header_value(&req, "user-agent");

    let result = match read_request(req, http_config.max_body_size).await {
        Ok(request) => products::dispatch(&state.catalog, &request).await,
        Err(e) => Err(e),
    };
    let response = http::with_common_headers(
        result.unwrap_or_else(ApiError::into_response),
        http_config.enable_cors,
        &http_config.server_name,
    );

    if state.config.logging.access_log {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or_default();
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Collect what the dispatcher needs. Only POST bodies are read.
async fn read_request(
    req: Request<hyper::body::Incoming>,
    max_body_size: u64,
) -> Result<CatalogRequest, ApiError> {
    let (parts, body) = req.into_parts();

    let body = if parts.method == Method::POST {
        check_body_size(&parts.headers, max_body_size)?;
        read_body(body, max_body_size).await?
    } else {
        Bytes::new()
    };

    Ok(CatalogRequest {
        method: parts.method,
        query: parts.uri.query().map(ToString::to_string),
        body,
    })
}

/// Reject a declared `Content-Length` above the limit before reading anything
fn check_body_size(headers: &hyper::HeaderMap, max_body_size: u64) -> Result<(), ApiError> {
    let Some(content_length) = headers.get("content-length") else {
        return Ok(());
    };
    match content_length.to_str().map(str::parse::<u64>) {
        Ok(Ok(size)) if size > max_body_size => Err(ApiError::PayloadTooLarge {
            limit: max_body_size,
        }),
        Ok(Ok(_)) => Ok(()),
        _ => {
            logger::log_warning("Invalid Content-Length header, skipping size check");
            Ok(())
        }
    }
}

/// Read the full body, failing once more than `limit` bytes arrive
pub async fn read_body<B>(body: B, limit: u64) -> Result<Bytes, ApiError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let limited = Limited::new(body, usize::try_from(limit).unwrap_or(usize::MAX));
    match limited.collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<http_body_util::LengthLimitError>() => {
            Err(ApiError::PayloadTooLarge { limit })
        }
        Err(e) => Err(ApiError::MalformedRequest(format!(
            "failed to read request body: {e}"
        ))),
    }
}

fn header_value(req: &Request<hyper::body::Incoming>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn format_version(version: hyper::Version) -> String {
    match version {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string()
}
