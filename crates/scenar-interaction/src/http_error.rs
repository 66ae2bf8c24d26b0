//! HTTP failure mapping shared by the REST oracles.

use reqwest::{StatusCode, header::HeaderValue};
use scenar_core::OracleError;
use serde::Deserialize;
use std::time::Duration;

/// Both vendors wrap errors as `{"error": {"message": ...}}`.
#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

pub(crate) fn map_http_error(
    status: StatusCode,
    body: &str,
    retry_after: Option<Duration>,
) -> OracleError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    if status == StatusCode::TOO_MANY_REQUESTS {
        OracleError::Quota {
            message,
            retry_after,
        }
    } else if status.is_server_error() {
        OracleError::Unavailable {
            message: format!("HTTP {}: {message}", status.as_u16()),
            retryable: true,
        }
    } else {
        OracleError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

pub(crate) fn map_transport_error(backend: &str, err: reqwest::Error) -> OracleError {
    OracleError::Unavailable {
        message: format!("{backend} request failed: {err}"),
        retryable: err.is_connect() || err.is_timeout() || err.is_request(),
    }
}

pub(crate) fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    // HTTP-date values are not interpreted.
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
