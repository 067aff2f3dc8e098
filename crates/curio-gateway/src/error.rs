//! Error mapping between HTTP and the checkout's `GatewayError`.

use curio_commerce::checkout::GatewayError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

/// The adapter could not be constructed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid gateway base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("API key contains characters not allowed in a header")]
    InvalidApiKey,

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Object { message: String },
    Text(String),
}

/// Error bodies come as `{"error": {"message": ..}}`, `{"error": ".."}`
/// or `{"message": ..}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<ErrorDetail>,
    #[serde(default)]
    message: Option<String>,
}

fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let message = match parsed.error {
        Some(ErrorDetail::Object { message }) | Some(ErrorDetail::Text(message)) => Some(message),
        None => parsed.message,
    }?;
    let message = message.trim();
    (!message.is_empty()).then(|| message.to_string())
}

/// Map a non-success response.
///
/// A 4xx with a message is the gateway refusing the request; its message
/// goes to the shopper as-is. Anything else keeps only a parsed message,
/// never a raw body.
pub(crate) fn from_status(status: u16, body: &str) -> GatewayError {
    match (status, error_message(body)) {
        (400..=499, Some(message)) => GatewayError::Rejected { message },
        (408 | 504, None) => GatewayError::Timeout,
        (status, message) => GatewayError::Http {
            status,
            message: message.unwrap_or_default(),
        },
    }
}

pub(crate) fn from_transport(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else if e.is_decode() {
        GatewayError::InvalidResponse(e.to_string())
    } else {
        GatewayError::Network(e.to_string())
    }
}

pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, GatewayError> {
    serde_json::from_str(body).map_err(|e| GatewayError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use curio_commerce::checkout::{Receipt, RemoteOrder};

    #[test]
    fn test_nested_error_message_is_rejection() {
        let err = from_status(402, r#"{"error":{"message":"Your card was declined.","code":"card_declined"}}"#);
        assert_eq!(err, GatewayError::rejected("Your card was declined."));
    }

    #[test]
    fn test_flat_message_is_rejection() {
        let err = from_status(422, r#"{"message":"customerEmail is invalid"}"#);
        assert_eq!(err.user_message(), "customerEmail is invalid");

        let err = from_status(400, r#"{"error":"lineItems must not be empty"}"#);
        assert_eq!(err.user_message(), "lineItems must not be empty");
    }

    #[test]
    fn test_server_error_keeps_status() {
        let err = from_status(503, "<html>Service Unavailable</html>");
        assert_eq!(
            err,
            GatewayError::Http {
                status: 503,
                message: String::new()
            }
        );
        assert_eq!(err.user_message(), "Payment gateway error (HTTP 503)");
    }

    #[test]
    fn test_client_error_without_message() {
        assert!(matches!(from_status(404, ""), GatewayError::Http { status: 404, .. }));
        assert_eq!(from_status(504, ""), GatewayError::Timeout);
    }

    #[test]
    fn test_decode_success_bodies() {
        let order: RemoteOrder = decode(r#"{"orderId":"ord_42"}"#).unwrap();
        assert_eq!(order.order_id.as_str(), "ord_42");

        let receipt: Receipt = decode(r#"{"id":"rc_1","createdAt":"2026-10-01T08:30:00Z"}"#).unwrap();
        assert_eq!(receipt.id.as_str(), "rc_1");

        let bad: Result<RemoteOrder, _> = decode(r#"{"id":"ord_42"}"#);
        assert!(matches!(bad, Err(GatewayError::InvalidResponse(_))));
    }
}
