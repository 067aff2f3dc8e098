//! Gateway connection settings.

use reqwest::Url;
use secrecy::SecretString;
use std::time::Duration;

use crate::error::ConfigError;

/// Where the payment gateway lives and how long to wait for it.
#[derive(Debug)]
pub struct GatewayConfig {
    /// Base URL; endpoints are appended as path segments.
    pub base_url: String,
    /// Sent as a bearer token when present.
    pub api_key: Option<SecretString>,
    /// Connection timeout.
    pub connect: Duration,
    /// Total time allowed per request, including reading the body.
    pub total: Duration,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            connect: Duration::from_secs(5),
            total: Duration::from_secs(30),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(api_key.into()));
        self
    }

    /// Set the total timeout; the connect timeout becomes a quarter of it.
    pub fn with_timeout(mut self, total: Duration) -> Self {
        self.connect = total / 4;
        self.total = total;
        self
    }

    /// Parse and check the base URL.
    pub(crate) fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(self.base_url.trim())
            .map_err(|e| ConfigError::InvalidBaseUrl(format!("{}: {}", self.base_url, e)))?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }
        Ok(url)
    }
}

/// Append path segments to `base`, percent-encoding each one.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_handles_trailing_slash() {
        let with = GatewayConfig::new("https://pay.example.com/v1/")
            .parsed_base_url()
            .unwrap();
        let without = GatewayConfig::new("https://pay.example.com/v1")
            .parsed_base_url()
            .unwrap();
        assert_eq!(endpoint(&with, &["orders"]).as_str(), "https://pay.example.com/v1/orders");
        assert_eq!(endpoint(&without, &["orders"]).as_str(), "https://pay.example.com/v1/orders");
    }

    #[test]
    fn test_order_id_is_encoded() {
        let base = GatewayConfig::new("https://pay.example.com")
            .parsed_base_url()
            .unwrap();
        let url = endpoint(&base, &["orders", "ord/1 2", "payments"]);
        assert_eq!(url.path(), "/orders/ord%2F1%202/payments");
    }

    #[test]
    fn test_rejects_non_http_base() {
        assert!(GatewayConfig::new("ftp://pay.example.com").parsed_base_url().is_err());
        assert!(GatewayConfig::new("not a url").parsed_base_url().is_err());
    }

    #[test]
    fn test_timeout_split() {
        let config = GatewayConfig::new("https://pay.example.com").with_timeout(Duration::from_secs(8));
        assert_eq!(config.connect, Duration::from_secs(2));
        assert_eq!(config.total, Duration::from_secs(8));
    }
}
