//! HTTP adapter for the payment gateway.

use async_trait::async_trait;
use curio_commerce::checkout::{
    CapturePaymentRequest, CreateOrderRequest, GatewayError, PaymentGateway, Receipt, RemoteOrder,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Url};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{endpoint, GatewayConfig};
use crate::error::{decode, from_status, from_transport, ConfigError};

const USER_AGENT: &str = concat!("curio-gateway/", env!("CARGO_PKG_VERSION"));

/// Payment gateway reached over JSON/HTTP.
///
/// - `POST {base}/orders` creates an order
/// - `POST {base}/orders/{id}/payments` captures payment for it
///
/// Requests are sent once. A timed-out capture may still have gone
/// through, so retrying is left to the shopper.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        let base_url = config.parsed_base_url()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(api_key) = &config.api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
                .map_err(|_| ConfigError::InvalidApiKey)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .connect_timeout(config.connect)
            .timeout(config.total)
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn post<B, T>(&self, url: Url, body: &B) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(url = %url, "Gateway request");

        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(from_transport)?;

        let status = response.status();
        let text = response.text().await.map_err(from_transport)?;

        if !status.is_success() {
            let err = from_status(status.as_u16(), &text);
            warn!(url = %url, status = status.as_u16(), error = %err, "Gateway request failed");
            return Err(err);
        }

        debug!(url = %url, status = status.as_u16(), "Gateway response");
        decode(&text)
    }
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<RemoteOrder, GatewayError> {
        let url = endpoint(&self.base_url, &["orders"]);
        self.post(url, request).await
    }

    async fn capture_payment(
        &self,
        request: &CapturePaymentRequest,
    ) -> Result<Receipt, GatewayError> {
        let url = endpoint(
            &self.base_url,
            &["orders", request.order_id.as_str(), "payments"],
        );
        self.post(url, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_header_breaking_key() {
        let config = GatewayConfig::new("https://pay.example.com").with_api_key("abc\ndef");
        assert!(matches!(HttpGateway::new(config), Err(ConfigError::InvalidApiKey)));
    }

    #[test]
    fn test_keeps_base_url() {
        let gateway = HttpGateway::new(GatewayConfig::new("https://pay.example.com/v1/")).unwrap();
        assert_eq!(gateway.base_url().as_str(), "https://pay.example.com/v1/");
    }

    #[test]
    fn test_config_debug_hides_key() {
        let config = GatewayConfig::new("https://pay.example.com").with_api_key("sk_live_secret");
        assert!(!format!("{:?}", config).contains("sk_live_secret"));
    }
}
