//! Reqwest-backed Razorpay order adapter.
//!
//! Owns transport details only: basic-auth credentials, JSON encoding,
//! timeout and HTTP error mapping.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use zeroize::Zeroizing;

use super::dto::{CreateOrderDto, ErrorEnvelopeDto, OrderDto};
use crate::domain::ports::{OrderRequest, PaymentGateway, PaymentGatewayError, PaymentOrder};

const ORDERS_PATH: &str = "v1/orders";

/// Errors raised while building a [`RazorpayHttpGateway`].
#[derive(Debug, thiserror::Error)]
pub enum RazorpayConfigError {
    /// The base URL could not be combined with the orders path.
    #[error("invalid gateway base url {base}: {message}")]
    Endpoint { base: String, message: String },
    /// Credentials were blank.
    #[error("gateway key id and secret must not be empty")]
    MissingCredentials,
    /// The HTTP client could not be constructed.
    #[error("gateway http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Razorpay adapter posting to `{base}/v1/orders`.
pub struct RazorpayHttpGateway {
    client: Client,
    endpoint: Url,
    key_id: String,
    key_secret: Zeroizing<String>,
}

impl RazorpayHttpGateway {
    /// Build an adapter with an explicit request timeout.
    /// ```rust,ignore
    /// let gateway = RazorpayHttpGateway::new(base, key_id, secret, timeout)?;
    /// ```
    /// # Errors
    ///
    /// Fails on blank credentials, an unusable base URL or when the reqwest
    /// client cannot be constructed.
    pub fn new(
        base_url: &str,
        key_id: impl Into<String>,
        key_secret: Zeroizing<String>,
        timeout: Duration,
    ) -> Result<Self, RazorpayConfigError> {
        let key_id = key_id.into();
        if key_id.trim().is_empty() || key_secret.trim().is_empty() {
            return Err(RazorpayConfigError::MissingCredentials);
        }
        let endpoint = orders_endpoint(base_url)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            key_id,
            key_secret,
        })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayHttpGateway {
    async fn create_order(
        &self,
        request: &OrderRequest,
    ) -> Result<PaymentOrder, PaymentGatewayError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .basic_auth(&self.key_id, Some(self.key_secret.as_str()))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&CreateOrderDto::from(request))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        let order: OrderDto = serde_json::from_slice(body.as_ref()).map_err(|error| {
            PaymentGatewayError::decode(format!("invalid order payload: {error}"))
        })?;
        Ok(order.into_domain(&request.receipt))
    }
}

fn orders_endpoint(base_url: &str) -> Result<Url, RazorpayConfigError> {
    let normalised = if base_url.ends_with('/') {
        base_url.to_owned()
    } else {
        format!("{base_url}/")
    };
    Url::parse(&normalised)
        .and_then(|base| base.join(ORDERS_PATH))
        .map_err(|error| RazorpayConfigError::Endpoint {
            base: base_url.to_owned(),
            message: error.to_string(),
        })
}

fn map_transport_error(error: reqwest::Error) -> PaymentGatewayError {
    PaymentGatewayError::transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> PaymentGatewayError {
    let detail = serde_json::from_slice::<ErrorEnvelopeDto>(body)
        .ok()
        .and_then(|envelope| {
            let code = envelope.error.code.unwrap_or_default();
            let description = envelope.error.description.unwrap_or_default();
            match (code.is_empty(), description.is_empty()) {
                (true, true) => None,
                (false, true) => Some(code),
                (true, false) => Some(description),
                (false, false) => Some(format!("{code}: {description}")),
            }
        })
        .unwrap_or_else(|| body_preview(body));

    let message = if detail.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), detail)
    };

    if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
        PaymentGatewayError::rejected(message)
    } else {
        PaymentGatewayError::transport(message)
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
