//! Driven port for creating orders with the payment gateway.
//!
//! Only order creation crosses this boundary. Confirmations come back
//! out-of-band and are verified locally against the shared secret.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::define_port_error;

/// Order creation request sent to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    /// Amount to charge in minor currency units.
    pub amount_minor_units: u64,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Caller-chosen receipt token, unique per request.
    pub receipt: String,
}

/// Order description returned to the client to complete payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrder {
    /// Gateway order id, echoed back in the confirmation.
    pub id: String,
    /// Amount in minor currency units.
    pub amount_minor_units: u64,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Receipt token from the request.
    pub receipt: String,
    /// Gateway order status (for example `created`).
    pub status: String,
}

define_port_error! {
    /// Errors surfaced while calling the payment gateway.
    pub enum PaymentGatewayError {
        /// Network transport failed before receiving a response.
        Transport { message: String } =>
            "payment gateway transport failed: {message}",
        /// The gateway refused the order.
        Rejected { message: String } =>
            "payment gateway rejected order: {message}",
        /// The gateway response could not be decoded.
        Decode { message: String } =>
            "payment gateway response decode failed: {message}",
    }
}

/// Port for creating payment orders.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an order for the requested amount.
    async fn create_order(&self, request: &OrderRequest) -> Result<PaymentOrder, PaymentGatewayError>;
}

/// Fixture gateway that accepts every order and echoes the request.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePaymentGateway;

#[async_trait]
impl PaymentGateway for FixturePaymentGateway {
    async fn create_order(&self, request: &OrderRequest) -> Result<PaymentOrder, PaymentGatewayError> {
        Ok(PaymentOrder {
            id: format!("order_{}", request.receipt),
            amount_minor_units: request.amount_minor_units,
            currency: request.currency.clone(),
            receipt: request.receipt.clone(),
            status: "created".to_owned(),
        })
    }
}
