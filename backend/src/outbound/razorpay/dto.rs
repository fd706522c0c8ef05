//! Wire shapes for the Razorpay Orders API.

use serde::{Deserialize, Serialize};

use crate::domain::ports::{OrderRequest, PaymentOrder};

#[derive(Debug, Serialize)]
pub(super) struct CreateOrderDto<'a> {
    pub(super) amount: u64,
    pub(super) currency: &'a str,
    pub(super) receipt: &'a str,
}

impl<'a> From<&'a OrderRequest> for CreateOrderDto<'a> {
    fn from(request: &'a OrderRequest) -> Self {
        Self {
            amount: request.amount_minor_units,
            currency: &request.currency,
            receipt: &request.receipt,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct OrderDto {
    pub(super) id: String,
    pub(super) amount: u64,
    pub(super) currency: String,
    #[serde(default)]
    pub(super) receipt: Option<String>,
    pub(super) status: String,
}

impl OrderDto {
    /// The gateway may omit the receipt; fall back to the one we sent.
    pub(super) fn into_domain(self, sent_receipt: &str) -> PaymentOrder {
        PaymentOrder {
            id: self.id,
            amount_minor_units: self.amount,
            currency: self.currency,
            receipt: self.receipt.unwrap_or_else(|| sent_receipt.to_owned()),
            status: self.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelopeDto {
    pub(super) error: ErrorBodyDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBodyDto {
    #[serde(default)]
    pub(super) code: Option<String>,
    #[serde(default)]
    pub(super) description: Option<String>,
}
