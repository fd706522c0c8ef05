//! Payment confirmation checks and order helpers.
//!
//! The gateway proves a payment happened by signing `"{order_id}|{payment_id}"`
//! with HMAC-SHA256 under a secret shared only with this service. That
//! signature is the single trust gate before enrollment writes begin.

use std::fmt;

use hmac::{Hmac, Mac};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::Error;

type HmacSha256 = Hmac<Sha256>;

const RECEIPT_PREFIX: &str = "rcpt_";
const RECEIPT_TOKEN_LEN: usize = 20;

/// Confirmation tuple delivered by the gateway callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    /// Gateway order id returned by `capture_payment`.
    pub order_id: String,
    /// Gateway payment id.
    pub payment_id: String,
    /// Lowercase hex HMAC-SHA256 signature.
    pub signature: String,
}

impl PaymentConfirmation {
    /// Reject confirmations with blank fields.
    pub fn validate(&self) -> Result<(), Error> {
        let missing: Vec<&str> = [
            ("orderId", &self.order_id),
            ("paymentId", &self.payment_id),
            ("signature", &self.signature),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::invalid_request(format!(
                "payment confirmation is missing {}",
                missing.join(", ")
            )))
        }
    }
}

/// Validation errors for [`PaymentSignatureVerifier::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentSecretError {
    /// The secret has no bytes.
    Empty,
}

impl fmt::Display for PaymentSecretError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "payment signing secret must not be empty"),
        }
    }
}

impl std::error::Error for PaymentSecretError {}

/// Recomputes and checks gateway confirmation signatures.
///
/// The MAC is keyed once at construction; the raw secret is not retained.
///
/// # Examples
/// ```
/// use course_backend::domain::{PaymentConfirmation, PaymentSignatureVerifier};
///
/// let verifier = PaymentSignatureVerifier::new(b"shh").expect("non-empty secret");
/// let signature = verifier.expected_signature("order_1", "pay_1");
/// let confirmation = PaymentConfirmation {
///     order_id: "order_1".into(),
///     payment_id: "pay_1".into(),
///     signature,
/// };
/// assert!(verifier.verify(&confirmation));
/// ```
#[derive(Clone)]
pub struct PaymentSignatureVerifier {
    keyed: HmacSha256,
}

impl PaymentSignatureVerifier {
    /// Key the verifier with the shared gateway secret.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, PaymentSecretError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(PaymentSecretError::Empty);
        }
        let keyed = HmacSha256::new_from_slice(secret).map_err(|_| PaymentSecretError::Empty)?;
        Ok(Self { keyed })
    }

    fn mac_for(&self, order_id: &str, payment_id: &str) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(order_id.as_bytes());
        mac.update(b"|");
        mac.update(payment_id.as_bytes());
        mac
    }

    /// Lowercase hex signature the gateway should have produced.
    pub fn expected_signature(&self, order_id: &str, payment_id: &str) -> String {
        hex::encode(self.mac_for(order_id, payment_id).finalize().into_bytes())
    }

    /// Check a confirmation in constant time.
    ///
    /// Signatures that are not valid hex, or decode to the wrong length, never
    /// verify.
    pub fn verify(&self, confirmation: &PaymentConfirmation) -> bool {
        let Ok(supplied) = hex::decode(confirmation.signature.trim()) else {
            return false;
        };
        self.mac_for(&confirmation.order_id, &confirmation.payment_id)
            .verify_slice(&supplied)
            .is_ok()
    }
}

impl fmt::Debug for PaymentSignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentSignatureVerifier")
            .field("keyed", &"<redacted>")
            .finish()
    }
}

/// Random receipt token for a gateway order.
///
/// Uniqueness is advisory; the gateway order id is the real correlation key.
pub fn generate_receipt() -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RECEIPT_TOKEN_LEN)
        .map(char::from)
        .collect();
    format!("{RECEIPT_PREFIX}{token}")
}

/// Render minor currency units as `major.minor` for receipts.
///
/// # Examples
/// ```
/// use course_backend::domain::format_minor_units;
///
/// assert_eq!(format_minor_units(49_905), "499.05");
/// ```
pub fn format_minor_units(amount_minor_units: u64) -> String {
    format!("{}.{:02}", amount_minor_units / 100, amount_minor_units % 100)
}
