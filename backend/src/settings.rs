//! Marketplace configuration loaded via OrthoConfig.
//!
//! Values come from `MARKETPLACE_*` environment variables (and any config
//! file OrthoConfig discovers). Orchestrators never read these directly;
//! the builders below turn them into explicit config structs.

use std::fmt;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::domain::{
    CourseAuthoringConfig, CourseDeletionConfig, EnrollmentConfig, PaymentSecretError,
    PaymentSignatureVerifier,
};

const DEFAULT_CURRENCY: &str = "INR";
const DEFAULT_MEDIA_FOLDER: &str = "course-media";
const DEFAULT_FAN_OUT: usize = 4;
const MAX_FAN_OUT: usize = 64;
const DEFAULT_GATEWAY_BASE_URL: &str = "https://api.razorpay.com/";
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 10;

/// Errors raised while turning settings into runtime collaborators.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// A required value is absent.
    #[error("missing required setting {0}")]
    Missing(&'static str),
    /// The signing secret was rejected.
    #[error("invalid payment secret: {0}")]
    Secret(#[from] PaymentSecretError),
    /// The currency is not a three-letter ISO code.
    #[error("currency must be a three-letter ISO 4217 code, got {0:?}")]
    Currency(String),
}

/// Configuration values for the marketplace workflows.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MARKETPLACE")]
pub struct MarketplaceSettings {
    /// Gateway key id used for order creation.
    pub payment_key_id: Option<String>,
    /// Shared gateway secret; signs confirmations and authenticates orders.
    pub payment_key_secret: Option<String>,
    /// ISO currency code for orders.
    pub currency: Option<String>,
    /// Media store folder for uploads.
    pub media_folder: Option<String>,
    /// Concurrent per-course or per-section work limit.
    pub fan_out: Option<usize>,
    /// Gateway API base URL.
    pub gateway_base_url: Option<String>,
    /// Gateway request timeout in seconds.
    pub gateway_timeout_secs: Option<u64>,
}

impl fmt::Debug for MarketplaceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarketplaceSettings")
            .field("payment_key_id", &self.payment_key_id)
            .field(
                "payment_key_secret",
                &self.payment_key_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("currency", &self.currency)
            .field("media_folder", &self.media_folder)
            .field("fan_out", &self.fan_out)
            .field("gateway_base_url", &self.gateway_base_url)
            .field("gateway_timeout_secs", &self.gateway_timeout_secs)
            .finish()
    }
}

impl MarketplaceSettings {
    /// Upper-cased currency code, falling back to `INR`.
    pub fn currency(&self) -> Result<String, SettingsError> {
        let raw = self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY).trim();
        if raw.len() == 3 && raw.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(raw.to_ascii_uppercase())
        } else {
            Err(SettingsError::Currency(raw.to_owned()))
        }
    }

    /// Upload folder, falling back to `course-media`.
    pub fn media_folder(&self) -> &str {
        self.media_folder
            .as_deref()
            .map(str::trim)
            .filter(|folder| !folder.is_empty())
            .unwrap_or(DEFAULT_MEDIA_FOLDER)
    }

    /// Fan-out limit clamped to `1..=64`.
    pub fn fan_out(&self) -> usize {
        self.fan_out
            .unwrap_or(DEFAULT_FAN_OUT)
            .clamp(1, MAX_FAN_OUT)
    }

    /// Gateway base URL, falling back to the public API host.
    pub fn gateway_base_url(&self) -> &str {
        self.gateway_base_url
            .as_deref()
            .unwrap_or(DEFAULT_GATEWAY_BASE_URL)
    }

    /// Gateway request timeout.
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(
            self.gateway_timeout_secs
                .unwrap_or(DEFAULT_GATEWAY_TIMEOUT_SECS)
                .max(1),
        )
    }

    /// Gateway key id, required for order creation.
    pub fn payment_key_id(&self) -> Result<&str, SettingsError> {
        self.payment_key_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(SettingsError::Missing("payment_key_id"))
    }

    /// Shared secret wrapped so it is wiped on drop.
    pub fn payment_key_secret(&self) -> Result<Zeroizing<String>, SettingsError> {
        self.payment_key_secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .map(|secret| Zeroizing::new(secret.to_owned()))
            .ok_or(SettingsError::Missing("payment_key_secret"))
    }

    /// Signature verifier keyed with the shared secret.
    pub fn signature_verifier(&self) -> Result<PaymentSignatureVerifier, SettingsError> {
        let secret = self.payment_key_secret()?;
        Ok(PaymentSignatureVerifier::new(secret.as_bytes())?)
    }

    /// Enrollment orchestrator configuration.
    pub fn enrollment_config(&self) -> Result<EnrollmentConfig, SettingsError> {
        Ok(EnrollmentConfig {
            currency: self.currency()?,
            fan_out: self.fan_out(),
        })
    }

    /// Course authoring service configuration.
    pub fn authoring_config(&self) -> CourseAuthoringConfig {
        CourseAuthoringConfig {
            media_folder: self.media_folder().to_owned(),
        }
    }

    /// Course deletion orchestrator configuration.
    pub fn deletion_config(&self) -> CourseDeletionConfig {
        CourseDeletionConfig {
            fan_out: self.fan_out(),
        }
    }
}
