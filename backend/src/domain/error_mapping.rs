//! Translate port errors into domain errors.
//!
//! Raw adapter messages can carry connection strings, query text or vendor
//! payloads. They are logged here in full and replaced with a short,
//! caller-safe message naming the operation that failed.

use tracing::{error, warn};

use super::Error;
use super::ports::{MediaStoreError, NotifierError, PaymentGatewayError, ResourceStoreError};

pub(crate) fn map_store_error(operation: &'static str, source: ResourceStoreError) -> Error {
    match source {
        ResourceStoreError::Connection { message } => {
            error!(operation, %message, "resource store unavailable");
            Error::service_unavailable(format!("{operation} failed: store unavailable"))
        }
        ResourceStoreError::Query { message } => {
            error!(operation, %message, "resource store query failed");
            Error::internal(format!("{operation} failed"))
        }
    }
}

pub(crate) fn map_media_error(operation: &'static str, source: MediaStoreError) -> Error {
    warn!(operation, error = %source, "media store call failed");
    match source {
        MediaStoreError::NotFound { url } => Error::not_found(format!("media object {url} not found")),
        MediaStoreError::Transport { .. } | MediaStoreError::Rejected { .. } => {
            Error::external_service(format!("{operation} failed: media store error"))
        }
    }
}

pub(crate) fn map_gateway_error(source: PaymentGatewayError) -> Error {
    error!(error = %source, "payment gateway call failed");
    Error::external_service("could not initiate order")
}

pub(crate) fn map_notifier_error(source: NotifierError) -> Error {
    warn!(error = %source, "mail transport call failed");
    Error::external_service("could not send email")
}
