//! Exemption certificates and the service that lists them.

use crate::error::ConnectionError;
use crate::value::{FieldValue, Record, Scalar};

/// Field set on each certificate with its signed download URL.
pub const CERTIFICATE_URL: &str = "certificate_url";

/// An exemption certificate as returned by the certificate service.
///
/// Apart from `id`, its properties are owned by the service and passed
/// through untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Certificate {
    record: Record,
}

impl Certificate {
    /// Wraps a record received from the service.
    pub fn new(record: Record) -> Self {
        Self { record }
    }

    /// Returns the certificate identifier, if it has a usable one.
    pub fn id(&self) -> Option<String> {
        self.record
            .get("id")
            .and_then(FieldValue::as_scalar)
            .and_then(|id| id.as_identifier())
    }

    /// Returns the download URL set by [`set_certificate_url`](Self::set_certificate_url).
    pub fn certificate_url(&self) -> Option<&str> {
        match self.record.get(CERTIFICATE_URL) {
            Some(FieldValue::Scalar(Scalar::String(url))) => Some(url),
            _ => None,
        }
    }

    /// Attaches the signed download URL.
    pub fn set_certificate_url(&mut self, url: impl Into<String>) {
        let url: String = url.into();
        self.record.set(CERTIFICATE_URL, url);
    }

    /// Returns the underlying record.
    pub fn record(&self) -> &Record {
        &self.record
    }
}

impl From<Record> for Certificate {
    fn from(record: Record) -> Self {
        Self::new(record)
    }
}

impl From<Certificate> for FieldValue {
    fn from(certificate: Certificate) -> Self {
        FieldValue::Record(certificate.record)
    }
}

/// External service listing a customer's exemption certificates.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait CertificateService: Send + Sync {
    /// Lists the certificates on file for `customer_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] if the service cannot be reached.
    fn get_certificates_list(&self, customer_id: &str) -> Result<Vec<Certificate>, ConnectionError>;
}
