//! Attaches signed certificate download links to customer data responses.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::audit::{AuditEvent, AuditEventKind, AuditOutcome, CertificateAudit};
use crate::certificate::{Certificate, CertificateService};
use crate::clock::Clock;
use crate::error::AugmentError;
use crate::signer::UrlSigner;
use crate::url_builder::UrlBuilder;
use crate::value::{flatten, FieldValue};

/// Key under which each augmented entry receives its certificates.
pub const CERTIFICATES: &str = "certificates";

/// Keyed result set produced by the host data pipeline.
///
/// Keys are opaque record indexes; each value is usually a mapping that may
/// carry `customer.entity_id`. Insertion order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseEnvelope {
    entries: IndexMap<String, FieldValue>,
}

impl ResponseEnvelope {
    /// Creates an empty envelope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry at `index`.
    pub fn insert(&mut self, index: impl Into<String>, entry: impl Into<FieldValue>) {
        self.entries.insert(index.into(), entry.into());
    }

    /// Returns the entry at `index`.
    pub fn get(&self, index: &str) -> Option<&FieldValue> {
        self.entries.get(index)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the envelope has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for ResponseEnvelope
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Reads `customer.entity_id` from an entry; null, empty or non-identifier
/// values count as absent.
fn customer_id(entry: &FieldValue) -> Option<String> {
    entry
        .get("customer")?
        .get("entity_id")?
        .as_scalar()?
        .as_identifier()
        .filter(|id| !id.is_empty())
}

/// Decorates customer data responses with certificate lists.
///
/// Each certificate gains a signed, expiring `certificate_url`. All
/// collaborators are injected; the augmenter holds no mutable state and can
/// be shared across requests. Link issuance is audited through `tracing`;
/// use [`with_audit`](Self::with_audit) to route events elsewhere.
pub struct ResponseAugmenter {
    signer: Arc<UrlSigner>,
    certificates: Arc<dyn CertificateService>,
    url_builder: Arc<dyn UrlBuilder>,
    clock: Arc<dyn Clock>,
}

impl ResponseAugmenter {
    /// Creates an augmenter from its collaborators.
    pub fn new(
        signer: Arc<UrlSigner>,
        certificates: Arc<dyn CertificateService>,
        url_builder: Arc<dyn UrlBuilder>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            signer,
            certificates,
            url_builder,
            clock,
        }
    }

    /// Returns a request-scoped view that emits issuance events through
    /// `audit`.
    pub fn with_audit<'a>(&'a self, audit: CertificateAudit<'a>) -> AuditedAugmenter<'a> {
        AuditedAugmenter {
            augmenter: self,
            audit,
        }
    }

    /// Builds the signed download URL for one certificate, valid for the
    /// signer's expiration window from now.
    pub fn get_certificate_url(
        &self,
        certificate_id: &str,
        customer_id: &str,
    ) -> Result<Url, AugmentError> {
        self.with_audit(CertificateAudit::new())
            .get_certificate_url(certificate_id, customer_id)
    }

    /// Lists a customer's certificates, each with its `certificate_url` set.
    ///
    /// See [`AuditedAugmenter::get_certificates`].
    pub fn get_certificates(
        &self,
        customer_id: Option<&str>,
    ) -> Result<Vec<Certificate>, AugmentError> {
        self.with_audit(CertificateAudit::new())
            .get_certificates(customer_id)
    }

    /// Adds a flattened `certificates` list to every entry that carries a
    /// `customer.entity_id`.
    ///
    /// See [`AuditedAugmenter::augment`].
    pub fn augment(&self, envelope: ResponseEnvelope) -> Result<ResponseEnvelope, AugmentError> {
        self.with_audit(CertificateAudit::new()).augment(envelope)
    }
}

impl fmt::Debug for ResponseAugmenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseAugmenter")
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

/// [`ResponseAugmenter`] bound to an audit emitter for one request.
#[derive(Debug, Clone, Copy)]
pub struct AuditedAugmenter<'a> {
    augmenter: &'a ResponseAugmenter,
    audit: CertificateAudit<'a>,
}

impl AuditedAugmenter<'_> {
    /// Builds the signed download URL for one certificate and emits a
    /// [`AuditEventKind::LinkIssued`] event.
    ///
    /// # Errors
    ///
    /// Returns [`AugmentError::Sign`] if the link cannot be signed or
    /// rendered.
    pub fn get_certificate_url(
        &self,
        certificate_id: &str,
        customer_id: &str,
    ) -> Result<Url, AugmentError> {
        let signer = &self.augmenter.signer;
        let now = self.augmenter.clock.now();

        match signer.build_download_url(
            certificate_id,
            customer_id,
            self.augmenter.url_builder.as_ref(),
            now,
        ) {
            Ok(url) => {
                let mut event = AuditEvent::new(AuditEventKind::LinkIssued, AuditOutcome::Success)
                    .with_certificate_id(certificate_id)
                    .with_customer_id(customer_id);
                if let Some(expires) = now.checked_add(signer.config().expiration_window()) {
                    event = event.with_expires(expires.unix_timestamp());
                }
                self.audit.emit(event);

                Ok(url)
            }
            Err(err) => {
                self.audit.emit(
                    AuditEvent::new(AuditEventKind::LinkIssued, AuditOutcome::Denied)
                        .with_certificate_id(certificate_id)
                        .with_customer_id(customer_id)
                        .with_reason(err.to_string()),
                );

                Err(err.into())
            }
        }
    }

    /// Lists a customer's certificates, each with its `certificate_url` set.
    ///
    /// `None` or an empty id yields an empty list without contacting the
    /// certificate service. Certificates without a usable `id` are passed
    /// through without a `certificate_url`.
    ///
    /// # Errors
    ///
    /// - [`AugmentError::Connection`] if the certificate service fails
    /// - [`AugmentError::Sign`] if a URL cannot be signed or rendered
    pub fn get_certificates(
        &self,
        customer_id: Option<&str>,
    ) -> Result<Vec<Certificate>, AugmentError> {
        let Some(customer_id) = customer_id.filter(|id| !id.is_empty()) else {
            return Ok(Vec::new());
        };

        let mut certificates = self
            .augmenter
            .certificates
            .get_certificates_list(customer_id)?;

        for certificate in &mut certificates {
            let Some(certificate_id) = certificate.id().filter(|id| !id.is_empty()) else {
                tracing::warn!(
                    customer_id = %customer_id,
                    "certificate without id, no download link issued"
                );
                continue;
            };
            let url = self.get_certificate_url(&certificate_id, customer_id)?;
            certificate.set_certificate_url(url.as_str());
        }

        tracing::debug!(
            customer_id = %customer_id,
            count = certificates.len(),
            "loaded customer certificates"
        );

        Ok(certificates)
    }

    /// Adds a flattened `certificates` list to every entry that carries a
    /// non-empty `customer.entity_id`.
    ///
    /// Entries without one are returned untouched, as are existing fields
    /// and their order. The first failure aborts the whole envelope.
    pub fn augment(&self, mut envelope: ResponseEnvelope) -> Result<ResponseEnvelope, AugmentError> {
        if envelope.is_empty() {
            return Ok(envelope);
        }

        for (index, entry) in envelope.entries.iter_mut() {
            let Some(customer_id) = customer_id(entry) else {
                continue;
            };
            let Some(fields) = entry.as_mapping_mut() else {
                continue;
            };

            let certificates = self
                .get_certificates(Some(&customer_id))
                .inspect_err(|err| {
                    tracing::warn!(
                        index = %index,
                        customer_id = %customer_id,
                        error = %err,
                        "certificate augmentation failed"
                    );
                })?;

            let flattened = certificates
                .into_iter()
                .map(|certificate| flatten(certificate.into()))
                .collect();
            fields.insert(CERTIFICATES.to_string(), FieldValue::Sequence(flattened));
        }

        Ok(envelope)
    }
}

/// A step of the host data pipeline that yields a response envelope.
pub trait DataProvider {
    /// Error raised by the provider.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Produces the response envelope.
    fn get_data(&self) -> Result<ResponseEnvelope, Self::Error>;
}

/// [`DataProvider`] decorator that runs [`ResponseAugmenter::augment`] on
/// the wrapped provider's output.
#[derive(Debug)]
pub struct CertificateDataProvider<P> {
    inner: P,
    augmenter: Arc<ResponseAugmenter>,
}

impl<P: DataProvider> CertificateDataProvider<P> {
    /// Wraps `inner`.
    pub fn new(inner: P, augmenter: Arc<ResponseAugmenter>) -> Self {
        Self { inner, augmenter }
    }

    /// Returns the wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: DataProvider> DataProvider for CertificateDataProvider<P> {
    type Error = AugmentError;

    fn get_data(&self) -> Result<ResponseEnvelope, AugmentError> {
        let envelope = self
            .inner
            .get_data()
            .map_err(|err| AugmentError::DataProvider(Box::new(err)))?;

        self.augmenter.augment(envelope)
    }
}
