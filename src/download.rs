//! Verifier side of the certificate download endpoint.
//!
//! The endpoint itself (routing, file streaming) lives in the host
//! application. This module covers the part that must run before any file
//! is streamed:
//!
//! 1. Build a [`DownloadRequest`] from the received URL; every query
//!    parameter is wrapped in [`Tainted`]
//! 2. Call [`DownloadGuard::authorize`], which strips the
//!    [`NO_SECRET_MARKER`], checks signature and expiry, and emits an audit
//!    event
//! 3. Stream the certificate named by the returned [`Verified<DownloadGrant>`]
//!
//! ```
//! use certificate_links::{
//!     DownloadGuard, DownloadRequest, RouteUrlBuilder, Secret, SignerConfig, UrlSigner,
//! };
//! use time::OffsetDateTime;
//! use url::Url;
//!
//! let signer = UrlSigner::new(SignerConfig::new(Secret::from_text("key")).unwrap()).unwrap();
//! let builder = RouteUrlBuilder::new(Url::parse("https://shop.example/").unwrap()).unwrap();
//! let now = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
//!
//! let link = signer.build_download_url("42", "C1", &builder, now).unwrap();
//!
//! let grant = DownloadGuard::new(&signer)
//!     .authorize(DownloadRequest::from_url(&link), now)
//!     .unwrap();
//! assert_eq!(grant.as_ref().certificate_id, "42");
//! ```

use std::collections::BTreeMap;
use std::fmt;

use time::OffsetDateTime;
use url::{form_urlencoded, Url};

use crate::audit::{AuditEvent, AuditEventKind, AuditOutcome, CertificateAudit};
use crate::error::VerificationError;
use crate::signer::{
    QueryParameters, UrlSigner, CERTIFICATE_ID, CUSTOMER_ID, NO_SECRET_MARKER, SIGNATURE,
};
use crate::{Tainted, Verified};

/// Query parameters of one download request, not yet verified.
///
/// When a parameter is repeated, the last occurrence wins. `Debug` output
/// redacts the signature.
#[derive(Clone)]
pub struct DownloadRequest {
    parameters: Tainted<QueryParameters>,
}

impl DownloadRequest {
    /// Collects the query parameters of a received URL.
    pub fn from_url(url: &Url) -> Self {
        Self::from_pairs(url.query_pairs().into_owned())
    }

    /// Parses a raw `application/x-www-form-urlencoded` query string.
    pub fn from_query(query: &str) -> Self {
        Self::from_pairs(form_urlencoded::parse(query.as_bytes()).into_owned())
    }

    /// Collects already-decoded key/value pairs, e.g. from a web framework's
    /// query extractor.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            parameters: Tainted::new(pairs.into_iter().collect()),
        }
    }
}

impl fmt::Debug for DownloadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parameters: BTreeMap<&str, &str> = self
            .parameters
            .peek()
            .iter()
            .map(|(name, value)| {
                let value: &str = if name == SIGNATURE { "[REDACTED]" } else { value };
                (name.as_str(), value)
            })
            .collect();

        f.debug_struct("DownloadRequest")
            .field("parameters", &parameters)
            .finish()
    }
}

/// What a verified link entitles its holder to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadGrant {
    /// Certificate to stream
    pub certificate_id: String,
    /// Customer owning the certificate
    pub customer_id: String,
    /// Link expiry, unix seconds
    pub expires: i64,
}

/// Gate that turns a [`DownloadRequest`] into a [`Verified<DownloadGrant>`].
#[derive(Debug, Clone, Copy)]
pub struct DownloadGuard<'a> {
    signer: &'a UrlSigner,
    audit: CertificateAudit<'a>,
}

impl<'a> DownloadGuard<'a> {
    /// Creates a guard that logs its decisions.
    pub fn new(signer: &'a UrlSigner) -> Self {
        Self {
            signer,
            audit: CertificateAudit::new(),
        }
    }

    /// Routes audit events through `audit`.
    pub fn with_audit(mut self, audit: CertificateAudit<'a>) -> Self {
        self.audit = audit;
        self
    }

    /// Verifies a download request at time `now`.
    ///
    /// The [`NO_SECRET_MARKER`] is removed before verification; no other
    /// field outside the signed set has any effect.
    ///
    /// # Errors
    ///
    /// Returns the [`VerificationError`] reported by [`UrlSigner::verify`].
    pub fn authorize(
        &self,
        request: DownloadRequest,
        now: OffsetDateTime,
    ) -> Result<Verified<DownloadGrant>, VerificationError> {
        let mut parameters = request.parameters.into_inner();
        parameters.remove(NO_SECRET_MARKER);

        match self.signer.authenticate(&parameters, now) {
            Ok((certificate_id, customer_id, expires)) => {
                let grant = DownloadGrant {
                    certificate_id: certificate_id.to_string(),
                    customer_id: customer_id.to_string(),
                    expires,
                };

                self.audit.emit(
                    AuditEvent::new(AuditEventKind::DownloadAuthorization, AuditOutcome::Success)
                        .with_certificate_id(&grant.certificate_id)
                        .with_customer_id(&grant.customer_id)
                        .with_expires(grant.expires),
                );

                Ok(Verified::new_unchecked(grant))
            }
            Err(err) => {
                let mut event =
                    AuditEvent::new(AuditEventKind::DownloadAuthorization, AuditOutcome::Denied)
                        .with_reason(err.to_string());
                if let Some(certificate_id) = parameters.get(CERTIFICATE_ID) {
                    event = event.with_certificate_id(certificate_id);
                }
                if let Some(customer_id) = parameters.get(CUSTOMER_ID) {
                    event = event.with_customer_id(customer_id);
                }
                self.audit.emit(event);

                Err(err)
            }
        }
    }
}
