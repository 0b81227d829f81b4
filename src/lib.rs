//! Signed, expiring download links for tax-exemption certificates.
//!
//! This crate provides:
//! - **Link signing**: [`UrlSigner`] issues HMAC-signed, time-boxed
//!   certificate download URLs and verifies them on the way back
//! - **Response augmentation**: [`ResponseAugmenter`] attaches each
//!   customer's certificates, with their download links, to a customer data
//!   response
//! - **Download verification**: [`DownloadGuard`] turns received query
//!   parameters ([`Tainted`]) into a [`Verified`] download grant
//!
//! # Core Types
//!
//! - [`SignerConfig`]: signing secret, expiration window and download route
//! - [`UrlSigner`]: `sign`, `build_download_url`, `verify`
//! - [`ResponseAugmenter`]: `get_certificate_url`, `get_certificates`, `augment`
//! - [`FieldValue`] and [`flatten`]: response values and record flattening
//! - [`CertificateService`], [`UrlBuilder`], [`Clock`]: external collaborators
//!
//! # Examples
//!
//! ```
//! use certificate_links::{RouteUrlBuilder, Secret, SignerConfig, UrlSigner};
//! use time::OffsetDateTime;
//! use url::Url;
//!
//! let config = SignerConfig::new(Secret::from_text("signing-key")).unwrap();
//! let signer = UrlSigner::new(config).unwrap();
//! let builder = RouteUrlBuilder::new(Url::parse("https://shop.example/admin/").unwrap()).unwrap();
//! let now = OffsetDateTime::now_utc();
//!
//! let url = signer.build_download_url("42", "C1", &builder, now).unwrap();
//! assert!(url.as_str().contains("certificate_id=42&customer_id=C1&expires="));
//!
//! let received = url.query_pairs().into_owned().collect();
//! assert!(signer.verify(&received, now).is_ok());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
mod augmenter;
mod certificate;
mod clock;
mod config;
mod download;
mod error;
mod secret;
mod signer;
mod tainted;
mod url_builder;
mod value;
mod verified;
mod widget;

pub use augmenter::{
    AuditedAugmenter, CertificateDataProvider, DataProvider, ResponseAugmenter, ResponseEnvelope,
    CERTIFICATES,
};
pub use certificate::{Certificate, CertificateService, CERTIFICATE_URL};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{
    SignerConfig, DEFAULT_DOWNLOAD_ROUTE, DEFAULT_EXPIRATION_SECS, ENV_PREFIX, MAX_EXPIRATION_SECS,
};
pub use download::{DownloadGrant, DownloadGuard, DownloadRequest};
pub use error::{
    AugmentError, ConfigError, ConnectionError, SignError, UrlBuildError, VerificationError,
};
pub use secret::Secret;
pub use signer::{
    canonical_encoding, QueryParameters, SignedUrlParameters, UrlSigner, CERTIFICATE_ID,
    CUSTOMER_ID, EXPIRES, NO_SECRET_MARKER, SIGNATURE,
};
pub use tainted::Tainted;
pub use url_builder::{RouteUrlBuilder, UrlBuilder};
pub use value::{flatten, FieldValue, Mapping, Record, Scalar};
pub use verified::Verified;
pub use widget::{CertificatesGridField, DEFAULT_TEMPLATE};

/// Mock collaborators for downstream tests.
#[cfg(feature = "mock")]
pub mod mock {
    pub use crate::certificate::MockCertificateService;
    pub use crate::clock::MockClock;
    pub use crate::url_builder::MockUrlBuilder;
}
