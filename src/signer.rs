//! Signed, time-limited certificate download links.
//!
//! A link carries `certificate_id`, `customer_id`, `expires` and a
//! `signature`. The signature is an HMAC-SHA256 over the canonical encoding
//! of the first three fields only. Transport-only fields such as the
//! [`NO_SECRET_MARKER`] are appended after signing and ignored on
//! verification.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use time::OffsetDateTime;
use url::form_urlencoded;
use url::Url;

use crate::config::SignerConfig;
use crate::error::{SignError, VerificationError};
use crate::url_builder::UrlBuilder;

type HmacSha256 = Hmac<Sha256>;

/// Query parameter carrying the certificate identifier.
pub const CERTIFICATE_ID: &str = "certificate_id";
/// Query parameter carrying the customer identifier.
pub const CUSTOMER_ID: &str = "customer_id";
/// Query parameter carrying the expiry as unix seconds.
pub const EXPIRES: &str = "expires";
/// Query parameter carrying the hex-encoded signature.
pub const SIGNATURE: &str = "signature";
/// Transport marker that disables the host's secret-key URL decoration.
///
/// Never part of the signed payload.
pub const NO_SECRET_MARKER: &str = "_nosecret";

/// Received query parameters, keyed by name.
pub type QueryParameters = HashMap<String, String>;

/// The four signed fields of a download link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrlParameters {
    certificate_id: String,
    customer_id: String,
    expires: i64,
    signature: String,
}

impl SignedUrlParameters {
    /// Returns the certificate identifier.
    pub fn certificate_id(&self) -> &str {
        &self.certificate_id
    }

    /// Returns the customer identifier.
    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    /// Returns the expiry timestamp in unix seconds.
    pub fn expires(&self) -> i64 {
        self.expires
    }

    /// Returns the lower-case hex signature.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Returns the parameters as ordered query pairs.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        vec![
            (CERTIFICATE_ID.to_string(), self.certificate_id.clone()),
            (CUSTOMER_ID.to_string(), self.customer_id.clone()),
            (EXPIRES.to_string(), self.expires.to_string()),
            (SIGNATURE.to_string(), self.signature.clone()),
        ]
    }

    /// Returns the parameters as a lookup map, as a verifier would receive
    /// them.
    pub fn to_query_parameters(&self) -> QueryParameters {
        self.query_pairs().into_iter().collect()
    }
}

/// Deterministic encoding of the three signed fields.
///
/// Fields are sorted by name and form-urlencoded, so the result does not
/// depend on the order in which parameters were collected.
///
/// ```
/// use certificate_links::canonical_encoding;
///
/// assert_eq!(
///     canonical_encoding("42", "C 1", 1700000000),
///     "certificate_id=42&customer_id=C+1&expires=1700000000"
/// );
/// ```
pub fn canonical_encoding(certificate_id: &str, customer_id: &str, expires: i64) -> String {
    let fields = BTreeMap::from([
        (CERTIFICATE_ID, certificate_id.to_string()),
        (CUSTOMER_ID, customer_id.to_string()),
        (EXPIRES, expires.to_string()),
    ]);

    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish()
}

/// Issues and verifies certificate download links.
///
/// The MAC is keyed once at construction; the key itself stays inside the
/// [`SignerConfig`] and is never logged.
pub struct UrlSigner {
    config: SignerConfig,
    mac: HmacSha256,
}

impl UrlSigner {
    /// Creates a signer from an immutable configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SignError::InvalidKey`] if the MAC rejects the key.
    pub fn new(config: SignerConfig) -> Result<Self, SignError> {
        let mac = HmacSha256::new_from_slice(config.signing_secret().expose_secret())
            .map_err(|err| SignError::InvalidKey(err.to_string()))?;

        Ok(Self { config, mac })
    }

    /// Returns the signer's configuration.
    pub fn config(&self) -> &SignerConfig {
        &self.config
    }

    /// Signs a link for one certificate, valid until `now` plus the
    /// configured expiration window.
    ///
    /// # Errors
    ///
    /// Returns [`SignError::EmptyIdentifier`] if either identifier is empty,
    /// or [`SignError::ExpiryOutOfRange`] if the expiry cannot be represented.
    pub fn sign(
        &self,
        certificate_id: &str,
        customer_id: &str,
        now: OffsetDateTime,
    ) -> Result<SignedUrlParameters, SignError> {
        if certificate_id.is_empty() {
            return Err(SignError::EmptyIdentifier {
                field: CERTIFICATE_ID,
            });
        }
        if customer_id.is_empty() {
            return Err(SignError::EmptyIdentifier { field: CUSTOMER_ID });
        }

        let expires = now
            .checked_add(self.config.expiration_window())
            .ok_or(SignError::ExpiryOutOfRange)?
            .unix_timestamp();
        let signature = hex::encode(self.compute(certificate_id, customer_id, expires));

        Ok(SignedUrlParameters {
            certificate_id: certificate_id.to_string(),
            customer_id: customer_id.to_string(),
            expires,
            signature,
        })
    }

    /// Signs a link and renders it against the configured download route.
    ///
    /// The [`NO_SECRET_MARKER`] is appended after signing.
    pub fn build_download_url(
        &self,
        certificate_id: &str,
        customer_id: &str,
        url_builder: &dyn UrlBuilder,
        now: OffsetDateTime,
    ) -> Result<Url, SignError> {
        let signed = self.sign(certificate_id, customer_id, now)?;

        let mut parameters = signed.query_pairs();
        parameters.push((NO_SECRET_MARKER.to_string(), "1".to_string()));

        let url = url_builder.build_url(self.config.download_route(), &parameters)?;

        tracing::debug!(
            certificate_id = %signed.certificate_id(),
            customer_id = %signed.customer_id(),
            expires = signed.expires(),
            "issued certificate download link"
        );

        Ok(url)
    }

    /// Checks that received parameters were issued by this signer and have
    /// not expired.
    ///
    /// Only `certificate_id`, `customer_id` and `expires` are authenticated;
    /// every other field (including [`NO_SECRET_MARKER`]) is ignored.
    ///
    /// # Errors
    ///
    /// - [`VerificationError::MalformedParameters`] if a required field is
    ///   missing, empty, or `expires` is not a canonical integer
    /// - [`VerificationError::SignatureMismatch`] if the signature does not
    ///   match the canonical fields
    /// - [`VerificationError::Expired`] if `now` is past `expires`
    pub fn verify(
        &self,
        received: &QueryParameters,
        now: OffsetDateTime,
    ) -> Result<(), VerificationError> {
        self.authenticate(received, now).map(|_| ())
    }

    /// Runs [`verify`](Self::verify) and returns the authenticated
    /// `(certificate_id, customer_id, expires)`.
    pub(crate) fn authenticate<'a>(
        &self,
        received: &'a QueryParameters,
        now: OffsetDateTime,
    ) -> Result<(&'a str, &'a str, i64), VerificationError> {
        let certificate_id = required(received, CERTIFICATE_ID)?;
        let customer_id = required(received, CUSTOMER_ID)?;
        let expires = parse_expires(required(received, EXPIRES)?)?;
        let signature = required(received, SIGNATURE)?;

        let signature =
            hex::decode(signature).map_err(|_| VerificationError::SignatureMismatch)?;

        let mut mac = self.mac.clone();
        mac.update(canonical_encoding(certificate_id, customer_id, expires).as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| VerificationError::SignatureMismatch)?;

        let now = now.unix_timestamp();
        if now > expires {
            return Err(VerificationError::Expired { expires, now });
        }

        Ok((certificate_id, customer_id, expires))
    }

    fn compute(&self, certificate_id: &str, customer_id: &str, expires: i64) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(canonical_encoding(certificate_id, customer_id, expires).as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

impl fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlSigner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn required<'a>(received: &'a QueryParameters, name: &str) -> Result<&'a str, VerificationError> {
    match received.get(name) {
        Some(value) if !value.is_empty() => Ok(value),
        Some(_) => Err(VerificationError::MalformedParameters(format!(
            "`{name}` is empty"
        ))),
        None => Err(VerificationError::MalformedParameters(format!(
            "missing `{name}`"
        ))),
    }
}

fn parse_expires(raw: &str) -> Result<i64, VerificationError> {
    raw.parse::<i64>()
        .ok()
        // "+5" or "007" parse but would not survive re-encoding
        .filter(|expires| expires.to_string() == raw)
        .ok_or_else(|| {
            VerificationError::MalformedParameters(format!("`{EXPIRES}` is not an integer"))
        })
}
