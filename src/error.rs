use thiserror::Error;

/// Errors raised while issuing a signed download URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignError {
    /// A certificate or customer identifier was empty.
    #[error("identifier `{field}` must not be empty")]
    EmptyIdentifier {
        /// Name of the offending field
        field: &'static str,
    },
    /// The signing key was rejected by the MAC implementation.
    #[error("signing key rejected: {0}")]
    InvalidKey(String),
    /// `now` plus the expiration window is not a representable date.
    #[error("link expiry out of range")]
    ExpiryOutOfRange,
    /// The signed URL could not be rendered.
    #[error(transparent)]
    UrlBuild(#[from] UrlBuildError),
}

/// Reasons a received set of download parameters fails verification.
///
/// These are raised on the serving side, before any certificate file is
/// streamed. Messages never include the received or expected signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// The recomputed signature differs from the supplied one.
    #[error("signature mismatch")]
    SignatureMismatch,
    /// The link was used after its expiry timestamp.
    #[error("link expired at {expires} (now {now})")]
    Expired {
        /// Expiry timestamp carried by the link (unix seconds)
        expires: i64,
        /// Verification time (unix seconds)
        now: i64,
    },
    /// A required field is missing or not in canonical form.
    #[error("malformed parameters: {0}")]
    MalformedParameters(String),
}

/// The external certificate service could not be reached or errored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("certificate service unavailable: {message}")]
pub struct ConnectionError {
    message: String,
}

impl ConnectionError {
    /// Creates a new connection error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors from the URL building collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlBuildError {
    /// The route path could not be joined onto the base URL.
    #[error("invalid route `{route}`: {source}")]
    InvalidRoute {
        /// Route path that failed to resolve
        route: String,
        /// Underlying parse error
        #[source]
        source: url::ParseError,
    },
    /// The base URL cannot carry a path (e.g. `mailto:`).
    #[error("base URL `{0}` cannot be a base")]
    CannotBeABase(String),
}

/// Errors raised while loading [`SignerConfig`](crate::SignerConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration sources could not be read or merged.
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
    /// The signing secret is empty.
    #[error("signing secret must not be empty")]
    EmptySecret,
    /// The expiration window is not positive or exceeds
    /// [`MAX_EXPIRATION_SECS`](crate::MAX_EXPIRATION_SECS).
    #[error("expiration window must be between 1 and {max} seconds, got {0}", max = crate::MAX_EXPIRATION_SECS)]
    InvalidExpirationWindow(i64),
    /// The download route is empty.
    #[error("download route must not be empty")]
    EmptyRoute,
    /// The download route could resolve outside the base URL.
    #[error("download route `{0}` must be a relative path")]
    InvalidRoute(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Load(Box::new(err))
    }
}

/// Errors surfaced by the response augmentation step.
///
/// Any failure aborts augmentation of the whole response; no partial
/// result is produced.
#[derive(Debug, Error)]
pub enum AugmentError {
    /// The certificate service failed.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    /// A download URL could not be signed.
    #[error(transparent)]
    Sign(#[from] SignError),
    /// The wrapped data provider failed before augmentation ran.
    #[error("data provider failed: {0}")]
    DataProvider(#[source] Box<dyn std::error::Error + Send + Sync>),
}
