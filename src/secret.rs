use std::fmt;

/// A wrapper that keeps signing key material out of logs and error output.
///
/// The signer's HMAC key lives inside a `Secret` for the whole process
/// lifetime. The wrapped value can only be read through
/// [`expose_secret`](Self::expose_secret), which the signer calls right before
/// keying the MAC.
///
/// # Properties
///
/// - Does NOT implement `Deref`, `AsRef`, `Borrow`, `Clone`, or `Copy`
/// - Debug and Display output is always `[REDACTED]`
/// - No type information is leaked in formatted output
///
/// # Examples
///
/// ```
/// use certificate_links::Secret;
///
/// let key = Secret::new(b"signing-key".to_vec());
///
/// assert_eq!(format!("{:?}", key), "[REDACTED]");
/// assert_eq!(key.expose_secret().as_slice(), b"signing-key");
/// ```
// Do NOT add Clone, Copy, or Default derives: the key must have a single owner.
pub struct Secret<T> {
    // Must stay private, otherwise the redaction is trivially bypassed.
    inner: T,
}

impl<T> Secret<T> {
    /// Wraps a sensitive value in a `Secret`.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Explicitly exposes the secret value.
    ///
    /// Do not log or display the returned reference.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

impl Secret<Vec<u8>> {
    /// Wraps the UTF-8 bytes of a string key.
    pub fn from_text(key: impl Into<String>) -> Self {
        Self::new(key.into().into_bytes())
    }

    /// Returns true if the key holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
