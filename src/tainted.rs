use std::fmt;

/// A wrapper for untrusted data received by the download endpoint.
///
/// Query parameters arrive from whoever holds a link, so they are wrapped in
/// `Tainted` at the boundary and can only be unwrapped inside this crate, by
/// [`DownloadGuard`](crate::DownloadGuard) while it verifies the signature.
///
/// # Examples
///
/// ```
/// use certificate_links::Tainted;
///
/// let received = Tainted::new("certificate_id=42".to_string());
///
/// // Debug output shows it's tainted
/// assert!(format!("{:?}", received).starts_with("Tainted"));
///
/// // But the value cannot be used directly:
/// // let raw: String = received.into_inner(); // not visible outside the crate
/// ```
#[derive(Clone)]
pub struct Tainted<T> {
    // Must stay private: external code goes through DownloadGuard.
    inner: T,
}

impl<T> Tainted<T> {
    /// Wraps an untrusted value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Extracts the value for verification.
    ///
    /// Only verification code may call this; widening its visibility lets
    /// unverified parameters reach the file streamer.
    pub(crate) fn into_inner(self) -> T {
        self.inner
    }

    /// Borrows the value for redacted diagnostics.
    pub(crate) fn peek(&self) -> &T {
        &self.inner
    }
}

// Do NOT add Deref, AsRef, Borrow, From<T>, Into<T> or other implicit
// conversions: they would let unverified parameters bypass the guard.

impl<T: fmt::Debug> fmt::Debug for Tainted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tainted")
            .field("inner", &self.inner)
            .finish()
    }
}
