/// Proof that a value passed signature and expiry verification.
///
/// `Verified<T>` is returned by [`DownloadGuard::authorize`](crate::DownloadGuard::authorize)
/// and is what a download handler should require before streaming any
/// certificate file.
///
/// # Construction Invariants
///
/// There are no public constructors and no `From<T>` implementation, so a
/// `Verified<T>` always comes out of the verification path.
///
/// ```compile_fail
/// use certificate_links::Verified;
///
/// // No public constructor:
/// let verified = Verified::new("42".to_string());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified<T> {
    inner: T,
}

impl<T> Verified<T> {
    /// Wraps a value without checking it.
    ///
    /// Callers must have verified the value first.
    pub(crate) fn new_unchecked(value: T) -> Self {
        Self { inner: value }
    }

    /// Consumes the `Verified<T>` and returns the inner value.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> AsRef<T> for Verified<T> {
    fn as_ref(&self) -> &T {
        &self.inner
    }
}
