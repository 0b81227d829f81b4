//! Rendering of route paths and query parameters into absolute URLs.

use url::Url;

use crate::error::UrlBuildError;

/// Builds absolute URLs for a route path plus query parameters.
///
/// Parameters are appended in the order given.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait UrlBuilder: Send + Sync {
    /// Renders `route_path` with `parameters` as its query string.
    fn build_url(
        &self,
        route_path: &str,
        parameters: &[(String, String)],
    ) -> Result<Url, UrlBuildError>;
}

/// [`UrlBuilder`] that resolves routes relative to a fixed base URL.
///
/// # Examples
///
/// ```
/// use certificate_links::{RouteUrlBuilder, UrlBuilder};
/// use url::Url;
///
/// let builder = RouteUrlBuilder::new(Url::parse("https://shop.example/admin").unwrap()).unwrap();
/// let url = builder
///     .build_url("certificates/download", &[("certificate_id".into(), "42".into())])
///     .unwrap();
///
/// assert_eq!(
///     url.as_str(),
///     "https://shop.example/admin/certificates/download?certificate_id=42"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct RouteUrlBuilder {
    base: Url,
}

impl RouteUrlBuilder {
    /// Creates a builder rooted at `base`.
    ///
    /// A trailing slash is added to the base path so routes resolve beneath
    /// it rather than replacing its last segment.
    pub fn new(mut base: Url) -> Result<Self, UrlBuildError> {
        if base.cannot_be_a_base() {
            return Err(UrlBuildError::CannotBeABase(base.to_string()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.set_query(None);
        base.set_fragment(None);

        Ok(Self { base })
    }

    /// Returns the normalised base URL.
    pub fn base(&self) -> &Url {
        &self.base
    }
}

impl UrlBuilder for RouteUrlBuilder {
    fn build_url(
        &self,
        route_path: &str,
        parameters: &[(String, String)],
    ) -> Result<Url, UrlBuildError> {
        let route = route_path.trim_start_matches('/');
        let mut url = self
            .base
            .join(route)
            .map_err(|source| UrlBuildError::InvalidRoute {
                route: route_path.to_string(),
                source,
            })?;

        if !parameters.is_empty() {
            url.query_pairs_mut().extend_pairs(parameters);
        }

        Ok(url)
    }
}
