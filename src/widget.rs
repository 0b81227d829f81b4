//! Admin form field that lists a customer's certificates.

use serde::{Deserialize, Serialize};

/// Template rendered by the certificates grid.
pub const DEFAULT_TEMPLATE: &str = "certificates/view/certificates-grid";

/// Display defaults for the certificates grid form field.
///
/// Display only: the admin UI reads these values and renders the
/// `certificates` list attached by the
/// [`ResponseAugmenter`](crate::ResponseAugmenter).
///
/// ```
/// use certificate_links::CertificatesGridField;
///
/// let json = serde_json::to_value(CertificatesGridField::default()).unwrap();
/// assert_eq!(json["shouldShowWarning"], false);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificatesGridField {
    /// Template reference
    pub template: String,
    /// Whether the field shows its warning banner
    pub should_show_warning: bool,
}

impl Default for CertificatesGridField {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            should_show_warning: false,
        }
    }
}
