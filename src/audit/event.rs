//! Audit event schema and types.

use std::fmt;

/// Kind of audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEventKind {
    /// A signed download link was issued
    LinkIssued,
    /// A received download link was checked
    DownloadAuthorization,
}

impl fmt::Display for AuditEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditEventKind::LinkIssued => write!(f, "link_issued"),
            AuditEventKind::DownloadAuthorization => write!(f, "download_authorization"),
        }
    }
}

/// Outcome of an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    /// Action succeeded
    Success,
    /// Action was refused
    Denied,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOutcome::Success => write!(f, "success"),
            AuditOutcome::Denied => write!(f, "denied"),
        }
    }
}

/// A structured audit event containing only non-sensitive metadata.
///
/// # Example
///
/// ```
/// use certificate_links::audit::{AuditEvent, AuditEventKind, AuditOutcome};
///
/// let event = AuditEvent::new(AuditEventKind::LinkIssued, AuditOutcome::Success)
///     .with_certificate_id("42")
///     .with_customer_id("C1")
///     .with_expires(1_700_086_400);
///
/// assert_eq!(event.certificate_id(), Some("42"));
/// assert_eq!(event.expires(), Some(1_700_086_400));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    kind: AuditEventKind,
    outcome: AuditOutcome,
    /// As received; may be attacker-controlled on denied authorizations
    certificate_id: Option<String>,
    customer_id: Option<String>,
    /// Unix seconds
    expires: Option<i64>,
    /// Why the action was denied
    reason: Option<String>,
}

impl AuditEvent {
    /// Creates a new audit event with required fields.
    pub fn new(kind: AuditEventKind, outcome: AuditOutcome) -> Self {
        Self {
            kind,
            outcome,
            certificate_id: None,
            customer_id: None,
            expires: None,
            reason: None,
        }
    }

    /// Sets the certificate identifier.
    pub fn with_certificate_id(mut self, certificate_id: impl Into<String>) -> Self {
        self.certificate_id = Some(certificate_id.into());
        self
    }

    /// Sets the customer identifier.
    pub fn with_customer_id(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Sets the link expiry.
    pub fn with_expires(mut self, expires: i64) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Sets the denial reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Returns the event kind.
    pub fn kind(&self) -> AuditEventKind {
        self.kind
    }

    /// Returns the outcome.
    pub fn outcome(&self) -> AuditOutcome {
        self.outcome
    }

    /// Returns the certificate identifier, if set.
    pub fn certificate_id(&self) -> Option<&str> {
        self.certificate_id.as_deref()
    }

    /// Returns the customer identifier, if set.
    pub fn customer_id(&self) -> Option<&str> {
        self.customer_id.as_deref()
    }

    /// Returns the link expiry, if set.
    pub fn expires(&self) -> Option<i64> {
        self.expires
    }

    /// Returns the denial reason, if set.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuditEvent[kind={}, outcome={}", self.kind, self.outcome)?;

        if let Some(certificate_id) = &self.certificate_id {
            write!(f, ", certificate_id={}", certificate_id)?;
        }
        if let Some(customer_id) = &self.customer_id {
            write!(f, ", customer_id={}", customer_id)?;
        }
        if let Some(expires) = self.expires {
            write!(f, ", expires={}", expires)?;
        }
        if let Some(reason) = &self.reason {
            write!(f, ", reason={}", reason)?;
        }

        write!(f, "]")
    }
}
