//! Emits audit events through `tracing`.

use super::{AuditEvent, AuditOutcome, AuditTrail};

/// `tracing` target used for all audit events.
pub const AUDIT_TARGET: &str = "certificate_audit";

/// Audit event emitter, optionally backed by an [`AuditTrail`].
///
/// Successful actions are logged at `info`, denials at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CertificateAudit<'a> {
    trail: Option<&'a AuditTrail>,
}

impl<'a> CertificateAudit<'a> {
    /// Creates an emitter that only logs.
    pub fn new() -> Self {
        Self { trail: None }
    }

    /// Creates an emitter that logs and records into `trail`.
    pub fn recording(trail: &'a AuditTrail) -> Self {
        Self { trail: Some(trail) }
    }

    /// Emits an audit event.
    pub fn emit(&self, event: AuditEvent) {
        match event.outcome() {
            AuditOutcome::Success => tracing::info!(
                target: AUDIT_TARGET,
                kind = %event.kind(),
                outcome = %event.outcome(),
                certificate_id = ?event.certificate_id(),
                customer_id = ?event.customer_id(),
                expires = ?event.expires(),
                "audit event"
            ),
            AuditOutcome::Denied => tracing::warn!(
                target: AUDIT_TARGET,
                kind = %event.kind(),
                outcome = %event.outcome(),
                certificate_id = ?event.certificate_id(),
                customer_id = ?event.customer_id(),
                expires = ?event.expires(),
                reason = ?event.reason(),
                "audit event"
            ),
        }

        if let Some(trail) = self.trail {
            trail.record(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditEventKind;

    #[test]
    fn emit_without_trail_does_not_panic() {
        CertificateAudit::new().emit(AuditEvent::new(
            AuditEventKind::LinkIssued,
            AuditOutcome::Success,
        ));
    }

    #[test]
    fn emit_records_into_trail() {
        let trail = AuditTrail::new();
        let audit = CertificateAudit::recording(&trail);

        audit.emit(
            AuditEvent::new(AuditEventKind::DownloadAuthorization, AuditOutcome::Denied)
                .with_reason("expired"),
        );

        assert_eq!(trail.len(), 1);
        assert_eq!(trail.events()[0].reason(), Some("expired"));
    }
}
