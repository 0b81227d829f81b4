//! In-memory audit trail recorder.

use super::{AuditEvent, AuditEventKind, AuditOutcome};
use std::cell::RefCell;

/// In-memory recorder for audit events.
///
/// Scoped to a single request; events are kept in the order recorded.
///
/// # Example
///
/// ```
/// use certificate_links::audit::{AuditTrail, AuditEvent, AuditEventKind, AuditOutcome};
///
/// let trail = AuditTrail::new();
/// trail.record(AuditEvent::new(AuditEventKind::LinkIssued, AuditOutcome::Success));
///
/// assert_eq!(trail.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct AuditTrail {
    events: RefCell<Vec<AuditEvent>>,
}

impl AuditTrail {
    /// Creates a new empty audit trail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an audit event.
    pub fn record(&self, event: AuditEvent) {
        self.events.borrow_mut().push(event);
    }

    /// Returns a snapshot of all recorded events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.borrow().clone()
    }

    /// Counts recorded events of one kind and outcome.
    pub fn count(&self, kind: AuditEventKind, outcome: AuditOutcome) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|event| event.kind() == kind && event.outcome() == outcome)
            .count()
    }

    /// Returns the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Returns true if no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Clears all recorded events.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}
