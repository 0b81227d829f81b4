//! Audit events for certificate download links.
//!
//! This module provides:
//! - `AuditEvent`: structured event for link issuance and download authorization
//! - `AuditTrail`: in-memory event recorder
//! - `CertificateAudit`: emitter that logs events through `tracing`
//!
//! Events only ever carry identifiers, expiry timestamps and a rejection
//! reason. Signatures and signing keys are never recorded.

mod emitter;
mod event;
mod trail;

pub use emitter::{CertificateAudit, AUDIT_TARGET};
pub use event::{AuditEvent, AuditEventKind, AuditOutcome};
pub use trail::AuditTrail;
