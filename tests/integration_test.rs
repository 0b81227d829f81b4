use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use certificate_links::audit::{AuditEventKind, AuditOutcome, AuditTrail, CertificateAudit};
use certificate_links::{
    AugmentError, Certificate, CertificateService, ConnectionError, DownloadGuard,
    DownloadRequest, FieldValue, FixedClock, Record, ResponseAugmenter, ResponseEnvelope,
    RouteUrlBuilder, Secret, SignerConfig, UrlSigner, VerificationError, CERTIFICATE_URL,
};
use time::{Duration, OffsetDateTime};
use url::Url;

/// Certificate service returning a fixed list and counting calls.
struct FakeCertificateService {
    certificates: Vec<Certificate>,
    calls: AtomicUsize,
}

impl FakeCertificateService {
    fn new(certificates: Vec<Certificate>) -> Self {
        Self {
            certificates,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CertificateService for FakeCertificateService {
    fn get_certificates_list(&self, _customer_id: &str) -> Result<Vec<Certificate>, ConnectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.certificates.clone())
    }
}

struct UnreachableService;

impl CertificateService for UnreachableService {
    fn get_certificates_list(&self, _customer_id: &str) -> Result<Vec<Certificate>, ConnectionError> {
        Err(ConnectionError::new("connection refused"))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn now() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
}

fn signer() -> Arc<UrlSigner> {
    let config = SignerConfig::new(Secret::from_text("integration-key")).unwrap();
    Arc::new(UrlSigner::new(config).unwrap())
}

fn augmenter(signer: Arc<UrlSigner>, service: Arc<dyn CertificateService>) -> ResponseAugmenter {
    let builder = RouteUrlBuilder::new(Url::parse("https://shop.example/admin/").unwrap()).unwrap();
    ResponseAugmenter::new(signer, service, Arc::new(builder), Arc::new(FixedClock(now())))
}

fn certificate(id: &str) -> Certificate {
    [("id", id)].into_iter().collect::<Record>().into()
}

fn customer_entry(entity_id: &str) -> FieldValue {
    FieldValue::mapping([("customer", FieldValue::mapping([("entity_id", entity_id)]))])
}

#[test]
fn augmented_envelope_carries_signed_certificate_links() {
    init_tracing();
    let signer = signer();
    let service = Arc::new(FakeCertificateService::new(vec![certificate("42")]));
    let augmenter = augmenter(signer.clone(), service.clone());
    let envelope: ResponseEnvelope = [("0", customer_entry("C1"))].into_iter().collect();

    let augmented = augmenter.augment(envelope).unwrap();

    assert_eq!(service.calls(), 1);
    let entry = augmented.get("0").unwrap();
    let FieldValue::Sequence(certificates) = entry.get("certificates").unwrap() else {
        panic!("certificates should be a sequence");
    };
    assert_eq!(certificates.len(), 1);
    assert_eq!(certificates[0].get("id"), Some(&FieldValue::from("42")));

    let Some(FieldValue::Scalar(certificate_links::Scalar::String(link))) =
        certificates[0].get(CERTIFICATE_URL)
    else {
        panic!("certificate_url should be a string");
    };
    let expires = 1_700_000_000 + 86_400;
    let signed = signer.sign("42", "C1", now()).unwrap();
    assert_eq!(
        link,
        &format!(
            "https://shop.example/admin/certificates/download?certificate_id=42&customer_id=C1&expires={expires}&signature={}&_nosecret=1",
            signed.signature()
        )
    );

    // The customer mapping is kept as-is, ahead of the new key.
    let FieldValue::Mapping(fields) = entry else {
        panic!("entry should stay a mapping");
    };
    let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
    assert_eq!(keys, ["customer", "certificates"]);
}

#[test]
fn issued_link_is_accepted_by_download_guard_until_expiry() {
    init_tracing();
    let signer = signer();
    let service = Arc::new(FakeCertificateService::new(vec![certificate("42")]));
    let augmenter = augmenter(signer.clone(), service);

    let certificates = augmenter.get_certificates(Some("C1")).unwrap();
    let link = Url::parse(certificates[0].certificate_url().unwrap()).unwrap();

    let trail = AuditTrail::new();
    let guard = DownloadGuard::new(&signer).with_audit(CertificateAudit::recording(&trail));

    let grant = guard
        .authorize(DownloadRequest::from_url(&link), now() + Duration::hours(23))
        .unwrap();
    assert_eq!(grant.as_ref().certificate_id, "42");
    assert_eq!(grant.as_ref().customer_id, "C1");

    let err = guard
        .authorize(
            DownloadRequest::from_url(&link),
            now() + Duration::seconds(86_401),
        )
        .unwrap_err();
    assert!(matches!(err, VerificationError::Expired { .. }));

    assert_eq!(
        trail.count(AuditEventKind::DownloadAuthorization, AuditOutcome::Success),
        1
    );
    assert_eq!(
        trail.count(AuditEventKind::DownloadAuthorization, AuditOutcome::Denied),
        1
    );
}

#[test]
fn null_customer_returns_empty_list_without_service_call() {
    let service = Arc::new(FakeCertificateService::new(vec![certificate("42")]));
    let augmenter = augmenter(signer(), service.clone());

    let certificates = augmenter.get_certificates(None).unwrap();

    assert!(certificates.is_empty());
    assert_eq!(service.calls(), 0);
}

#[test]
fn entry_without_entity_id_is_returned_unchanged() {
    let service = Arc::new(FakeCertificateService::new(vec![certificate("42")]));
    let augmenter = augmenter(signer(), service.clone());
    let envelope: ResponseEnvelope = serde_json::from_value(serde_json::json!({
        "0": {"customer": {"email": "a@example.com"}},
        "1": {"customer": {"entity_id": null}},
        "2": {"address": "Main St"}
    }))
    .unwrap();

    let augmented = augmenter.augment(envelope.clone()).unwrap();

    assert_eq!(augmented, envelope);
    assert_eq!(service.calls(), 0);
}

#[test]
fn service_failure_aborts_augmentation() {
    let augmenter = augmenter(signer(), Arc::new(UnreachableService));
    let envelope: ResponseEnvelope = [
        ("0", FieldValue::mapping([("name", "no customer")])),
        ("1", customer_entry("C1")),
    ]
    .into_iter()
    .collect();

    let err = augmenter.augment(envelope).unwrap_err();

    assert!(matches!(err, AugmentError::Connection(_)));
}

#[test]
fn link_from_another_key_is_rejected() {
    let issuing = signer();
    let other = UrlSigner::new(SignerConfig::new(Secret::from_text("other-key")).unwrap()).unwrap();
    let augmenter = augmenter(
        issuing,
        Arc::new(FakeCertificateService::new(vec![certificate("42")])),
    );

    let link = augmenter.get_certificate_url("42", "C1").unwrap();
    let err = DownloadGuard::new(&other)
        .authorize(DownloadRequest::from_url(&link), now())
        .unwrap_err();

    assert_eq!(err, VerificationError::SignatureMismatch);
}

#[test]
fn empty_ids_do_not_abort_neighbouring_entries() {
    let service = Arc::new(FakeCertificateService::new(vec![
        certificate("42"),
        [("status", "pending")].into_iter().collect::<Record>().into(),
    ]));
    let augmenter = augmenter(signer(), service.clone());
    let envelope: ResponseEnvelope = [("0", customer_entry("C1")), ("1", customer_entry(""))]
        .into_iter()
        .collect();

    let augmented = augmenter.augment(envelope).unwrap();

    assert_eq!(service.calls(), 1);
    let FieldValue::Sequence(certificates) = augmented.get("0").unwrap().get("certificates").unwrap()
    else {
        panic!("certificates should be a sequence");
    };
    assert!(certificates[0].get(CERTIFICATE_URL).is_some());
    assert_eq!(certificates[1].get(CERTIFICATE_URL), None);
    assert_eq!(augmented.get("1"), Some(&customer_entry("")));
}
