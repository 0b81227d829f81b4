//! Property tests for link signing, verification and flattening.
//!
//! These tests exercise the public API end to end with generated
//! identifiers, timestamps and nested response values.

use certificate_links::{
    flatten, FieldValue, Mapping, QueryParameters, Record, Scalar, Secret, SignerConfig,
    UrlSigner, VerificationError, NO_SECRET_MARKER, SIGNATURE,
};
use proptest::prelude::*;
use time::OffsetDateTime;

fn signer() -> UrlSigner {
    UrlSigner::new(SignerConfig::new(Secret::from_text("property-key")).unwrap()).unwrap()
}

fn at(unix: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(unix).unwrap()
}

// Strategy: non-empty identifiers, including characters that need escaping
fn arb_identifier() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex("[A-Za-z0-9_-]{1,16}").unwrap(),
        prop::string::string_regex("[a-z0-9 &=%+/?#]{1,12}").unwrap(),
        "\\PC{1,8}",
    ]
}

// Strategy: issue times between 1970 and 2100
fn arb_now() -> impl Strategy<Value = i64> {
    0_i64..4_102_444_800
}

// Strategy: scalar leaves
fn arb_scalar() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        Just(FieldValue::NULL),
        any::<bool>().prop_map(FieldValue::from),
        any::<i64>().prop_map(FieldValue::from),
        "[a-z0-9 ]{0,8}".prop_map(FieldValue::from),
    ]
}

// Strategy: nested sequences, mappings and records
fn arb_field_value() -> impl Strategy<Value = FieldValue> {
    arb_scalar().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(FieldValue::Sequence),
            prop::collection::vec(("[a-z]{1,6}", inner.clone()), 0..6).prop_map(|entries| {
                FieldValue::Mapping(entries.into_iter().collect::<Mapping>())
            }),
            prop::collection::vec(("[a-z]{1,6}", inner), 0..6)
                .prop_map(|entries| FieldValue::Record(entries.into_iter().collect::<Record>())),
        ]
    })
}

fn contains_record(value: &FieldValue) -> bool {
    match value {
        FieldValue::Record(_) => true,
        FieldValue::Scalar(_) => false,
        FieldValue::Sequence(items) => items.iter().any(contains_record),
        FieldValue::Mapping(map) => map.values().any(contains_record),
    }
}

fn flip_signature_bit(params: &mut QueryParameters, bit: usize) {
    let mut bytes = hex::decode(&params[SIGNATURE]).unwrap();
    bytes[bit / 8] ^= 1 << (bit % 8);
    params.insert(SIGNATURE.to_string(), hex::encode(bytes));
}

proptest! {
    /// Property: a freshly signed link verifies at issue time
    #[test]
    fn proptest_signed_link_verifies(
        certificate_id in arb_identifier(),
        customer_id in arb_identifier(),
        now in arb_now()
    ) {
        let signer = signer();
        let params = signer.sign(&certificate_id, &customer_id, at(now)).unwrap();

        prop_assert_eq!(params.expires(), now + 86_400);
        prop_assert_eq!(signer.verify(&params.to_query_parameters(), at(now)), Ok(()));
        prop_assert_eq!(
            signer.verify(&params.to_query_parameters(), at(params.expires())),
            Ok(())
        );
    }

    /// Property: one second past `expires` a link is expired
    #[test]
    fn proptest_link_expires_after_window(
        certificate_id in arb_identifier(),
        customer_id in arb_identifier(),
        now in arb_now()
    ) {
        let signer = signer();
        let params = signer.sign(&certificate_id, &customer_id, at(now)).unwrap();
        let expires = params.expires();

        prop_assert_eq!(
            signer.verify(&params.to_query_parameters(), at(expires + 1)),
            Err(VerificationError::Expired { expires, now: expires + 1 })
        );
    }

    /// Property: flipping any single signature bit is detected
    #[test]
    fn proptest_single_bit_flip_is_signature_mismatch(
        certificate_id in arb_identifier(),
        customer_id in arb_identifier(),
        now in arb_now(),
        bit in 0_usize..256
    ) {
        let signer = signer();
        let mut params = signer
            .sign(&certificate_id, &customer_id, at(now))
            .unwrap()
            .to_query_parameters();

        flip_signature_bit(&mut params, bit);

        prop_assert_eq!(
            signer.verify(&params, at(now)),
            Err(VerificationError::SignatureMismatch)
        );
    }

    /// Property: the suppression marker never changes the verification outcome
    #[test]
    fn proptest_marker_does_not_affect_verification(
        certificate_id in arb_identifier(),
        customer_id in arb_identifier(),
        now in arb_now(),
        offset in -10_i64..200_000,
        tamper in prop::option::of(0_usize..256),
        marker in "[a-z0-9]{0,4}"
    ) {
        let signer = signer();
        let mut without = signer
            .sign(&certificate_id, &customer_id, at(now))
            .unwrap()
            .to_query_parameters();
        if let Some(bit) = tamper {
            flip_signature_bit(&mut without, bit);
        }
        let mut with = without.clone();
        with.insert(NO_SECRET_MARKER.to_string(), marker);

        let check_at = at(now + offset);
        prop_assert_eq!(signer.verify(&with, check_at), signer.verify(&without, check_at));
    }

    /// Property: flatten is idempotent and removes every record
    #[test]
    fn proptest_flatten_is_idempotent(value in arb_field_value()) {
        let once = flatten(value);
        let twice = flatten(once.clone());

        prop_assert!(!contains_record(&once));
        prop_assert_eq!(twice, once);
    }

    /// Property: flatten leaves scalars unchanged
    #[test]
    fn proptest_flatten_keeps_scalars(value in arb_scalar()) {
        prop_assert_eq!(flatten(value.clone()), value);
    }
}

#[test]
fn flatten_keeps_empty_mapping_empty() {
    let flat = flatten(FieldValue::Mapping(Mapping::new()));

    assert_eq!(flat, FieldValue::Mapping(Mapping::new()));
    assert_eq!(flatten(FieldValue::Scalar(Scalar::Null)), FieldValue::NULL);
}
