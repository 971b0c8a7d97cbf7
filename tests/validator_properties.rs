use barcode_gate::validator::checksum::{ean13_check_digit, upca_check_digit};
use barcode_gate::{
    BarcodeSymbology, DedupFilter, RejectReason, TrustPolicy, ValidationOutcome, validate,
    validate_batch, validate_with,
};
use proptest::prelude::*;

fn digits(len: usize) -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(0u8..10, len)
}

fn render(digits: &[u8]) -> String {
    digits.iter().map(|d| char::from(b'0' + d)).collect()
}

proptest! {
    #[test]
    fn ean13_accepted_iff_check_digit_matches(body in digits(12), check in 0u8..10) {
        let mut all = body.clone();
        all.push(check);
        let payload = render(&all);
        let expected = ean13_check_digit(&body.clone().try_into().unwrap());

        let outcome = validate(&payload);
        if check == expected {
            prop_assert_eq!(outcome.symbology(), Some(BarcodeSymbology::Ean13));
            prop_assert_eq!(outcome.payload(), Some(payload.as_str()));
        } else {
            prop_assert_eq!(outcome.reason(), Some(RejectReason::ChecksumMismatch));
        }
    }

    #[test]
    fn upca_accepted_iff_check_digit_matches(body in digits(11), check in 0u8..10) {
        let mut all = body.clone();
        all.push(check);
        let payload = render(&all);
        let expected = upca_check_digit(&body.clone().try_into().unwrap());

        let outcome = validate(&payload);
        if check == expected {
            prop_assert_eq!(outcome.symbology(), Some(BarcodeSymbology::UpcA));
        } else {
            prop_assert_eq!(outcome.reason(), Some(RejectReason::ChecksumMismatch));
        }
    }

    #[test]
    fn short_payloads_are_too_short(payload in "\\PC{0,7}") {
        prop_assume!(payload.chars().count() < 8);
        prop_assert_eq!(validate(&payload).reason(), Some(RejectReason::TooShort));
    }

    #[test]
    fn other_digit_lengths_are_generic_numeric(len in prop_oneof![8usize..12, 14usize..15]) {
        let payload = "7".repeat(len);
        prop_assert_eq!(validate(&payload).symbology(), Some(BarcodeSymbology::GenericNumeric));
    }

    #[test]
    fn validation_is_pure(payload in "\\PC{0,30}") {
        prop_assert_eq!(validate(&payload), validate(&payload));
        prop_assert_eq!(
            validate_with(&payload, TrustPolicy::Checksummed),
            validate_with(&payload, TrustPolicy::Checksummed)
        );
    }

    #[test]
    fn checksummed_policy_only_accepts_checksummed_codes(payload in "[0-9A-Z]{8,16}") {
        if let ValidationOutcome::Accepted { symbology, .. } = validate_with(&payload, TrustPolicy::Checksummed) {
            prop_assert!(symbology.has_checksum());
        }
    }

    #[test]
    fn batch_matches_sequential(payloads in proptest::collection::vec("[0-9a-z ]{0,14}", 0..40)) {
        let sequential: Vec<ValidationOutcome> = payloads.iter().map(|p| validate(p)).collect();
        prop_assert_eq!(validate_batch(&payloads), sequential);
    }

    #[test]
    fn dedup_never_accepts_consecutive_repeats(values in proptest::collection::vec("[ab]", 1..20)) {
        let mut filter = DedupFilter::new();
        let mut previous: Option<String> = None;
        for value in &values {
            let accepted = filter.should_accept(value);
            prop_assert_eq!(accepted, previous.as_deref() != Some(value.as_str()));
            previous = Some(value.clone());
        }
    }
}

#[test]
fn reference_codes() {
    assert_eq!(validate("4006381333931").symbology(), Some(BarcodeSymbology::Ean13));
    assert_eq!(validate("036000291452").symbology(), Some(BarcodeSymbology::UpcA));
    assert_eq!(
        validate("ABC-123/45"),
        ValidationOutcome::Accepted {
            payload: "ABC-123/45".into(),
            symbology: BarcodeSymbology::AlphanumericCode,
        }
    );
    assert_eq!(validate("1234567").reason(), Some(RejectReason::TooShort));
    assert_eq!(validate("4006381333932").reason(), Some(RejectReason::ChecksumMismatch));
}
