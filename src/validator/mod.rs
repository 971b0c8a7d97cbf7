//! Checksum validator
//!
//! Classifies a decoded string as one of the supported symbologies and
//! verifies its check digit where the symbology defines one. Formats are
//! tried most specific first:
//! - 13 digits: EAN-13 (checksum)
//! - 12 digits: UPC-A (checksum)
//! - 8-14 digits: generic numeric (length only)
//! - 8-24 of `[A-Za-z0-9-./+]`: alphanumeric (charset and length only)
//!
//! Everything here is pure. [`TrustPolicy`] narrows which of those
//! symbologies a caller is willing to accept.

/// EAN-13 / UPC-A check digit arithmetic
pub mod checksum;

use crate::models::{BarcodeSymbology, RejectReason, ValidationOutcome};
use checksum::{digit_values, ean13_matches, upca_matches};
use rayon::prelude::*;

/// Shortest payload worth classifying
pub const MIN_PAYLOAD_LEN: usize = 8;

const NUMERIC_LEN: std::ops::RangeInclusive<usize> = 8..=14;
const ALPHANUMERIC_LEN: std::ops::RangeInclusive<usize> = 8..=24;

/// Validate one decoded payload
///
/// # Example
/// ```
/// use barcode_gate::{BarcodeSymbology, RejectReason, ValidationOutcome, validate};
///
/// assert_eq!(validate("4006381333931").symbology(), Some(BarcodeSymbology::Ean13));
/// assert_eq!(validate("1234").reason(), Some(RejectReason::TooShort));
/// ```
pub fn validate(raw: &str) -> ValidationOutcome {
    if raw.chars().count() < MIN_PAYLOAD_LEN {
        return ValidationOutcome::rejected(RejectReason::TooShort);
    }

    let bytes = raw.as_bytes();

    if let Some(digits) = digit_values::<13>(bytes) {
        return if ean13_matches(&digits) {
            ValidationOutcome::accepted(raw, BarcodeSymbology::Ean13)
        } else {
            ValidationOutcome::rejected(RejectReason::ChecksumMismatch)
        };
    }

    if let Some(digits) = digit_values::<12>(bytes) {
        return if upca_matches(&digits) {
            ValidationOutcome::accepted(raw, BarcodeSymbology::UpcA)
        } else {
            ValidationOutcome::rejected(RejectReason::ChecksumMismatch)
        };
    }

    if NUMERIC_LEN.contains(&bytes.len()) && bytes.iter().all(u8::is_ascii_digit) {
        return ValidationOutcome::accepted(raw, BarcodeSymbology::GenericNumeric);
    }

    if ALPHANUMERIC_LEN.contains(&bytes.len()) && bytes.iter().all(|&b| is_alphanumeric_code_byte(b)) {
        return ValidationOutcome::accepted(raw, BarcodeSymbology::AlphanumericCode);
    }

    ValidationOutcome::rejected(RejectReason::UnrecognizedFormat)
}

/// Which symbologies count as acceptable
///
/// The numeric and alphanumeric families carry no checksum, so a corrupted
/// read of one of them cannot be told apart from a good one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrustPolicy {
    /// Accept every recognised symbology
    #[default]
    Permissive,
    /// Accept only checksum-bearing symbologies (EAN-13, UPC-A)
    Checksummed,
}

impl TrustPolicy {
    /// Whether `symbology` passes this policy
    pub fn allows(&self, symbology: BarcodeSymbology) -> bool {
        match self {
            TrustPolicy::Permissive => true,
            TrustPolicy::Checksummed => symbology.has_checksum(),
        }
    }
}

impl std::str::FromStr for TrustPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(TrustPolicy::Permissive),
            "checksummed" | "checksum" => Ok(TrustPolicy::Checksummed),
            other => Err(format!("unknown trust policy '{}'", other)),
        }
    }
}

/// Validate under a trust policy
///
/// Symbologies the policy excludes are reported as `UnrecognizedFormat`.
pub fn validate_with(raw: &str, policy: TrustPolicy) -> ValidationOutcome {
    match validate(raw) {
        ValidationOutcome::Accepted { symbology, .. } if !policy.allows(symbology) => {
            ValidationOutcome::rejected(RejectReason::UnrecognizedFormat)
        }
        outcome => outcome,
    }
}

fn is_alphanumeric_code_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'/' | b'+')
}

/// Validate many payloads in parallel, preserving input order
pub fn validate_batch<S>(raws: &[S]) -> Vec<ValidationOutcome>
where
    S: AsRef<str> + Sync,
{
    validate_batch_with(raws, TrustPolicy::Permissive)
}

/// Parallel [`validate_with`], preserving input order
pub fn validate_batch_with<S>(raws: &[S], policy: TrustPolicy) -> Vec<ValidationOutcome>
where
    S: AsRef<str> + Sync,
{
    raws.par_iter().map(|raw| validate_with(raw.as_ref(), policy)).collect()
}
