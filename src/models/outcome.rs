use super::BarcodeSymbology;
use serde::Serialize;
use std::fmt;

/// Why a decoded payload was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RejectReason {
    /// Fewer than 8 characters
    TooShort,
    /// EAN-13 or UPC-A shape with a wrong check digit
    ChecksumMismatch,
    /// Matches none of the known symbologies
    UnrecognizedFormat,
    /// Same payload as the last accepted candidate
    DuplicateOfLast,
}

impl RejectReason {
    /// All reasons, most fundamental first
    pub const ALL: [RejectReason; 4] = [
        RejectReason::TooShort,
        RejectReason::ChecksumMismatch,
        RejectReason::UnrecognizedFormat,
        RejectReason::DuplicateOfLast,
    ];

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            RejectReason::TooShort => "payload too short",
            RejectReason::ChecksumMismatch => "check digit mismatch",
            RejectReason::UnrecognizedFormat => "unrecognized barcode format",
            RejectReason::DuplicateOfLast => "duplicate of the last accepted code",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Result of validating one decoded payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ValidationOutcome {
    /// Payload is well-formed for the given symbology
    Accepted {
        /// The payload as decoded
        payload: String,
        /// Inferred symbology
        symbology: BarcodeSymbology,
    },
    /// Payload failed validation
    Rejected {
        /// Why it failed
        reason: RejectReason,
    },
}

impl ValidationOutcome {
    pub(crate) fn accepted(payload: &str, symbology: BarcodeSymbology) -> Self {
        ValidationOutcome::Accepted {
            payload: payload.to_string(),
            symbology,
        }
    }

    pub(crate) fn rejected(reason: RejectReason) -> Self {
        ValidationOutcome::Rejected { reason }
    }

    /// True for `Accepted`
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted { .. })
    }

    /// Accepted payload, if any
    pub fn payload(&self) -> Option<&str> {
        match self {
            ValidationOutcome::Accepted { payload, .. } => Some(payload),
            ValidationOutcome::Rejected { .. } => None,
        }
    }

    /// Accepted symbology, if any
    pub fn symbology(&self) -> Option<BarcodeSymbology> {
        match self {
            ValidationOutcome::Accepted { symbology, .. } => Some(*symbology),
            ValidationOutcome::Rejected { .. } => None,
        }
    }

    /// Rejection reason, if any
    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            ValidationOutcome::Accepted { .. } => None,
            ValidationOutcome::Rejected { reason } => Some(*reason),
        }
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationOutcome::Accepted { payload, symbology } => {
                write!(f, "accepted {} ({})", payload, symbology)
            }
            ValidationOutcome::Rejected { reason } => write!(f, "rejected: {}", reason),
        }
    }
}
