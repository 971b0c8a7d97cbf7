use super::{BarcodeSymbology, RejectReason};
use crate::error::ScanError;
use serde::{Serialize, Serializer};
use std::fmt;

/// Lifecycle state of one scan session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanSessionState {
    /// Enumerating devices and starting the camera
    Initializing,
    /// Camera running, decode ticks are being processed
    Scanning,
    /// A validated payload was read
    Succeeded(String),
    /// The session ended on an environment error
    Failed(ScanError),
    /// The caller closed the session
    Cancelled,
}

impl ScanSessionState {
    /// Succeeded, Failed and Cancelled are terminal
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScanSessionState::Succeeded(_) | ScanSessionState::Failed(_) | ScanSessionState::Cancelled
        )
    }

    /// True while decode ticks are processed
    pub fn is_scanning(&self) -> bool {
        matches!(self, ScanSessionState::Scanning)
    }
}

impl fmt::Display for ScanSessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanSessionState::Initializing => f.write_str("initializing"),
            ScanSessionState::Scanning => f.write_str("scanning"),
            ScanSessionState::Succeeded(payload) => write!(f, "succeeded: {}", payload),
            ScanSessionState::Failed(err) => write!(f, "failed: {}", err),
            ScanSessionState::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Terminal result delivered to the `open` callback, exactly once per session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SessionOutcome {
    /// A validated barcode
    Succeeded {
        /// The accepted payload
        payload: String,
        /// Its inferred symbology
        symbology: BarcodeSymbology,
    },
    /// Environment failure
    Failed {
        /// Why the session failed
        #[serde(serialize_with = "serialize_display")]
        error: ScanError,
    },
    /// Closed by the caller, or superseded by a new session
    Cancelled,
}

fn serialize_display<T: fmt::Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Counters for one session, reset when a new session opens
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Rejected decodes so far; never decreases within a session
    pub invalid_attempts: u32,
    /// Accepted decodes suppressed as repeats of the last accepted payload
    pub duplicates: u32,
    /// Frames delivered by the camera
    pub frames_seen: u64,
    /// Frames skipped by the frame-rate limit
    pub frames_throttled: u64,
    /// Decode attempts that produced a payload
    pub decodes: u64,
    /// Whether the repeated-invalid-reads advisory has been raised
    pub advisory_raised: bool,
}

impl SessionStats {
    pub(crate) fn record_rejection(&mut self) -> u32 {
        self.invalid_attempts = self.invalid_attempts.saturating_add(1);
        self.invalid_attempts
    }
}

/// Non-fatal warning raised after repeated invalid reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advisory {
    /// Invalid attempts at the moment the threshold was crossed
    pub invalid_attempts: u32,
    /// Reason of the rejection that crossed the threshold
    pub last_reason: RejectReason,
}

impl Advisory {
    /// Text suitable for showing next to the camera preview
    pub fn message(&self) -> String {
        format!(
            "multiple invalid reads ({} so far, last: {}); check the barcode is clean and well lit",
            self.invalid_attempts, self.last_reason
        )
    }
}
