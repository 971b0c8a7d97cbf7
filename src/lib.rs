//! barcode_gate - barcode capture and validation engine
//!
//! Sits between a camera, an external symbol decoder and the stock screens
//! that need a barcode. Every decoded string is classified and checksummed,
//! repeats are suppressed, invalid reads are counted, and each scan session
//! reports exactly one terminal outcome.
//!
//! ```
//! use barcode_gate::{BarcodeSymbology, validate};
//!
//! let outcome = validate("036000291452");
//! assert_eq!(outcome.symbology(), Some(BarcodeSymbology::UpcA));
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Session tuning and environment overrides
pub mod config;
/// Last-value duplicate suppression
pub mod dedup;
/// Camera, decoder and session errors
pub mod error;
/// Logger setup for binaries
pub mod logging;
/// Core data structures (frames, outcomes, session state)
pub mod models;
/// Scan session controller and its camera/decoder capabilities
pub mod session;
/// Offline cameras, decoders and dataset helpers
pub mod tools;
/// Symbology classification and checksum validation
pub mod validator;

pub use config::ScanConfig;
pub use dedup::DedupFilter;
pub use error::{CameraError, DecoderError, ScanError};
pub use models::{
    Advisory, BarcodeSymbology, DeviceDescriptor, DeviceId, Frame, RawDecode, RejectReason,
    ScanRegion, ScanSessionState, SessionOutcome, SessionStats, ValidationOutcome,
};
pub use session::{Camera, Decoder, ScanController, SessionHandle, SessionId};
pub use validator::{TrustPolicy, validate, validate_batch, validate_batch_with, validate_with};
