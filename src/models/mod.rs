/// Camera devices, frames and decoder output
pub mod frame;
/// Validation results
pub mod outcome;
/// Session lifecycle, results and counters
pub mod state;
/// Supported barcode symbologies
pub mod symbology;

pub use frame::{DeviceDescriptor, DeviceId, Frame, RawDecode, ScanRegion};
pub use outcome::{RejectReason, ValidationOutcome};
pub use state::{Advisory, ScanSessionState, SessionOutcome, SessionStats};
pub use symbology::BarcodeSymbology;
