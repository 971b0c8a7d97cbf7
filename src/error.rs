//! Error types for camera, decoder and session failures
//!
//! Validation rejections are not errors; they are
//! [`ValidationOutcome::Rejected`](crate::ValidationOutcome) values.

use thiserror::Error;

/// Failure reported by a [`Camera`](crate::session::Camera) backend
#[derive(Debug, Error)]
pub enum CameraError {
    /// No device could be enumerated
    #[error("no camera device available")]
    NoDevice,
    /// The platform refused access to the camera
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),
    /// `start` was called with an id the backend does not know
    #[error("camera device not found: {0}")]
    DeviceNotFound(String),
    /// The device exists but could not be started
    #[error("failed to start camera: {0}")]
    StartFailed(String),
    /// The frame stream broke mid-session
    #[error("camera stream error: {0}")]
    Stream(String),
    /// The frame stream finished before a code was read
    #[error("camera stream ended")]
    StreamEnded,
    /// I/O failure in a file-backed camera
    #[error("camera I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Image decoding failure in a file-backed camera
    #[error("frame image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Failure reported by a [`Decoder`](crate::session::Decoder)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecoderError {
    /// The decoder could not be initialised
    #[error("decoder initialization failed: {0}")]
    Init(String),
    /// The decoder hit an error it cannot recover from
    #[error("decoder failure: {0}")]
    Fatal(String),
}

/// Terminal failure reason of a scan session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// Device enumeration found nothing to scan with
    #[error("no camera available")]
    NoCameraAvailable,
    /// Camera access was refused
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),
    /// Camera failed to start or its stream broke
    #[error("camera error: {0}")]
    Camera(String),
    /// The camera stream ended while still scanning
    #[error("camera stream ended before a barcode was read")]
    StreamEnded,
    /// Decoder could not be initialised
    #[error("decoder initialization failed: {0}")]
    DecoderInit(String),
    /// Decoder failed mid-session
    #[error("decoder failure: {0}")]
    Decoder(String),
}

impl From<CameraError> for ScanError {
    fn from(err: CameraError) -> Self {
        match err {
            CameraError::NoDevice => ScanError::NoCameraAvailable,
            CameraError::PermissionDenied(msg) => ScanError::PermissionDenied(msg),
            CameraError::StreamEnded => ScanError::StreamEnded,
            other => ScanError::Camera(other.to_string()),
        }
    }
}

impl From<DecoderError> for ScanError {
    fn from(err: DecoderError) -> Self {
        match err {
            DecoderError::Init(msg) => ScanError::DecoderInit(msg),
            DecoderError::Fatal(msg) => ScanError::Decoder(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_error_mapping() {
        assert_eq!(ScanError::from(CameraError::NoDevice), ScanError::NoCameraAvailable);
        assert_eq!(ScanError::from(CameraError::StreamEnded), ScanError::StreamEnded);
        assert_eq!(
            ScanError::from(CameraError::PermissionDenied("blocked".into())),
            ScanError::PermissionDenied("blocked".into())
        );
        assert_eq!(
            ScanError::from(CameraError::Stream("usb reset".into())),
            ScanError::Camera("camera stream error: usb reset".into())
        );
    }

    #[test]
    fn test_decoder_error_mapping() {
        assert_eq!(
            ScanError::from(DecoderError::Init("no wasm".into())),
            ScanError::DecoderInit("no wasm".into())
        );
        assert_eq!(
            ScanError::from(DecoderError::Fatal("oom".into())).to_string(),
            "decoder failure: oom"
        );
    }
}
