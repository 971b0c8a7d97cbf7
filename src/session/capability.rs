use crate::error::{CameraError, DecoderError};
use crate::models::{DeviceDescriptor, DeviceId, Frame, RawDecode};

/// Camera backend driven by the scan session
///
/// A session calls `list_devices`, then `start` on the chosen device, then
/// pulls frames with `next_frame` until it reaches a terminal state, and
/// finally calls `stop`. `stop` must tolerate being called when the camera
/// was never started or has already been stopped.
pub trait Camera: Send {
    /// Enumerate available devices
    fn list_devices(&mut self) -> Result<Vec<DeviceDescriptor>, CameraError>;

    /// Start streaming from `device`
    fn start(&mut self, device: &DeviceId) -> Result<(), CameraError>;

    /// Next frame of the stream; `Ok(None)` once the stream has ended
    fn next_frame(&mut self) -> Result<Option<Frame>, CameraError>;

    /// Stop streaming and release the device
    fn stop(&mut self);
}

/// Symbol decoder invoked once per frame
pub trait Decoder: Send {
    /// Prepare the decoder before the camera starts
    fn init(&mut self) -> Result<(), DecoderError> {
        Ok(())
    }

    /// Decode at most one symbol from `frame`
    ///
    /// `Ok(None)` means nothing was found on this frame, which is the common
    /// case. `Err` is reserved for failures that should end the session.
    fn try_decode(&mut self, frame: &Frame) -> Result<Option<RawDecode>, DecoderError>;
}

impl<T: Camera + ?Sized> Camera for Box<T> {
    fn list_devices(&mut self) -> Result<Vec<DeviceDescriptor>, CameraError> {
        (**self).list_devices()
    }

    fn start(&mut self, device: &DeviceId) -> Result<(), CameraError> {
        (**self).start(device)
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, CameraError> {
        (**self).next_frame()
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}

impl<T: Decoder + ?Sized> Decoder for Box<T> {
    fn init(&mut self) -> Result<(), DecoderError> {
        (**self).init()
    }

    fn try_decode(&mut self, frame: &Frame) -> Result<Option<RawDecode>, DecoderError> {
        (**self).try_decode(frame)
    }
}

/// Pick the device to scan with
///
/// The first device whose label contains any of `preferred` (ignoring case)
/// wins; otherwise the first device. `None` when `devices` is empty.
pub fn select_device<'a, S: AsRef<str>>(
    devices: &'a [DeviceDescriptor],
    preferred: &[S],
) -> Option<&'a DeviceDescriptor> {
    devices
        .iter()
        .find(|device| {
            let label = device.label.to_lowercase();
            preferred
                .iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .any(|p| !p.is_empty() && label.contains(&p))
        })
        .or_else(|| devices.first())
}
