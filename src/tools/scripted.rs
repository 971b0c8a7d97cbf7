use crate::error::{CameraError, DecoderError};
use crate::models::{DeviceDescriptor, DeviceId, Frame, RawDecode};
use crate::session::{Camera, Decoder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

const DEFAULT_WIDTH: u32 = 320;
const DEFAULT_HEIGHT: u32 = 240;
/// Matches the default 10 fps decode rate so no scripted frame is throttled
const DEFAULT_SPACING: Duration = Duration::from_millis(100);

/// Observes a scripted camera after it has been moved into a controller
#[derive(Debug, Clone, Default)]
pub struct CameraProbe {
    inner: Arc<ProbeState>,
}

#[derive(Debug, Default)]
struct ProbeState {
    starts: AtomicUsize,
    stops: AtomicUsize,
    frames: AtomicUsize,
    device: Mutex<Option<DeviceId>>,
}

impl CameraProbe {
    /// Number of `start` calls
    pub fn starts(&self) -> usize {
        self.inner.starts.load(Ordering::SeqCst)
    }

    /// Number of `stop` calls
    pub fn stops(&self) -> usize {
        self.inner.stops.load(Ordering::SeqCst)
    }

    /// Frames handed out so far
    pub fn frames_served(&self) -> usize {
        self.inner.frames.load(Ordering::SeqCst)
    }

    /// Device passed to the most recent `start`
    pub fn started_device(&self) -> Option<DeviceId> {
        self.inner
            .device
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Camera that serves blank frames on a fixed synthetic clock
///
/// Frame `n` is stamped `start + n * spacing`, so frame-rate limiting
/// behaves the same regardless of how fast the test runs.
#[derive(Debug)]
pub struct ScriptedCamera {
    devices: Vec<DeviceDescriptor>,
    frame_count: Option<usize>,
    fail_at: Option<(usize, String)>,
    permission_denied: Option<String>,
    spacing: Duration,
    width: u32,
    height: u32,
    next: usize,
    started_at: Option<Instant>,
    probe: CameraProbe,
}

impl ScriptedCamera {
    /// Camera with one rear device that ends after `frame_count` frames
    pub fn new(frame_count: usize) -> Self {
        Self {
            devices: vec![DeviceDescriptor::new("scripted-0", "Back Camera (scripted)")],
            frame_count: Some(frame_count),
            fail_at: None,
            permission_denied: None,
            spacing: DEFAULT_SPACING,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            next: 0,
            started_at: None,
            probe: CameraProbe::default(),
        }
    }

    /// Camera whose stream never ends
    pub fn endless() -> Self {
        Self {
            frame_count: None,
            ..Self::new(0)
        }
    }

    /// Replace the device list (empty means no camera)
    pub fn with_devices(mut self, devices: Vec<DeviceDescriptor>) -> Self {
        self.devices = devices;
        self
    }

    /// Synthetic time between frames
    pub fn with_frame_spacing(mut self, spacing: Duration) -> Self {
        self.spacing = spacing;
        self
    }

    /// Frame size
    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Break the stream when frame `index` is requested
    pub fn failing_at(mut self, index: usize, message: impl Into<String>) -> Self {
        self.fail_at = Some((index, message.into()));
        self
    }

    /// Refuse device enumeration
    pub fn permission_denied(mut self, message: impl Into<String>) -> Self {
        self.permission_denied = Some(message.into());
        self
    }

    /// Probe sharing this camera's counters
    pub fn probe(&self) -> CameraProbe {
        self.probe.clone()
    }
}

impl Camera for ScriptedCamera {
    fn list_devices(&mut self) -> Result<Vec<DeviceDescriptor>, CameraError> {
        if let Some(message) = &self.permission_denied {
            return Err(CameraError::PermissionDenied(message.clone()));
        }
        Ok(self.devices.clone())
    }

    fn start(&mut self, device: &DeviceId) -> Result<(), CameraError> {
        if !self.devices.iter().any(|d| &d.id == device) {
            return Err(CameraError::DeviceNotFound(device.to_string()));
        }
        self.probe.inner.starts.fetch_add(1, Ordering::SeqCst);
        *self
            .probe
            .inner
            .device
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(device.clone());
        self.next = 0;
        self.started_at = Some(Instant::now());
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, CameraError> {
        let Some(started_at) = self.started_at else {
            return Err(CameraError::Stream("camera not started".to_string()));
        };
        if let Some((index, message)) = &self.fail_at {
            if *index == self.next {
                return Err(CameraError::Stream(message.clone()));
            }
        }
        if self.frame_count.is_some_and(|count| self.next >= count) {
            return Ok(None);
        }
        let sequence = self.next as u64;
        let captured_at = started_at + self.spacing * self.next as u32;
        self.next += 1;
        self.probe.inner.frames.fetch_add(1, Ordering::SeqCst);
        Ok(Some(
            Frame::blank(self.width, self.height, sequence).with_captured_at(captured_at),
        ))
    }

    fn stop(&mut self) {
        self.probe.inner.stops.fetch_add(1, Ordering::SeqCst);
        self.started_at = None;
    }
}

/// Decoder that replays a fixed list of results indexed by frame sequence
#[derive(Debug, Clone, Default)]
pub struct ScriptedDecoder {
    script: Vec<Option<String>>,
    cycle: bool,
    init_error: Option<String>,
    fatal_at: Option<(u64, String)>,
}

impl ScriptedDecoder {
    /// Frame `n` decodes to `script[n]`; frames past the end decode to nothing
    pub fn new(script: Vec<Option<String>>) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }

    /// Repeat the script forever
    pub fn cycled(mut self) -> Self {
        self.cycle = true;
        self
    }

    /// Fail `init`
    pub fn failing_init(mut self, message: impl Into<String>) -> Self {
        self.init_error = Some(message.into());
        self
    }

    /// Fail fatally when decoding frame `sequence`
    pub fn fatal_at(mut self, sequence: u64, message: impl Into<String>) -> Self {
        self.fatal_at = Some((sequence, message.into()));
        self
    }
}

impl Decoder for ScriptedDecoder {
    fn init(&mut self) -> Result<(), DecoderError> {
        match &self.init_error {
            Some(message) => Err(DecoderError::Init(message.clone())),
            None => Ok(()),
        }
    }

    fn try_decode(&mut self, frame: &Frame) -> Result<Option<RawDecode>, DecoderError> {
        if let Some((sequence, message)) = &self.fatal_at {
            if *sequence == frame.sequence() {
                return Err(DecoderError::Fatal(message.clone()));
            }
        }
        if self.script.is_empty() {
            return Ok(None);
        }
        let mut index = frame.sequence() as usize;
        if self.cycle {
            index %= self.script.len();
        }
        Ok(self
            .script
            .get(index)
            .cloned()
            .flatten()
            .map(|payload| RawDecode::at(payload, frame.captured_at())))
    }
}

/// Camera, decoder and probe for a script of per-frame decode results
///
/// The camera serves exactly one frame per script entry, then ends.
pub fn scripted(script: Vec<Option<String>>) -> (ScriptedCamera, ScriptedDecoder, CameraProbe) {
    let camera = ScriptedCamera::new(script.len());
    let probe = camera.probe();
    (camera, ScriptedDecoder::new(script), probe)
}
