use super::{dataset_iter, load_luma, read_label};
use crate::error::{CameraError, DecoderError};
use crate::models::{DeviceDescriptor, DeviceId, Frame, RawDecode};
use crate::session::{Camera, Decoder};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Camera backed by directories of still images
///
/// Every directory is one device; starting a device queues its images in
/// sorted order and each `next_frame` loads the next one as grayscale.
#[derive(Debug)]
pub struct DirectoryCamera {
    devices: Vec<(DeviceDescriptor, PathBuf)>,
    limit: Option<usize>,
    smoke: bool,
    spacing: Duration,
    pending: VecDeque<PathBuf>,
    sequence: u64,
    started_at: Option<Instant>,
}

impl DirectoryCamera {
    /// One device serving the images under `root`
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            devices: Vec::new(),
            limit: None,
            smoke: false,
            spacing: Duration::from_millis(100),
            pending: VecDeque::new(),
            sequence: 0,
            started_at: None,
        }
        .with_device(root)
    }

    /// Add another directory as a device, labelled by its file name
    pub fn with_device<P: AsRef<Path>>(mut self, root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        let label = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        let descriptor = DeviceDescriptor::new(root.display().to_string(), label);
        self.devices.push((descriptor, root));
        self
    }

    /// Serve at most `limit` images
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Prefer the `_smoke.txt` list in the device directory when present
    pub fn with_smoke(mut self, smoke: bool) -> Self {
        self.smoke = smoke;
        self
    }

    /// Synthetic time between frames
    pub fn with_frame_spacing(mut self, spacing: Duration) -> Self {
        self.spacing = spacing;
        self
    }
}

impl Camera for DirectoryCamera {
    fn list_devices(&mut self) -> Result<Vec<DeviceDescriptor>, CameraError> {
        Ok(self
            .devices
            .iter()
            .filter(|(_, root)| root.is_dir())
            .map(|(descriptor, _)| descriptor.clone())
            .collect())
    }

    fn start(&mut self, device: &DeviceId) -> Result<(), CameraError> {
        let (_, root) = self
            .devices
            .iter()
            .find(|(descriptor, _)| &descriptor.id == device)
            .ok_or_else(|| CameraError::DeviceNotFound(device.to_string()))?;
        if !root.is_dir() {
            return Err(CameraError::StartFailed(format!("{} is not a directory", root.display())));
        }
        self.pending = dataset_iter(root, self.limit, self.smoke).collect();
        log::debug!("directory camera {} queued {} image(s)", root.display(), self.pending.len());
        self.sequence = 0;
        self.started_at = Some(Instant::now());
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, CameraError> {
        let Some(started_at) = self.started_at else {
            return Err(CameraError::Stream("camera not started".to_string()));
        };
        let Some(path) = self.pending.pop_front() else {
            return Ok(None);
        };
        let image = load_luma(&path)?;
        let captured_at = started_at + self.spacing * self.sequence as u32;
        let frame = Frame::new(image, self.sequence)
            .with_captured_at(captured_at)
            .with_source(path);
        self.sequence += 1;
        Ok(Some(frame))
    }

    fn stop(&mut self) {
        self.pending.clear();
        self.started_at = None;
    }
}

/// Decoder that reads the label file stored next to a frame's image
///
/// `shelf/item01.png` decodes to the first non-comment line of
/// `shelf/item01.txt`; frames without a label decode to nothing.
#[derive(Debug, Clone)]
pub struct LabelDecoder {
    extension: String,
}

impl LabelDecoder {
    /// Decoder reading `.txt` labels
    pub fn new() -> Self {
        Self::with_extension("txt")
    }

    /// Decoder reading labels with a custom extension
    pub fn with_extension(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }
}

impl Default for LabelDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LabelDecoder {
    fn try_decode(&mut self, frame: &Frame) -> Result<Option<RawDecode>, DecoderError> {
        let Some(source) = frame.source() else {
            return Ok(None);
        };
        let label_path = source.with_extension(&self.extension);
        Ok(read_label(&label_path).map(|payload| RawDecode::at(payload, frame.captured_at())))
    }
}
