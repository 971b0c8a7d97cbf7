use image::{GrayImage, imageops};
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

/// Identifier of a camera device as reported by the camera backend
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(String);

impl DeviceId {
    /// Create a device id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A camera device reported by `Camera::list_devices`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Backend id passed to `Camera::start`
    pub id: DeviceId,
    /// Human-readable label, only used to prefer rear-facing devices
    pub label: String,
}

impl DeviceDescriptor {
    /// Create a descriptor
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: DeviceId::new(id),
            label: label.into(),
        }
    }
}

/// Centred rectangle of a frame that is handed to the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRegion {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl ScanRegion {
    /// Create a scan region
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for ScanRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for ScanRegion {
    type Err = String;

    /// Parse `WIDTHxHEIGHT`, e.g. `250x250`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
        let width = w
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid width '{}': {}", w, e))?;
        let height = h
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid height '{}': {}", h, e))?;
        if width == 0 || height == 0 {
            return Err(format!("scan region must be non-empty, got {}x{}", width, height));
        }
        Ok(Self { width, height })
    }
}

/// One grayscale video frame from the camera
#[derive(Debug, Clone)]
pub struct Frame {
    image: GrayImage,
    sequence: u64,
    captured_at: Instant,
    source: Option<PathBuf>,
}

impl Frame {
    /// Wrap a grayscale image captured now
    pub fn new(image: GrayImage, sequence: u64) -> Self {
        Self {
            image,
            sequence,
            captured_at: Instant::now(),
            source: None,
        }
    }

    /// Build a frame from raw luma bytes (1 byte per pixel, row-major)
    ///
    /// Returns `None` if `pixels.len() != width * height`.
    pub fn from_luma(width: u32, height: u32, pixels: Vec<u8>, sequence: u64) -> Option<Self> {
        GrayImage::from_raw(width, height, pixels).map(|image| Self::new(image, sequence))
    }

    /// All-black frame, mostly useful for stubs
    pub fn blank(width: u32, height: u32, sequence: u64) -> Self {
        Self::new(GrayImage::new(width, height), sequence)
    }

    /// Override the capture instant
    pub fn with_captured_at(mut self, captured_at: Instant) -> Self {
        self.captured_at = captured_at;
        self
    }

    /// Record the file the frame was loaded from
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Frame width in pixels
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Frame height in pixels
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Pixel data
    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    /// Position of this frame in its camera stream (0-based)
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// When the frame was captured
    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    /// File the frame was loaded from, for file-backed cameras
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Centred crop to `region`, clamped to the frame bounds
    ///
    /// Borrows `self` unchanged when the region covers the whole frame.
    pub fn crop(&self, region: ScanRegion) -> Cow<'_, Frame> {
        let width = region.width.min(self.width());
        let height = region.height.min(self.height());
        if width == self.width() && height == self.height() {
            return Cow::Borrowed(self);
        }
        let x = (self.width() - width) / 2;
        let y = (self.height() - height) / 2;
        let image = imageops::crop_imm(&self.image, x, y, width, height).to_image();
        Cow::Owned(Frame {
            image,
            sequence: self.sequence,
            captured_at: self.captured_at,
            source: self.source.clone(),
        })
    }
}

/// A candidate string produced by the decoder for one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDecode {
    /// Decoded text
    pub payload: String,
    /// When the decode happened
    pub timestamp: Instant,
}

impl RawDecode {
    /// Decode observed now
    pub fn new(payload: impl Into<String>) -> Self {
        Self::at(payload, Instant::now())
    }

    /// Decode observed at `timestamp`
    pub fn at(payload: impl Into<String>, timestamp: Instant) -> Self {
        Self {
            payload: payload.into(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_scan_region_parse() {
        assert_eq!("250x250".parse::<ScanRegion>(), Ok(ScanRegion::new(250, 250)));
        assert_eq!(" 640X480 ".parse::<ScanRegion>(), Ok(ScanRegion::new(640, 480)));
        assert!("250".parse::<ScanRegion>().is_err());
        assert!("0x10".parse::<ScanRegion>().is_err());
        assert!("ax10".parse::<ScanRegion>().is_err());
    }

    #[test]
    fn test_crop_is_centred() {
        let mut image = GrayImage::new(10, 6);
        // Top-left pixel of the centred 4x2 box
        image.put_pixel(3, 2, Luma([200]));
        let frame = Frame::new(image, 7).with_source("a.png");
        let cropped = frame.crop(ScanRegion::new(4, 2));
        assert_eq!(cropped.width(), 4);
        assert_eq!(cropped.height(), 2);
        assert_eq!(cropped.image().get_pixel(0, 0)[0], 200);
        assert_eq!(cropped.sequence(), 7);
        assert_eq!(cropped.source(), Some(Path::new("a.png")));
    }

    #[test]
    fn test_crop_larger_than_frame_borrows() {
        let frame = Frame::blank(100, 80, 0);
        let cropped = frame.crop(ScanRegion::new(250, 250));
        assert!(matches!(cropped, Cow::Borrowed(_)));
        assert_eq!((cropped.width(), cropped.height()), (100, 80));
    }

    #[test]
    fn test_crop_clamps_one_axis() {
        let frame = Frame::blank(400, 100, 0);
        let cropped = frame.crop(ScanRegion::new(250, 250));
        assert_eq!((cropped.width(), cropped.height()), (250, 100));
    }

    #[test]
    fn test_from_luma_checks_length() {
        assert!(Frame::from_luma(2, 2, vec![0; 4], 0).is_some());
        assert!(Frame::from_luma(2, 2, vec![0; 3], 0).is_none());
    }
}
