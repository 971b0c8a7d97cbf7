//! Scan session tuning
//!
//! Defaults mirror the stock-item scanner: 10 decode attempts per second over
//! a centred 250x250 box, preferring a rear-facing camera. Each knob can be
//! overridden from the environment:
//!
//! | Variable | Format | Default |
//! |---|---|---|
//! | `SCAN_ADVISORY_THRESHOLD` | integer | `3` |
//! | `SCAN_FPS` | integer, `0` = unthrottled | `10` |
//! | `SCAN_REGION` | `WIDTHxHEIGHT` or `off` | `250x250` |
//! | `SCAN_PREFERRED_LABELS` | comma-separated | `back,rear` |
//! | `SCAN_TRUST` | `permissive` or `checksummed` | `permissive` |
//!
//! Malformed values fall back to the default.

use crate::models::ScanRegion;
use crate::validator::TrustPolicy;
use std::sync::OnceLock;
use std::time::Duration;

/// Invalid reads tolerated before the advisory is raised
pub const DEFAULT_ADVISORY_THRESHOLD: u32 = 3;
/// Decode attempts per second
pub const DEFAULT_FPS: u32 = 10;
/// Side of the default square scan box, in pixels
pub const DEFAULT_REGION_SIDE: u32 = 250;

/// Configuration for a [`ScanController`](crate::session::ScanController)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Advisory is raised once `invalid_attempts` exceeds this
    pub advisory_threshold: u32,
    /// Maximum decode attempts per second; `0` decodes every frame
    pub fps: u32,
    /// Centred region handed to the decoder; `None` decodes the full frame
    pub scan_region: Option<ScanRegion>,
    /// Case-insensitive label keywords that mark a preferred device
    pub preferred_labels: Vec<String>,
    /// Which symbologies may end a session successfully
    pub trust: TrustPolicy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            advisory_threshold: DEFAULT_ADVISORY_THRESHOLD,
            fps: DEFAULT_FPS,
            scan_region: Some(ScanRegion::new(DEFAULT_REGION_SIDE, DEFAULT_REGION_SIDE)),
            preferred_labels: vec!["back".to_string(), "rear".to_string()],
            trust: TrustPolicy::Permissive,
        }
    }
}

static ENV_CONFIG: OnceLock<ScanConfig> = OnceLock::new();

impl ScanConfig {
    /// Defaults overridden by `SCAN_*` environment variables
    ///
    /// The environment is read once per process.
    pub fn from_env() -> Self {
        ENV_CONFIG
            .get_or_init(|| Self::from_lookup(|name| std::env::var(name).ok()))
            .clone()
    }

    /// Defaults overridden by whatever `lookup` returns for each `SCAN_*` name
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_var(&lookup, "SCAN_ADVISORY_THRESHOLD") {
            config.advisory_threshold = v;
        }
        if let Some(v) = parse_var(&lookup, "SCAN_FPS") {
            config.fps = v;
        }
        if let Some(raw) = lookup("SCAN_REGION") {
            let raw = raw.trim();
            if raw.eq_ignore_ascii_case("off") || raw.eq_ignore_ascii_case("none") {
                config.scan_region = None;
            } else if let Ok(region) = raw.parse::<ScanRegion>() {
                config.scan_region = Some(region);
            }
        }
        if let Some(raw) = lookup("SCAN_PREFERRED_LABELS") {
            let labels: Vec<String> = raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !labels.is_empty() {
                config.preferred_labels = labels;
            }
        }
        if let Some(v) = parse_var(&lookup, "SCAN_TRUST") {
            config.trust = v;
        }

        config
    }

    /// Set the advisory threshold
    pub fn with_advisory_threshold(mut self, threshold: u32) -> Self {
        self.advisory_threshold = threshold;
        self
    }

    /// Set the decode rate limit
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Set or clear the scan region
    pub fn with_scan_region(mut self, region: Option<ScanRegion>) -> Self {
        self.scan_region = region;
        self
    }

    /// Replace the preferred device label keywords
    pub fn with_preferred_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferred_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Set the trust policy
    pub fn with_trust(mut self, trust: TrustPolicy) -> Self {
        self.trust = trust;
        self
    }

    /// Minimum spacing between decode attempts, `None` when unthrottled
    pub fn frame_interval(&self) -> Option<Duration> {
        if self.fps == 0 {
            None
        } else {
            Some(Duration::from_nanos(1_000_000_000 / self.fps as u64))
        }
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(name).and_then(|v| v.trim().parse::<T>().ok())
}
