use super::capability::{Camera, Decoder, select_device};
use super::handle::{SessionControl, SessionHandle, SessionId, SessionRecord};
use super::lock;
use crate::config::ScanConfig;
use crate::dedup::DedupFilter;
use crate::error::{CameraError, DecoderError, ScanError};
use crate::models::{
    Advisory, DeviceDescriptor, Frame, RawDecode, RejectReason, ScanRegion, ScanSessionState,
    SessionOutcome, SessionStats, ValidationOutcome,
};
use crate::validator::validate_with;
use log::{debug, info, trace, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, TryLockError};
use std::time::Instant;

type ResultCallback = Box<dyn FnOnce(SessionOutcome) + Send>;
type AdvisoryCallback = Arc<dyn Fn(Advisory) + Send + Sync>;

/// Drives one scan session at a time over a camera and a decoder
///
/// Decode ticks are applied strictly in the order they are fed in. Once a
/// session is terminal every further tick is discarded, and the camera is
/// stopped exactly once no matter how many exit paths race to release it.
///
/// Session state and the capture devices sit behind separate locks: a frame
/// request or decode in progress never holds up a cancel from another
/// thread.
///
/// # Example
/// ```
/// use barcode_gate::session::ScanController;
/// use barcode_gate::tools::scripted;
///
/// let (camera, decoder, probe) = scripted(vec![None, Some("4006381333931".to_string())]);
/// let mut controller = ScanController::new(camera, decoder);
/// let handle = controller.open(|outcome| println!("{:?}", outcome));
/// controller.run();
/// assert!(handle.is_terminal());
/// assert_eq!(probe.stops(), 1);
/// ```
pub struct ScanController<C, D>
where
    C: Camera + 'static,
    D: Decoder + 'static,
{
    core: Arc<Mutex<SessionCore<C, D>>>,
    capture: Arc<Mutex<Capture<C, D>>>,
}

pub(crate) struct SessionCore<C, D> {
    capture: Arc<Mutex<Capture<C, D>>>,
    config: ScanConfig,
    dedup: DedupFilter,
    advisory: Option<AdvisoryCallback>,
    live: Option<LiveSession>,
    next_id: u64,
}

struct LiveSession {
    id: SessionId,
    record: Arc<Mutex<SessionRecord>>,
    cancel_requested: Arc<AtomicBool>,
    on_result: Option<ResultCallback>,
    last_decode_at: Option<Instant>,
}

/// Camera and decoder, locked apart from the session state
///
/// Cancel paths only `try_lock` it; a busy camera is stopped by whoever
/// holds it once the frame request returns.
struct Capture<C, D> {
    camera: C,
    decoder: D,
    camera_active: bool,
}

impl<C: Camera, D: Decoder> Capture<C, D> {
    fn start(&mut self, preferred: &[String]) -> Result<DeviceDescriptor, ScanError> {
        let devices = self.camera.list_devices()?;
        let device = select_device(&devices, preferred)
            .cloned()
            .ok_or(ScanError::NoCameraAvailable)?;
        self.decoder.init()?;
        // From here on the camera may hold the device even if start fails
        self.camera_active = true;
        self.camera.start(&device.id)?;
        Ok(device)
    }

    /// Next frame, or `None` once the camera has been released
    fn pull(&mut self) -> Option<Result<Option<Frame>, CameraError>> {
        if !self.camera_active {
            return None;
        }
        Some(self.camera.next_frame())
    }

    fn decode(&mut self, frame: &Frame, region: Option<ScanRegion>) -> Result<Option<RawDecode>, DecoderError> {
        match region {
            Some(region) => self.decoder.try_decode(&frame.crop(region)),
            None => self.decoder.try_decode(frame),
        }
    }

    /// Stop the camera if it is running; `true` if this call stopped it
    fn release(&mut self) -> bool {
        if !self.camera_active {
            return false;
        }
        self.camera_active = false;
        self.camera.stop();
        true
    }
}

/// Callbacks collected under the core lock and run after it is released
#[derive(Default)]
struct Deliveries {
    advisory: Option<(AdvisoryCallback, Advisory)>,
    results: Vec<(ResultCallback, SessionOutcome)>,
}

impl Deliveries {
    fn merge(&mut self, other: Deliveries) {
        if other.advisory.is_some() {
            self.advisory = other.advisory;
        }
        self.results.extend(other.results);
    }

    fn deliver(self) {
        if let Some((callback, advisory)) = self.advisory {
            callback(advisory);
        }
        for (callback, outcome) in self.results {
            callback(outcome);
        }
    }
}

impl<C, D> ScanController<C, D>
where
    C: Camera + 'static,
    D: Decoder + 'static,
{
    /// Controller with the default configuration
    pub fn new(camera: C, decoder: D) -> Self {
        let capture = Arc::new(Mutex::new(Capture {
            camera,
            decoder,
            camera_active: false,
        }));
        Self {
            core: Arc::new(Mutex::new(SessionCore {
                capture: Arc::clone(&capture),
                config: ScanConfig::default(),
                dedup: DedupFilter::new(),
                advisory: None,
                live: None,
                next_id: 0,
            })),
            capture,
        }
    }

    /// Replace the configuration; applies to sessions opened afterwards
    /// (and to the frame-rate limit of a live one)
    pub fn with_config(self, config: ScanConfig) -> Self {
        lock(&self.core).config = config;
        self
    }

    /// Register a callback for the repeated-invalid-reads advisory
    pub fn on_advisory<F>(self, callback: F) -> Self
    where
        F: Fn(Advisory) + Send + Sync + 'static,
    {
        lock(&self.core).advisory = Some(Arc::new(callback));
        self
    }

    /// Current configuration
    pub fn config(&self) -> ScanConfig {
        lock(&self.core).config.clone()
    }

    /// Open a new session, cancelling any session still live
    ///
    /// `on_result` runs exactly once, when the session reaches a terminal
    /// state. If the camera or decoder cannot be started it runs before
    /// `open` returns, with a `Failed` outcome.
    pub fn open<F>(&mut self, on_result: F) -> SessionHandle
    where
        F: FnOnce(SessionOutcome) + Send + 'static,
    {
        let (id, record, cancel_requested, deliveries) = lock(&self.core).open(Box::new(on_result));
        deliveries.deliver();
        let control: Arc<dyn SessionControl> = self.core.clone();
        SessionHandle::new(id, record, cancel_requested, Arc::downgrade(&control))
    }

    /// Feed one camera frame: decode it and apply the result
    pub fn on_frame(&mut self, frame: &Frame) {
        let deliveries = self.process_frame(frame);
        self.settle();
        deliveries.deliver();
    }

    /// Feed one decode tick directly, bypassing the decoder
    pub fn on_decode(&mut self, raw: Option<RawDecode>) {
        let deliveries = lock(&self.core).on_decode(raw);
        deliveries.deliver();
    }

    /// Report a fatal camera error; fails the live session
    pub fn on_camera_error(&mut self, err: CameraError) {
        let deliveries = {
            let mut core = lock(&self.core);
            match core.cancel_if_requested() {
                Some(deliveries) => deliveries,
                None => core.fail(err.into()),
            }
        };
        deliveries.deliver();
    }

    /// Pull frames from the camera until the live session is terminal
    ///
    /// The core lock is never held while waiting for a frame or decoding
    /// one. Returns the final state, or `None` if no session was ever opened.
    pub fn run(&mut self) -> Option<ScanSessionState> {
        loop {
            let scanning = lock(&self.core).scanning_id();
            let Some(id) = scanning else {
                break;
            };
            let pulled = lock(&self.capture).pull();
            let deliveries = match pulled {
                Some(Ok(Some(frame))) => self.process_frame(&frame),
                Some(Ok(None)) => lock(&self.core).fail_session(id, ScanError::StreamEnded),
                Some(Err(err)) => lock(&self.core).fail_session(id, err.into()),
                None => {
                    trace!("session {} camera already released", id);
                    break;
                }
            };
            self.settle();
            deliveries.deliver();
        }
        self.settle();
        self.state()
    }

    /// Cancel the live session; no-op if it is already terminal
    pub fn cancel(&mut self) {
        let deliveries = lock(&self.core).finish(SessionOutcome::Cancelled);
        self.settle();
        deliveries.deliver();
    }

    /// Tear down the live session as the owning screen goes away
    pub fn teardown(&mut self) {
        let deliveries = {
            let mut core = lock(&self.core);
            if let Some(live) = &core.live {
                debug!("session {} teardown", live.id);
            }
            core.finish(SessionOutcome::Cancelled)
        };
        self.settle();
        deliveries.deliver();
    }

    /// State of the most recent session
    pub fn state(&self) -> Option<ScanSessionState> {
        lock(&self.core)
            .live
            .as_ref()
            .map(|live| lock(&live.record).state.clone())
    }

    /// Counters of the most recent session
    pub fn stats(&self) -> Option<SessionStats> {
        lock(&self.core)
            .live
            .as_ref()
            .map(|live| lock(&live.record).stats)
    }

    /// Id of the most recent session
    pub fn session_id(&self) -> Option<SessionId> {
        lock(&self.core).live.as_ref().map(|live| live.id)
    }

    /// Admit, decode and apply one frame, taking the core lock only around
    /// admission and application
    fn process_frame(&self, frame: &Frame) -> Deliveries {
        let admitted = lock(&self.core).admit(frame);
        let (id, region) = match admitted {
            Ok(admitted) => admitted,
            Err(deliveries) => return deliveries,
        };
        let decoded = lock(&self.capture).decode(frame, region);
        lock(&self.core).apply(id, decoded)
    }

    /// Stop the camera if the session ended while a frame was in flight
    fn settle(&self) {
        let scanning = lock(&self.core).scanning_id().is_some();
        if !scanning && lock(&self.capture).release() {
            debug!("camera released after in-flight frame");
        }
    }
}

impl<C, D> Drop for ScanController<C, D>
where
    C: Camera + 'static,
    D: Decoder + 'static,
{
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<C, D> SessionControl for Mutex<SessionCore<C, D>>
where
    C: Camera + 'static,
    D: Decoder + 'static,
{
    fn cancel_session(&self, id: SessionId) {
        let deliveries = {
            let mut core = lock(self);
            if core.is_live(id) {
                core.finish(SessionOutcome::Cancelled)
            } else {
                trace!("cancel for superseded session {} ignored", id);
                Deliveries::default()
            }
        };
        deliveries.deliver();
    }
}

impl<C: Camera, D: Decoder> SessionCore<C, D> {
    fn open(
        &mut self,
        on_result: ResultCallback,
    ) -> (SessionId, Arc<Mutex<SessionRecord>>, Arc<AtomicBool>, Deliveries) {
        let mut deliveries = self.finish(SessionOutcome::Cancelled);

        self.next_id += 1;
        let id = SessionId(self.next_id);
        let record = Arc::new(Mutex::new(SessionRecord::new()));
        let cancel_requested = Arc::new(AtomicBool::new(false));
        self.dedup.reset();
        self.live = Some(LiveSession {
            id,
            record: Arc::clone(&record),
            cancel_requested: Arc::clone(&cancel_requested),
            on_result: Some(on_result),
            last_decode_at: None,
        });
        info!("session {} opening", id);

        let started = lock(&self.capture).start(&self.config.preferred_labels);
        match started {
            Ok(device) => {
                info!("session {} scanning with '{}' ({})", id, device.label, device.id);
                lock(&record).state = ScanSessionState::Scanning;
            }
            Err(err) => {
                warn!("session {} could not start: {}", id, err);
                deliveries.merge(self.finish(SessionOutcome::Failed { error: err }));
            }
        }

        (id, record, cancel_requested, deliveries)
    }

    fn is_live(&self, id: SessionId) -> bool {
        self.live.as_ref().is_some_and(|live| live.id == id)
    }

    /// Id of the live session while it is scanning
    fn scanning_id(&self) -> Option<SessionId> {
        self.live
            .as_ref()
            .filter(|live| lock(&live.record).state.is_scanning())
            .map(|live| live.id)
    }

    /// Finish the live session as cancelled if its handle asked for it
    ///
    /// `Some` means the caller must not apply its own transition.
    fn cancel_if_requested(&mut self) -> Option<Deliveries> {
        let requested = self
            .live
            .as_ref()
            .is_some_and(|live| live.cancel_requested.load(Ordering::SeqCst));
        requested.then(|| self.finish(SessionOutcome::Cancelled))
    }

    /// Count the frame and decide whether it gets decoded
    fn admit(&mut self, frame: &Frame) -> Result<(SessionId, Option<ScanRegion>), Deliveries> {
        if let Some(deliveries) = self.cancel_if_requested() {
            return Err(deliveries);
        }
        let Some(live) = self.live.as_mut() else {
            trace!("frame {} with no session", frame.sequence());
            return Err(Deliveries::default());
        };
        {
            let mut record = lock(&live.record);
            if !record.state.is_scanning() {
                trace!("session {} discarding frame {} ({})", live.id, frame.sequence(), record.state);
                return Err(Deliveries::default());
            }
            record.stats.frames_seen += 1;
            if let (Some(interval), Some(last)) = (self.config.frame_interval(), live.last_decode_at) {
                if frame.captured_at().saturating_duration_since(last) < interval {
                    record.stats.frames_throttled += 1;
                    trace!("session {} throttled frame {}", live.id, frame.sequence());
                    return Err(Deliveries::default());
                }
            }
        }
        live.last_decode_at = Some(frame.captured_at());
        Ok((live.id, self.config.scan_region))
    }

    /// Apply the decoder's verdict on a frame admitted for session `id`
    fn apply(&mut self, id: SessionId, decoded: Result<Option<RawDecode>, DecoderError>) -> Deliveries {
        match decoded {
            Ok(raw) if self.is_live(id) => self.on_decode(raw),
            Ok(_) => {
                trace!("decode for superseded session {} discarded", id);
                Deliveries::default()
            }
            Err(err) => {
                warn!("session {} decoder failed: {}", id, err);
                self.fail_session(id, err.into())
            }
        }
    }

    fn fail_session(&mut self, id: SessionId, error: ScanError) -> Deliveries {
        if let Some(deliveries) = self.cancel_if_requested() {
            return deliveries;
        }
        if !self.is_live(id) {
            trace!("failure for superseded session {} ignored: {}", id, error);
            return Deliveries::default();
        }
        self.fail(error)
    }

    fn on_decode(&mut self, raw: Option<RawDecode>) -> Deliveries {
        if let Some(deliveries) = self.cancel_if_requested() {
            return deliveries;
        }
        let Some(live) = self.live.as_mut() else {
            return Deliveries::default();
        };
        let id = live.id;
        let mut record = lock(&live.record);
        if !record.state.is_scanning() {
            trace!("session {} discarding late decode ({})", id, record.state);
            return Deliveries::default();
        }
        let Some(raw) = raw else {
            return Deliveries::default();
        };
        record.stats.decodes += 1;

        match validate_with(&raw.payload, self.config.trust) {
            ValidationOutcome::Accepted { payload, symbology } => {
                if self.dedup.should_accept(&payload) {
                    drop(record);
                    info!("session {} accepted {} ({})", id, payload, symbology);
                    self.finish(SessionOutcome::Succeeded { payload, symbology })
                } else {
                    record.stats.duplicates += 1;
                    debug!("session {} ignored {:?}: {}", id, payload, RejectReason::DuplicateOfLast);
                    Deliveries::default()
                }
            }
            ValidationOutcome::Rejected { reason } => {
                let attempts = record.stats.record_rejection();
                debug!(
                    "session {} rejected {:?}: {} ({} invalid so far)",
                    id, raw.payload, reason, attempts
                );
                if attempts > self.config.advisory_threshold && !record.stats.advisory_raised {
                    record.stats.advisory_raised = true;
                    let advisory = Advisory {
                        invalid_attempts: attempts,
                        last_reason: reason,
                    };
                    warn!("session {}: {}", id, advisory.message());
                    Deliveries {
                        advisory: self.advisory.clone().map(|callback| (callback, advisory)),
                        results: Vec::new(),
                    }
                } else {
                    Deliveries::default()
                }
            }
        }
    }

    fn fail(&mut self, error: ScanError) -> Deliveries {
        self.finish(SessionOutcome::Failed { error })
    }

    /// Move the live session to a terminal state, release the camera and
    /// queue the result callback; no-op if already terminal
    fn finish(&mut self, outcome: SessionOutcome) -> Deliveries {
        let mut deliveries = Deliveries::default();
        let Some(live) = self.live.as_mut() else {
            return deliveries;
        };
        {
            let mut record = lock(&live.record);
            if record.state.is_terminal() {
                trace!("session {} already {}; ignoring {:?}", live.id, record.state, outcome);
                return deliveries;
            }
            record.state = match &outcome {
                SessionOutcome::Succeeded { payload, .. } => ScanSessionState::Succeeded(payload.clone()),
                SessionOutcome::Failed { error } => ScanSessionState::Failed(error.clone()),
                SessionOutcome::Cancelled => ScanSessionState::Cancelled,
            };
            info!(
                "session {} {} after {} invalid read(s)",
                live.id, record.state, record.stats.invalid_attempts
            );
        }
        let id = live.id;
        let callback = live.on_result.take();
        self.release_camera(id);
        if let Some(callback) = callback {
            deliveries.results.push((callback, outcome));
        }
        deliveries
    }

    /// Stop the camera unless a frame request or decode holds it; in that
    /// case the controller stops it once the request returns
    fn release_camera(&self, id: SessionId) {
        let released = match self.capture.try_lock() {
            Ok(mut capture) => capture.release(),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().release(),
            Err(TryLockError::WouldBlock) => {
                debug!("session {} camera busy; stopping it after the pending frame", id);
                return;
            }
        };
        if released {
            debug!("session {} released camera", id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::scripted;
    use std::sync::mpsc;

    fn script(items: &[Option<&str>]) -> Vec<Option<String>> {
        items.iter().map(|s| s.map(str::to_string)).collect()
    }

    #[test]
    fn test_first_valid_read_wins() {
        let (camera, decoder, probe) = scripted(script(&[None, Some("bad"), Some("036000291452"), Some("4006381333931")]));
        let mut controller = ScanController::new(camera, decoder);
        let (tx, rx) = mpsc::channel();
        let handle = controller.open(move |outcome| tx.send(outcome).unwrap());

        let state = controller.run();

        assert_eq!(state, Some(ScanSessionState::Succeeded("036000291452".into())));
        assert_eq!(handle.stats().invalid_attempts, 1);
        assert_eq!(probe.stops(), 1);
        assert!(matches!(rx.try_recv(), Ok(SessionOutcome::Succeeded { .. })));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_decoded_nothing_keeps_scanning() {
        let (camera, decoder, _probe) = scripted(script(&[None, None]));
        let mut controller = ScanController::new(camera, decoder);
        let handle = controller.open(|_| {});
        controller.on_decode(None);
        assert_eq!(handle.state(), ScanSessionState::Scanning);
        assert_eq!(handle.stats().decodes, 0);
    }

    #[test]
    fn test_stream_end_fails_session() {
        let (camera, decoder, probe) = scripted(script(&[None, Some("short")]));
        let mut controller = ScanController::new(camera, decoder);
        let handle = controller.open(|_| {});
        controller.run();
        assert_eq!(handle.state(), ScanSessionState::Failed(ScanError::StreamEnded));
        assert_eq!(handle.stats().invalid_attempts, 1);
        assert_eq!(probe.stops(), 1);
    }

    #[test]
    fn test_cancel_before_any_frame() {
        let (camera, decoder, probe) = scripted(script(&[Some("4006381333931")]));
        let mut controller = ScanController::new(camera, decoder);
        let handle = controller.open(|_| {});
        handle.cancel();
        handle.cancel();
        controller.cancel();
        assert_eq!(controller.run(), Some(ScanSessionState::Cancelled));
        assert_eq!(probe.stops(), 1);
        assert_eq!(handle.stats().frames_seen, 0);
    }

    #[test]
    fn test_drop_tears_down() {
        let (camera, decoder, probe) = scripted(script(&[None]));
        let (tx, rx) = mpsc::channel();
        let handle = {
            let mut controller = ScanController::new(camera, decoder);
            controller.open(move |outcome| tx.send(outcome).unwrap())
        };
        assert_eq!(handle.state(), ScanSessionState::Cancelled);
        assert_eq!(rx.try_recv(), Ok(SessionOutcome::Cancelled));
        assert_eq!(probe.stops(), 1);
        // Controller is gone; this must not panic
        handle.cancel();
    }

    #[test]
    fn test_cancel_request_beats_pending_decode() {
        let (camera, decoder, probe) = scripted(script(&[Some("4006381333931")]));
        let mut controller = ScanController::new(camera, decoder);
        let handle = controller.open(|_| {});
        // Flag set, canceller not yet through the core lock
        if let Some(live) = lock(&controller.core).live.as_ref() {
            live.cancel_requested.store(true, Ordering::SeqCst);
        }

        controller.on_decode(Some(RawDecode::new("4006381333931")));

        assert_eq!(handle.state(), ScanSessionState::Cancelled);
        assert_eq!(handle.stats().decodes, 0);
        assert_eq!(probe.stops(), 1);
    }

    #[test]
    fn test_cancel_while_capture_busy_defers_stop() {
        let (camera, decoder, probe) = scripted(script(&[Some("4006381333931")]));
        let mut controller = ScanController::new(camera, decoder);
        let handle = controller.open(|_| {});
        {
            let _busy = lock(&controller.capture);
            handle.cancel();
            assert_eq!(handle.state(), ScanSessionState::Cancelled);
            assert_eq!(probe.stops(), 0);
        }

        assert_eq!(controller.run(), Some(ScanSessionState::Cancelled));
        assert_eq!(probe.stops(), 1);
        assert_eq!(probe.frames_served(), 0);
    }
}
