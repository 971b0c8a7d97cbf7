//! Scan session controller
//!
//! Owns the lifecycle of one scanning attempt:
//! - `Initializing`: enumerate devices, pick one, initialise the decoder,
//!   start the camera
//! - `Scanning`: each frame is decoded, validated and de-duplicated;
//!   invalid reads are counted and never end the session
//! - `Succeeded` / `Failed` / `Cancelled`: terminal, camera released, the
//!   result callback runs once
//!
//! The controller spawns no threads. Frames are either pushed in by the
//! caller (`on_frame`, `on_decode`) or pulled from the camera by `run`.

/// Camera and decoder capabilities consumed by the controller
pub mod capability;
/// The session state machine
pub mod controller;
/// Caller-side handle to an open session
pub mod handle;

pub use capability::{Camera, Decoder, select_device};
pub use controller::ScanController;
pub use handle::{SessionHandle, SessionId};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock, recovering the guard from a poisoned mutex
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
