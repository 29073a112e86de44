//! Single-slot mailbox between the sensor callback and the finder

use planefind_core::{Error, PointCloud, Result};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Whether a fresh frame is waiting to be consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No frame has arrived since the last request or take
    Waiting,
    /// A frame arrived and has not been consumed yet
    Ready,
}

/// A cloud delivered by the sensor, tagged with its arrival order
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Strictly increasing per synchronizer, starting at 0
    pub sequence: u64,
    pub cloud: PointCloud,
}

#[derive(Debug)]
struct Slot {
    state: SyncState,
    latest: Option<CapturedFrame>,
    next_sequence: u64,
}

/// Holds the latest sensor frame until the finder consumes it
///
/// The sensor side calls [`FrameSynchronizer::push`] from any thread; the
/// finder calls [`FrameSynchronizer::request_frame`] and then
/// [`FrameSynchronizer::wait_for_cloud`]. Only the newest frame is kept and
/// each frame is handed out at most once.
#[derive(Debug)]
pub struct FrameSynchronizer {
    slot: Mutex<Slot>,
    ready: Condvar,
}

impl FrameSynchronizer {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                state: SyncState::Waiting,
                latest: None,
                next_sequence: 0,
            }),
            ready: Condvar::new(),
        }
    }

    // A panic while holding the lock cannot leave the slot half-written.
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> SyncState {
        self.lock().state
    }

    /// Forget any pending frame and wait for a new one
    pub fn request_frame(&self) {
        let mut slot = self.lock();
        slot.state = SyncState::Waiting;
        slot.latest = None;
    }

    /// Sensor callback: store `cloud` as the latest frame
    ///
    /// Overwrites a frame that was not consumed yet. Returns the sequence
    /// number assigned to the frame.
    pub fn push(&self, cloud: PointCloud) -> u64 {
        let mut slot = self.lock();
        let sequence = slot.next_sequence;
        slot.next_sequence += 1;
        slot.latest = Some(CapturedFrame { sequence, cloud });
        slot.state = SyncState::Ready;
        drop(slot);

        self.ready.notify_all();
        sequence
    }

    /// Block until a fresh frame is available or `timeout` elapses
    ///
    /// The returned frame is moved out of the slot, so it is never returned twice.
    pub fn take(&self, timeout: Duration) -> Option<CapturedFrame> {
        let deadline = Instant::now().checked_add(timeout);
        let mut slot = self.lock();

        loop {
            if slot.state == SyncState::Ready {
                slot.state = SyncState::Waiting;
                if let Some(frame) = slot.latest.take() {
                    return Some(frame);
                }
            }

            slot = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return None;
                    }
                    self.ready
                        .wait_timeout(slot, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => self.ready.wait(slot).unwrap_or_else(PoisonError::into_inner),
            };
        }
    }

    /// Like [`FrameSynchronizer::take`], failing with [`Error::NoFrameReceived`] on timeout
    pub fn wait_for_cloud(&self, timeout: Duration) -> Result<CapturedFrame> {
        self.take(timeout).ok_or(Error::NoFrameReceived { timeout })
    }
}

impl Default for FrameSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}
