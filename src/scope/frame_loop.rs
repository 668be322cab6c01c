//! Display-frame scheduler

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;

/// Shared flag that stops a running loop before its next frame
#[derive(Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Calls a step once per display frame until cancelled
pub struct FrameLoop {
    interval: Duration,
    cancel: CancelToken,
}

impl FrameLoop {
    pub fn new(frame_rate: u32, cancel: CancelToken) -> Self {
        let interval = Duration::from_secs_f64(1.0 / frame_rate.max(1) as f64);
        Self { interval, cancel }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run until the token is cancelled or a step fails
    ///
    /// A step is never interrupted; cancellation takes effect between frames.
    /// Returns the number of frames run.
    pub fn run<F>(&self, mut step: F) -> Result<u64>
    where
        F: FnMut(u64) -> Result<()>,
    {
        let mut frame = 0;

        while !self.cancel.is_cancelled() {
            let started = Instant::now();
            step(frame)?;
            frame += 1;

            if let Some(remaining) = self.interval.checked_sub(started.elapsed()) {
                thread::sleep(remaining);
            }
        }

        Ok(frame)
    }
}
