//! Signal tap on the output bus

use std::sync::{Arc, Mutex};

/// Ring of the most recent output samples
struct TapRing {
    samples: Vec<f32>,
    capacity: usize,
    write_pos: usize,
}

impl TapRing {
    fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity],
            capacity,
            write_pos: 0,
        }
    }

    fn push(&mut self, sample: f32) {
        self.samples[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.capacity;
    }

    /// Sample `age` positions before the newest one
    fn nth_newest(&self, age: usize) -> f32 {
        let idx = (self.write_pos + self.capacity - 1 - age) % self.capacity;
        self.samples[idx]
    }
}

/// Shared read side of the output bus
///
/// The engine pushes every sample it renders; the scope copies the newest
/// window once per display frame. Neither side mutates what the other reads.
#[derive(Clone)]
pub struct SignalTap {
    ring: Arc<Mutex<TapRing>>,
}

impl SignalTap {
    /// Create a tap remembering the last `window` samples (the analysis window)
    pub fn new(window: usize) -> Self {
        Self {
            ring: Arc::new(Mutex::new(TapRing::new(window.max(1)))),
        }
    }

    pub fn window(&self) -> usize {
        self.ring.lock().map(|ring| ring.capacity).unwrap_or(0)
    }

    /// Record a sample; skipped if a reader holds the ring so the audio thread never waits
    pub fn push(&self, sample: f32) {
        if let Ok(mut ring) = self.ring.try_lock() {
            ring.push(sample);
        }
    }

    /// Fill `out` with the newest samples as unsigned bytes, 128 meaning zero
    pub fn copy_time_domain_bytes(&self, out: &mut [u8]) {
        let Ok(ring) = self.ring.lock() else {
            out.fill(128);
            return;
        };
        let count = out.len().min(ring.capacity);
        let (silent, live) = out.split_at_mut(out.len() - count);
        silent.fill(128);
        for (i, byte) in live.iter_mut().enumerate() {
            *byte = sample_to_byte(ring.nth_newest(count - 1 - i));
        }
    }
}

/// Map a sample in -1.0..=1.0 to 0..=255 with 0.0 at 128
pub fn sample_to_byte(sample: f32) -> u8 {
    (128.0 * (1.0 + sample)).floor().clamp(0.0, 255.0) as u8
}
