//! Delay Buffer - "what was this value N seconds ago"
//!
//! Fixed-capacity ring of `(value, dt)` samples, oldest first. A query walks
//! backward from the newest sample summing the `dt` spans until the requested
//! delay is covered. Queries that reach past the buffered span saturate to the
//! oldest sample; nothing here ever fails.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One buffered sample
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
struct Sample {
    value: f32,
    /// Time elapsed between the previous sample and this one (s)
    dt: f32,
}

/// Bounded history of a scalar quantity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DelayBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl DelayBuffer {
    /// Create an empty buffer holding at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, dropping the oldest when full
    pub fn push(&mut self, value: f32, dt: f32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(Sample {
            value,
            dt: dt.max(0.0),
        });
    }

    /// Value as it was `delay` seconds before the newest sample
    ///
    /// Saturates to the oldest sample when `delay` exceeds the buffered span.
    /// An empty buffer answers 0.
    pub fn delayed_value(&self, delay: f32) -> f32 {
        let mut elapsed = 0.0_f32;
        for sample in self.samples.iter().rev() {
            if elapsed >= delay {
                return sample.value;
            }
            elapsed += sample.dt;
        }
        self.samples.front().map_or(0.0, |s| s.value)
    }

    /// Newest value, 0 when empty
    pub fn latest(&self) -> f32 {
        self.samples.back().map_or(0.0, |s| s.value)
    }

    /// Total time covered by the buffered samples (s)
    pub fn span(&self) -> f32 {
        self.samples.iter().skip(1).map(|s| s.dt).sum()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every sample
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
