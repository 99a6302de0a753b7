//! Sliding window over accelerometer samples.
//!
//! Samples are appended one at a time. Once the window holds `size`
//! samples it is full, the caller computes features on it, and then
//! [`SampleWindow::advance`] drops the oldest samples so that the newest
//! `overlap` samples carry over into the next window.

use crate::config::WindowConfig;
use crate::core::sample::Sample;
use std::collections::{vec_deque, VecDeque};

/// A count-based sliding window of samples.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    /// Samples in insertion order, oldest first
    samples: VecDeque<Sample>,
    /// Number of samples in a full window
    size: usize,
    /// Number of samples retained after an advance
    overlap: usize,
}

impl SampleWindow {
    /// Create an empty window with the given parameters.
    ///
    /// The parameters are not validated here; see [`WindowConfig::validate`].
    pub fn new(config: &WindowConfig) -> Self {
        Self {
            samples: VecDeque::with_capacity(config.size),
            size: config.size,
            overlap: config.overlap,
        }
    }

    /// Add a sample to the end of the window.
    ///
    /// Returns `true` when the window is full. The window is not clamped:
    /// appending again without calling [`advance`](Self::advance) keeps
    /// growing it, and every such append reports full.
    pub fn append(&mut self, sample: Sample) -> bool {
        self.samples.push_back(sample);
        self.is_full()
    }

    /// Samples currently held, oldest first.
    pub fn view(&self) -> vec_deque::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// The oldest retained sample.
    pub fn first(&self) -> Option<&Sample> {
        self.samples.front()
    }

    /// Drop the oldest samples until at most `overlap` remain.
    pub fn advance(&mut self) {
        let excess = self.samples.len().saturating_sub(self.overlap);
        self.samples.drain(..excess);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.size
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }
}
