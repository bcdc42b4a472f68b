//! Time cursor and window length over a recording of known length.
//!
//! All setters clamp rather than fail: they are driven by sliders and
//! scroll input, where an error would only show up as jank.

use std::sync::mpsc::{Receiver, Sender};

use tracing::debug;

/// Half-open sample range `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleRange {
    pub start: usize,
    pub end: usize,
}

impl SampleRange {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Owns the time offset and window length.
pub struct TimeWindow {
    sample_rate: f64,
    total_samples: usize,
    min_window: f64,
    offset: f64,
    length: f64,
    listeners: Vec<Sender<SampleRange>>,
}

impl TimeWindow {
    pub fn new(sample_rate: f64, total_samples: usize, window_length: f64, min_window: f64) -> Self {
        let mut tw = Self {
            sample_rate,
            total_samples,
            min_window: min_window.max(0.0),
            offset: 0.0,
            length: 0.0,
            listeners: Vec::new(),
        };
        tw.length = tw.clamp_length(window_length);
        tw
    }

    /// Subscribe to window changes. The receiver gets the new sample range
    /// every time it changes.
    pub fn subscribe(&mut self) -> Receiver<SampleRange> {
        let (tx, rx) = std::sync::mpsc::channel();
        self.listeners.push(tx);
        rx
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn total_samples(&self) -> usize {
        self.total_samples
    }

    pub fn total_duration(&self) -> f64 {
        if self.sample_rate > 0.0 {
            self.total_samples as f64 / self.sample_rate
        } else {
            0.0
        }
    }

    pub fn time_offset(&self) -> f64 {
        self.offset
    }

    pub fn window_length(&self) -> f64 {
        self.length
    }

    /// Largest valid time offset for the current window length.
    pub fn max_offset(&self) -> f64 {
        (self.total_duration() - self.length).max(0.0)
    }

    /// Move the window start. Returns the new range when it changed.
    pub fn set_time_offset(&mut self, seconds: f64) -> Option<SampleRange> {
        let before = self.current_range();
        self.offset = self.clamp_offset(seconds);
        self.publish_if_changed(before)
    }

    /// Change the window length, keeping the offset valid.
    pub fn set_window_length(&mut self, seconds: f64) -> Option<SampleRange> {
        let before = self.current_range();
        self.length = self.clamp_length(seconds);
        self.offset = self.clamp_offset(self.offset);
        self.publish_if_changed(before)
    }

    /// Set both at once, emitting a single notification.
    pub fn set_window(&mut self, offset: f64, length: f64) -> Option<SampleRange> {
        let before = self.current_range();
        self.length = self.clamp_length(length);
        self.offset = self.clamp_offset(offset);
        self.publish_if_changed(before)
    }

    /// Sample range of the current window, always within `0..=total_samples`.
    pub fn current_range(&self) -> SampleRange {
        let start = self.to_sample(self.offset);
        let end = self.to_sample(self.offset + self.length).max(start);
        SampleRange { start, end }
    }

    /// Seconds → sample index (floored), clamped to the recording.
    pub fn to_sample(&self, seconds: f64) -> usize {
        if !seconds.is_finite() || seconds <= 0.0 {
            return 0;
        }
        let s = (seconds * self.sample_rate).floor();
        if s >= self.total_samples as f64 {
            self.total_samples
        } else {
            s as usize
        }
    }

    pub fn to_seconds(&self, sample: usize) -> f64 {
        sample as f64 / self.sample_rate
    }

    fn clamp_length(&self, seconds: f64) -> f64 {
        let duration = self.total_duration();
        let lower = self.min_window.min(duration);
        if seconds.is_nan() {
            return lower;
        }
        seconds.clamp(lower, duration)
    }

    fn clamp_offset(&self, seconds: f64) -> f64 {
        if seconds.is_nan() {
            return 0.0;
        }
        seconds.clamp(0.0, self.max_offset())
    }

    fn publish_if_changed(&mut self, before: SampleRange) -> Option<SampleRange> {
        let after = self.current_range();
        if after == before {
            return None;
        }
        debug!(start = after.start, end = after.end, "time window changed");
        self.listeners.retain(|tx| tx.send(after).is_ok());
        Some(after)
    }
}
