//! Windowed lookup of discrete event markers.

/// A discrete marker supplied by the event source. Never mutated here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayEvent {
    pub sample: usize,
    pub type_id: u32,
}

impl OverlayEvent {
    pub fn new(sample: usize, type_id: u32) -> Self {
        Self { sample, type_id }
    }
}

/// Events of one recording, sorted by sample, with sample→time conversion
/// at the recording's sample rate.
#[derive(Debug, Clone, Default)]
pub struct OverlayIndex {
    events: Vec<OverlayEvent>,
    sample_rate: f64,
}

impl OverlayIndex {
    pub fn new(mut events: Vec<OverlayEvent>, sample_rate: f64) -> Self {
        // Stable, so events sharing a sample keep their source order.
        events.sort_by_key(|e| e.sample);
        Self {
            events,
            sample_rate,
        }
    }

    /// Replace the event list after the source changed.
    pub fn replace(&mut self, events: Vec<OverlayEvent>) {
        *self = Self::new(events, self.sample_rate);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    #[inline]
    pub fn time_of(&self, event: &OverlayEvent) -> f64 {
        event.sample as f64 / self.sample_rate
    }

    /// Events with `start_time <= t <= end_time`, ascending by time.
    ///
    /// Returns an empty vector for an inverted or non-finite range.
    pub fn events_in_range(&self, start_time: f64, end_time: f64) -> Vec<OverlayEvent> {
        if !(start_time <= end_time) || !(self.sample_rate > 0.0) {
            return Vec::new();
        }
        let lo = self
            .events
            .partition_point(|e| self.time_of(e) < start_time);
        let hi = self
            .events
            .partition_point(|e| self.time_of(e) <= end_time);
        if lo >= hi {
            return Vec::new();
        }
        self.events[lo..hi].to_vec()
    }
}
