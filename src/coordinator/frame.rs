//! Render-ready description of one surface.

use eframe::egui::Color32;

use crate::color_scheme::ChannelRole;
use crate::interaction::{DataRect, Surface};

/// One channel row of a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRow {
    pub name: String,
    /// Index of the channel in the recording.
    pub index: usize,
    /// Row baseline in data y.
    pub y_offset: f64,
    pub role: ChannelRole,
    pub color: Color32,
    pub bad: bool,
    pub selected: bool,
    /// `[time_s, value]` in recording units, unscaled.
    pub points: Vec<[f64; 2]>,
}

impl ChannelRow {
    /// Points as drawn: value scaled and shifted onto the row.
    pub fn plotted(&self, scale: f64) -> Vec<[f64; 2]> {
        self.points
            .iter()
            .map(|[t, v]| [*t, self.y_offset + v * scale])
            .collect()
    }
}

/// A vertical event marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventMarker {
    pub time: f64,
    pub type_id: u32,
    pub color: Color32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub surface: Surface,
    /// Seconds covered by the data in this frame.
    pub time_range: (f64, f64),
    /// Bounds to show: a zoom/pan viewport if one is active, else the
    /// frame's natural bounds.
    pub bounds: DataRect,
    pub rows: Vec<ChannelRow>,
    pub events: Vec<EventMarker>,
    /// Amplitude scale applied to every row.
    pub scale: f64,
    pub row_spacing: f64,
    /// On the overview: the detail window, for highlighting.
    pub highlight: Option<(f64, f64)>,
}

impl Frame {
    /// Natural bounds for `rows` rows over `time_range`: every row fits with
    /// half a spacing of margin.
    pub fn natural_bounds(time_range: (f64, f64), rows: usize, row_spacing: f64) -> DataRect {
        let top = rows.saturating_sub(1) as f64 * row_spacing;
        DataRect::new(
            time_range.0,
            time_range.1,
            -row_spacing / 2.0,
            top + row_spacing / 2.0,
        )
    }

    /// Baseline of row `i` (0 = top) out of `n`.
    pub fn row_offset(i: usize, n: usize, row_spacing: f64) -> f64 {
        (n.saturating_sub(1) - i.min(n.saturating_sub(1))) as f64 * row_spacing
    }

    pub fn row(&self, name: &str) -> Option<&ChannelRow> {
        self.rows.iter().find(|r| r.name == name)
    }
}
