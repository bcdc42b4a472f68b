//! Snapshots of the viewer state handed to external consumers.

use serde::{Deserialize, Serialize};

use crate::data::filter::FilterSpec;

/// Everything that determines what the detail view shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub time_offset: f64,
    pub window_length: f64,
    pub channel_group: String,
    pub channel_offset: usize,
    pub channel_count: usize,
    pub amplitude_scale: f64,
    pub filter: Option<FilterSpec>,
}

/// Summary of the current view for status bars and scripting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewInfo {
    pub time_range: (f64, f64),
    pub channels: Vec<usize>,
    pub channel_names: Vec<String>,
    pub amplitude_scale: f64,
    pub filter: Option<FilterSpec>,
    pub show_events: bool,
    pub show_bad_channels: bool,
    pub selected_channels: Vec<String>,
    pub mode: String,
}

impl ViewInfo {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
