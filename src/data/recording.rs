//! The backing recording as seen by the viewer.
//!
//! [`DataRegistry`] is the boundary to whatever owns the loaded dataset. The
//! engine only reads through it, except for handing over new annotations.
//! [`Recording`] is a simple in-memory implementation used by the demo binary
//! and the tests.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::data::overlay::OverlayEvent;
use crate::error::{DataSourceError, RegistryError};

/// Nominal channel type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChannelType {
    Eeg,
    MegMag,
    MegGrad,
    Eog,
    Ecg,
    Emg,
    Stim,
    Misc,
}

impl ChannelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Eeg => "eeg",
            ChannelType::MegMag => "mag",
            ChannelType::MegGrad => "grad",
            ChannelType::Eog => "eog",
            ChannelType::Ecg => "ecg",
            ChannelType::Emg => "emg",
            ChannelType::Stim => "stim",
            ChannelType::Misc => "misc",
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eeg" => Ok(ChannelType::Eeg),
            "mag" | "meg_mag" => Ok(ChannelType::MegMag),
            "grad" | "meg_grad" => Ok(ChannelType::MegGrad),
            "eog" => Ok(ChannelType::Eog),
            "ecg" => Ok(ChannelType::Ecg),
            "emg" => Ok(ChannelType::Emg),
            "stim" => Ok(ChannelType::Stim),
            "misc" => Ok(ChannelType::Misc),
            other => Err(format!("unknown channel type '{other}'")),
        }
    }
}

/// Static description of a loaded recording.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMetadata {
    pub names: Vec<String>,
    pub types: Vec<ChannelType>,
    pub sample_rate: f64,
    pub total_samples: usize,
    pub bad_channels: BTreeSet<String>,
}

impl ChannelMetadata {
    pub fn channel_count(&self) -> usize {
        self.names.len()
    }

    /// Total duration in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate > 0.0 {
            self.total_samples as f64 / self.sample_rate
        } else {
            0.0
        }
    }
}

/// A per-channel sample matrix extracted for one sample range.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub start_sample: usize,
    pub sample_rate: f64,
    /// One row per channel, all rows the same length.
    pub data: Vec<Vec<f64>>,
}

impl Segment {
    pub fn new(start_sample: usize, sample_rate: f64, data: Vec<Vec<f64>>) -> Self {
        Self {
            start_sample,
            sample_rate,
            data,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.data.len()
    }

    pub fn sample_count(&self) -> usize {
        self.data.first().map_or(0, Vec::len)
    }

    /// Exclusive end sample.
    pub fn end_sample(&self) -> usize {
        self.start_sample + self.sample_count()
    }

    pub fn start_time(&self) -> f64 {
        self.start_sample as f64 / self.sample_rate
    }

    /// Time in seconds of the `i`-th sample of this segment.
    #[inline]
    pub fn time_at(&self, i: usize) -> f64 {
        (self.start_sample + i) as f64 / self.sample_rate
    }

    pub fn channel(&self, index: usize) -> Option<&[f64]> {
        self.data.get(index).map(Vec::as_slice)
    }

    /// Whether this segment covers exactly `start..end`.
    pub fn covers(&self, start: usize, end: usize) -> bool {
        self.start_sample == start && self.end_sample() == end
    }
}

/// A new annotation created by the user, handed to the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDraft {
    pub onset: f64,
    pub duration: f64,
    pub description: String,
    /// `None` means the annotation applies to all channels.
    pub channels: Option<Vec<String>>,
}

/// Boundary to the external owner of the dataset.
///
/// Implementations must tolerate any valid sub-range in
/// [`get_segment`](Self::get_segment) and may be called from worker threads.
pub trait DataRegistry: Send + Sync {
    fn channel_metadata(&self) -> Result<ChannelMetadata, DataSourceError>;

    /// Samples `start..end` of every channel.
    fn get_segment(&self, start: usize, end: usize) -> Result<Segment, DataSourceError>;

    fn append_annotation(&self, draft: &AnnotationDraft) -> Result<(), RegistryError>;

    /// Discrete markers derived from the stored annotations.
    fn events_from_annotations(&self) -> Result<Vec<OverlayEvent>, DataSourceError>;
}

#[derive(Debug, Clone)]
struct StoredAnnotation {
    onset: f64,
    duration: f64,
    description: String,
    channels: Option<Vec<String>>,
}

/// In-memory recording with interior-mutable annotations.
pub struct Recording {
    metadata: ChannelMetadata,
    data: Vec<Vec<f64>>,
    annotations: RwLock<Vec<StoredAnnotation>>,
    loaded: AtomicBool,
}

impl Recording {
    /// Build a recording from channel rows. Rows are truncated to the
    /// shortest one so the matrix stays rectangular.
    pub fn new(
        names: Vec<String>,
        types: Vec<ChannelType>,
        sample_rate: f64,
        mut data: Vec<Vec<f64>>,
    ) -> Self {
        let total_samples = data.iter().map(Vec::len).min().unwrap_or(0);
        for row in &mut data {
            row.truncate(total_samples);
        }
        let mut types = types;
        types.resize(names.len(), ChannelType::Misc);
        Self {
            metadata: ChannelMetadata {
                names,
                types,
                sample_rate,
                total_samples,
                bad_channels: BTreeSet::new(),
            },
            data,
            annotations: RwLock::new(Vec::new()),
            loaded: AtomicBool::new(true),
        }
    }

    pub fn with_bad_channels<I, S>(mut self, bads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata.bad_channels = bads.into_iter().map(Into::into).collect();
        self
    }

    /// Store an annotation directly, bypassing the viewer.
    pub fn add_annotation<S: Into<String>>(&self, onset: f64, duration: f64, description: S) {
        if let Ok(mut list) = self.annotations.write() {
            list.push(StoredAnnotation {
                onset,
                duration,
                description: description.into(),
                channels: None,
            });
        }
    }

    /// Number of stored annotations.
    pub fn annotation_count(&self) -> usize {
        self.annotations.read().map(|l| l.len()).unwrap_or(0)
    }

    /// Descriptions and channel subsets of stored annotations, in insertion order.
    pub fn annotations(&self) -> Vec<(f64, f64, String, Option<Vec<String>>)> {
        self.annotations
            .read()
            .map(|l| {
                l.iter()
                    .map(|a| (a.onset, a.duration, a.description.clone(), a.channels.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Simulate the dataset being removed from the registry.
    pub fn unload(&self) {
        self.loaded.store(false, Ordering::SeqCst);
    }

    pub fn reload(&self) {
        self.loaded.store(true, Ordering::SeqCst);
    }

    fn ensure_loaded(&self) -> Result<(), DataSourceError> {
        if self.loaded.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DataSourceError::NotLoaded)
        }
    }
}

impl DataRegistry for Recording {
    fn channel_metadata(&self) -> Result<ChannelMetadata, DataSourceError> {
        self.ensure_loaded()?;
        Ok(self.metadata.clone())
    }

    fn get_segment(&self, start: usize, end: usize) -> Result<Segment, DataSourceError> {
        self.ensure_loaded()?;
        let total = self.metadata.total_samples;
        if start > end || end > total {
            return Err(DataSourceError::RangeOutOfBounds { start, end, total });
        }
        let rows = self.data.iter().map(|row| row[start..end].to_vec()).collect();
        Ok(Segment::new(start, self.metadata.sample_rate, rows))
    }

    fn append_annotation(&self, draft: &AnnotationDraft) -> Result<(), RegistryError> {
        if !self.loaded.load(Ordering::SeqCst) {
            return Err(RegistryError::NotLoaded);
        }
        if !draft.onset.is_finite() || draft.onset < 0.0 || draft.onset > self.metadata.duration() {
            return Err(RegistryError::Rejected(format!(
                "onset {:.3}s lies outside the recording",
                draft.onset
            )));
        }
        let mut list = self
            .annotations
            .write()
            .map_err(|_| RegistryError::Rejected("annotation store poisoned".to_string()))?;
        list.push(StoredAnnotation {
            onset: draft.onset,
            duration: draft.duration.max(0.0),
            description: draft.description.clone(),
            channels: draft.channels.clone(),
        });
        Ok(())
    }

    /// Event ids are assigned per distinct description in sorted order,
    /// starting at 1.
    fn events_from_annotations(&self) -> Result<Vec<OverlayEvent>, DataSourceError> {
        self.ensure_loaded()?;
        let list = self
            .annotations
            .read()
            .map_err(|_| DataSourceError::Backend("annotation store poisoned".to_string()))?;
        let descriptions: BTreeSet<&str> = list.iter().map(|a| a.description.as_str()).collect();
        let id_of = |desc: &str| {
            descriptions
                .iter()
                .position(|d| *d == desc)
                .map_or(0, |p| p as u32 + 1)
        };
        let sfreq = self.metadata.sample_rate;
        let mut events: Vec<OverlayEvent> = list
            .iter()
            .map(|a| OverlayEvent::new((a.onset * sfreq).round() as usize, id_of(&a.description)))
            .collect();
        events.sort_by_key(|e| e.sample);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Recording {
        Recording::new(
            vec!["Fz".into(), "Cz".into()],
            vec![ChannelType::Eeg, ChannelType::Eeg],
            100.0,
            vec![(0..500).map(f64::from).collect(), vec![1.0; 400]],
        )
    }

    #[test]
    fn rows_are_truncated_to_shortest() {
        let rec = small();
        let meta = rec.channel_metadata().unwrap();
        assert_eq!(meta.total_samples, 400);
        assert!((meta.duration() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn segment_rejects_ranges_past_the_end() {
        let rec = small();
        assert!(rec.get_segment(10, 20).is_ok());
        assert!(matches!(
            rec.get_segment(390, 401),
            Err(DataSourceError::RangeOutOfBounds { .. })
        ));
    }

    #[test]
    fn event_ids_follow_sorted_descriptions() {
        let rec = small();
        rec.add_annotation(2.0, 0.0, "blink");
        rec.add_annotation(1.0, 0.0, "artifact");
        let events = rec.events_from_annotations().unwrap();
        assert_eq!(events[0].sample, 100);
        assert_eq!(events[0].type_id, 1);
        assert_eq!(events[1].sample, 200);
        assert_eq!(events[1].type_id, 2);
    }

    #[test]
    fn unloaded_recording_rejects_everything() {
        let rec = small();
        rec.unload();
        assert!(matches!(rec.get_segment(0, 1), Err(DataSourceError::NotLoaded)));
        let draft = AnnotationDraft {
            onset: 1.0,
            duration: 0.0,
            description: "x".into(),
            channels: None,
        };
        assert!(matches!(rec.append_annotation(&draft), Err(RegistryError::NotLoaded)));
    }
}
