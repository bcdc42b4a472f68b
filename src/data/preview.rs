//! Asynchronous filtered preview of the current window.
//!
//! Every [`FilterPreview::request`] bumps a generation counter and hands the
//! slice to a worker thread. Workers only send a [`FilterOutcome`] back; the
//! owner drains them with [`FilterPreview::poll`] on its own thread and only
//! the outcome tagged with the current generation is ever applied. Earlier
//! generations are dropped, whatever order they arrive in.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::data::filter::{FilterSpec, SignalFilter};
use crate::data::recording::Segment;
use crate::error::FilterError;

/// Generation number of a preview request.
pub type JobId = u64;

/// Completion message sent by a filter worker.
#[derive(Debug)]
pub struct FilterOutcome {
    pub generation: JobId,
    pub result: Result<Vec<Vec<f64>>, FilterError>,
}

/// What happened to a completed job.
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewUpdate {
    /// The filtered slice is now displayed.
    Applied(JobId),
    /// The job failed; the unfiltered slice stays displayed.
    FellBack { generation: JobId, error: FilterError },
    /// A newer request superseded this job; nothing changed.
    Stale(JobId),
}

/// Callback invoked from the worker thread after it has sent its outcome.
/// Used to wake the UI; it must not touch viewer state.
pub type Notify = Arc<dyn Fn() + Send + Sync>;

pub struct FilterPreview {
    filter: Arc<dyn SignalFilter>,
    generation: JobId,
    applied_generation: JobId,
    /// Spec the current generation runs with; `None` shows raw data.
    spec: Option<FilterSpec>,
    tx: Sender<FilterOutcome>,
    rx: Receiver<FilterOutcome>,
    unfiltered: Option<Segment>,
    displayed: Option<Segment>,
    notify: Option<Notify>,
}

impl FilterPreview {
    pub fn new(filter: Arc<dyn SignalFilter>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            filter,
            generation: 0,
            applied_generation: 0,
            spec: None,
            tx,
            rx,
            unfiltered: None,
            displayed: None,
            notify: None,
        }
    }

    pub fn set_notify(&mut self, notify: Option<Notify>) {
        self.notify = notify;
    }

    /// Current (latest issued) generation.
    pub fn generation(&self) -> JobId {
        self.generation
    }

    /// Generation whose result is on display.
    pub fn applied_generation(&self) -> JobId {
        self.applied_generation
    }

    /// Filter of the current generation, which is also the filter of any
    /// result [`accept`](Self::accept) applies.
    pub fn spec(&self) -> Option<FilterSpec> {
        self.spec
    }

    pub fn is_pending(&self) -> bool {
        self.applied_generation < self.generation
    }

    /// The slice currently on display: the filtered result of the current
    /// generation once it has arrived, the unfiltered slice until then.
    pub fn displayed(&self) -> Option<&Segment> {
        self.displayed.as_ref()
    }

    /// The last unfiltered slice handed to [`request`](Self::request).
    pub fn unfiltered(&self) -> Option<&Segment> {
        self.unfiltered.as_ref()
    }

    /// Start a new preview for `slice`.
    ///
    /// The display is seeded with the unfiltered slice right away. With no
    /// filter (or a passthrough spec) that seed is the final result and no
    /// worker is started.
    pub fn request(&mut self, slice: Segment, spec: Option<FilterSpec>) -> JobId {
        self.generation += 1;
        let generation = self.generation;
        self.displayed = Some(slice.clone());

        let spec = match spec {
            Some(spec) if !spec.is_passthrough() => spec,
            _ => {
                self.spec = None;
                self.applied_generation = generation;
                self.unfiltered = Some(slice);
                debug!(generation, "preview request without filter applied directly");
                return generation;
            }
        };

        self.spec = Some(spec);
        let filter = Arc::clone(&self.filter);
        let tx = self.tx.clone();
        let notify = self.notify.clone();
        let data = slice.data.clone();
        let sample_rate = slice.sample_rate;
        self.unfiltered = Some(slice);

        let spawned = thread::Builder::new()
            .name(format!("filter-preview-{generation}"))
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    filter.apply(&data, sample_rate, &spec)
                }))
                .unwrap_or(Err(FilterError::WorkerLost));
                let _ = tx.send(FilterOutcome { generation, result });
                if let Some(notify) = notify {
                    notify();
                }
            });
        match spawned {
            Ok(_) => debug!(generation, filter = %spec.label(), "filter job started"),
            Err(err) => {
                warn!(generation, error = %err, "could not start filter worker");
                let _ = self.tx.send(FilterOutcome {
                    generation,
                    result: Err(FilterError::WorkerLost),
                });
            }
        }
        generation
    }

    /// Drain all outcomes that have arrived, in arrival order.
    pub fn poll(&mut self) -> Vec<PreviewUpdate> {
        let mut updates = Vec::new();
        while let Ok(outcome) = self.rx.try_recv() {
            updates.push(self.accept(outcome));
        }
        updates
    }

    /// Block up to `timeout` for the next outcome.
    pub fn wait(&mut self, timeout: Duration) -> Option<PreviewUpdate> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => Some(self.accept(outcome)),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Apply a completed job if, and only if, it is the current generation.
    pub fn accept(&mut self, outcome: FilterOutcome) -> PreviewUpdate {
        let generation = outcome.generation;
        if generation != self.generation || generation <= self.applied_generation {
            debug!(
                generation,
                current = self.generation,
                "discarding stale filter result"
            );
            return PreviewUpdate::Stale(generation);
        }
        self.applied_generation = generation;
        match outcome.result {
            Ok(data) => {
                if let Some(base) = &self.unfiltered {
                    self.displayed = Some(Segment::new(base.start_sample, base.sample_rate, data));
                }
                PreviewUpdate::Applied(generation)
            }
            Err(error) => {
                warn!(generation, %error, "filter failed, showing unfiltered data");
                self.displayed = self.unfiltered.clone();
                PreviewUpdate::FellBack { generation, error }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl SignalFilter for Failing {
        fn apply(&self, _: &[Vec<f64>], _: f64, _: &FilterSpec) -> Result<Vec<Vec<f64>>, FilterError> {
            Err(FilterError::Compute("boom".into()))
        }
    }

    struct Panicking;

    impl SignalFilter for Panicking {
        fn apply(&self, _: &[Vec<f64>], _: f64, _: &FilterSpec) -> Result<Vec<Vec<f64>>, FilterError> {
            panic!("filter exploded")
        }
    }

    fn slice() -> Segment {
        Segment::new(10, 100.0, vec![vec![1.0, 2.0, 3.0]])
    }

    #[test]
    fn failure_falls_back_to_unfiltered() {
        let mut preview = FilterPreview::new(Arc::new(Failing));
        let spec = FilterSpec::band(1.0, 10.0).unwrap();
        let id = preview.request(slice(), Some(spec));
        let update = preview.wait(Duration::from_secs(5)).unwrap();
        assert!(matches!(update, PreviewUpdate::FellBack { generation, .. } if generation == id));
        assert_eq!(preview.displayed(), Some(&slice()));
        assert!(!preview.is_pending());
    }

    #[test]
    fn panicking_worker_reports_lost() {
        let mut preview = FilterPreview::new(Arc::new(Panicking));
        let spec = FilterSpec::band(1.0, 10.0).unwrap();
        preview.request(slice(), Some(spec));
        let update = preview.wait(Duration::from_secs(5)).unwrap();
        assert!(matches!(
            update,
            PreviewUpdate::FellBack { error: FilterError::WorkerLost, .. }
        ));
        assert_eq!(preview.displayed(), Some(&slice()));
    }

    #[test]
    fn no_filter_applies_immediately() {
        let mut preview = FilterPreview::new(Arc::new(Failing));
        let id = preview.request(slice(), None);
        assert_eq!(preview.applied_generation(), id);
        assert_eq!(preview.spec(), None);
        assert!(preview.poll().is_empty());
    }

    #[test]
    fn spec_follows_the_latest_request() {
        let mut preview = FilterPreview::new(Arc::new(Failing));
        let first = FilterSpec::band(1.0, 10.0).unwrap();
        let second = FilterSpec::band(2.0, 20.0).unwrap();
        preview.request(slice(), Some(first));
        assert_eq!(preview.spec(), Some(first));
        preview.request(slice(), Some(second));
        assert_eq!(preview.spec(), Some(second));
        preview.request(slice(), Some(FilterSpec::default()));
        assert_eq!(preview.spec(), None);
    }
}
