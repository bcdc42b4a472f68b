//! Notifications published by the viewer.
//!
//! Hosts subscribe through [`EventController`]. Each event carries a set of
//! [`EventKind`] flags so one occurrence can match several categories (a
//! window move is also a `VIEW_CHANGED`). An [`EventFilter`] is an OR mask:
//! an event is delivered when `(event.kinds & filter) != 0`.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};

use crate::data::filter::FilterSpec;
use crate::data::recording::AnnotationDraft;
use crate::data::time_window::SampleRange;
use crate::data::view_state::ViewState;
use crate::interaction::{Mode, Surface};

// ─────────────────────────────────────────────────────────────────────────────
// EventKind: bitflags
// ─────────────────────────────────────────────────────────────────────────────

/// Bitflags describing the *categories* an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventKind(pub u64);

impl EventKind {
    // ── Window / view ───────────────────────────────────────────────────
    /// The active sample range moved or changed length.
    pub const WINDOW_CHANGED: Self = Self(1 << 0);
    /// Any part of the view state changed (window, channels, scale, filter).
    pub const VIEW_CHANGED: Self = Self(1 << 1);

    // ── Selection ───────────────────────────────────────────────────────
    /// A time range was dragged on the overview.
    pub const TIME_SELECTION: Self = Self(1 << 2);
    /// The set of selected channels changed.
    pub const CHANNEL_SELECTION: Self = Self(1 << 3);
    /// The interaction mode was switched.
    pub const MODE_CHANGED: Self = Self(1 << 4);

    // ── Annotations ─────────────────────────────────────────────────────
    /// An annotation was handed to the registry.
    pub const ANNOTATION_ADDED: Self = Self(1 << 5);

    // ── Filter preview ──────────────────────────────────────────────────
    /// A filtered preview was applied.
    pub const FILTER_APPLIED: Self = Self(1 << 6);
    /// A filter job failed; unfiltered data is shown.
    pub const FILTER_FAILED: Self = Self(1 << 7);

    // ── Zoom / pan ──────────────────────────────────────────────────────
    pub const ZOOM: Self = Self(1 << 8);
    pub const PAN: Self = Self(1 << 9);
    /// Per-surface zoom/pan was reset.
    pub const RESET_VIEW: Self = Self(1 << 10);

    // ── Data ────────────────────────────────────────────────────────────
    /// A recording was (re)loaded.
    pub const DATA_LOADED: Self = Self(1 << 11);
    /// Reading from the recording failed.
    pub const DATA_ERROR: Self = Self(1 << 12);

    // ── Export ──────────────────────────────────────────────────────────
    pub const EXPORT: Self = Self(1 << 13);

    /// Wildcard: matches *every* event kind.
    pub const ALL: Self = Self(u64::MAX);

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Check whether `self` contains all bits in `other`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check whether `self` intersects with `other` (at least one bit in common).
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for EventKind {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for EventKind {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::ops::BitAnd for EventKind {
    type Output = Self;
    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl std::ops::Not for EventKind {
    type Output = Self;
    #[inline]
    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "EMPTY");
        }
        if *self == EventKind::ALL {
            return write!(f, "ALL");
        }

        let pairs: &[(EventKind, &str)] = &[
            (EventKind::WINDOW_CHANGED, "WINDOW_CHANGED"),
            (EventKind::VIEW_CHANGED, "VIEW_CHANGED"),
            (EventKind::TIME_SELECTION, "TIME_SELECTION"),
            (EventKind::CHANNEL_SELECTION, "CHANNEL_SELECTION"),
            (EventKind::MODE_CHANGED, "MODE_CHANGED"),
            (EventKind::ANNOTATION_ADDED, "ANNOTATION_ADDED"),
            (EventKind::FILTER_APPLIED, "FILTER_APPLIED"),
            (EventKind::FILTER_FAILED, "FILTER_FAILED"),
            (EventKind::ZOOM, "ZOOM"),
            (EventKind::PAN, "PAN"),
            (EventKind::RESET_VIEW, "RESET_VIEW"),
            (EventKind::DATA_LOADED, "DATA_LOADED"),
            (EventKind::DATA_ERROR, "DATA_ERROR"),
            (EventKind::EXPORT, "EXPORT"),
        ];

        let mut names = Vec::new();
        let mut known_bits: u64 = 0;
        for (kind, name) in pairs {
            known_bits |= kind.0;
            if self.contains(*kind) {
                names.push((*name).to_string());
            }
        }
        let extra = self.0 & !known_bits;
        if extra != 0 {
            names.push(format!("0x{:x}", extra));
        }
        write!(f, "{}", names.join("|"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Metadata: per-event-type payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Raw `(start, end)` pair dragged on the overview, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSelectionMeta {
    pub start_time: f64,
    pub end_time: f64,
}

/// New visible data bounds of one surface after zoom or pan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMeta {
    pub surface: Surface,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterMeta {
    pub generation: u64,
    pub spec: Option<FilterSpec>,
    /// Set for `FILTER_FAILED`.
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportMeta {
    /// Format of the export ("png", "svg", "jpeg", "csv").
    pub format: String,
    pub path: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// ViewerEvent: the top-level event type
// ─────────────────────────────────────────────────────────────────────────────

/// A notification emitted by the viewer.
///
/// `kinds` is a bitflag set of [`EventKind`] categories; the `Option` fields
/// carry the payloads relevant to the kinds that are set.
#[derive(Debug, Clone)]
pub struct ViewerEvent {
    pub kinds: EventKind,
    /// Seconds since the controller was created.
    pub timestamp: f64,

    pub window: Option<SampleRange>,
    pub time_selection: Option<TimeSelectionMeta>,
    pub selected_channels: Option<Vec<String>>,
    pub annotation: Option<AnnotationDraft>,
    pub view: Option<ViewState>,
    pub viewport: Option<ViewportMeta>,
    pub mode: Option<Mode>,
    pub filter: Option<FilterMeta>,
    pub export: Option<ExportMeta>,
    pub error: Option<String>,
}

impl ViewerEvent {
    pub fn new(kinds: EventKind) -> Self {
        Self {
            kinds,
            timestamp: 0.0, // set by controller
            window: None,
            time_selection: None,
            selected_channels: None,
            annotation: None,
            view: None,
            viewport: None,
            mode: None,
            filter: None,
            export: None,
            error: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventFilter
// ─────────────────────────────────────────────────────────────────────────────

/// Selects which event categories a subscriber receives.
#[derive(Debug, Clone, Copy)]
pub struct EventFilter {
    pub mask: EventKind,
}

impl EventFilter {
    pub const fn all() -> Self {
        Self {
            mask: EventKind::ALL,
        }
    }

    pub const fn only(mask: EventKind) -> Self {
        Self { mask }
    }

    #[inline]
    pub fn matches(&self, event: &ViewerEvent) -> bool {
        event.kinds.intersects(self.mask)
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::all()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventController
// ─────────────────────────────────────────────────────────────────────────────

struct Subscriber {
    filter: EventFilter,
    sender: Sender<ViewerEvent>,
}

/// Collects and distributes viewer events to subscribers.
///
/// Cloning shares the subscriber list, so a host can keep a handle while the
/// coordinator emits.
#[derive(Clone)]
pub struct EventController {
    inner: Arc<Mutex<EventCtrlInner>>,
}

struct EventCtrlInner {
    subscribers: Vec<Subscriber>,
    start_instant: std::time::Instant,
}

impl EventController {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(EventCtrlInner {
                subscribers: Vec::new(),
                start_instant: std::time::Instant::now(),
            })),
        }
    }

    /// Subscribe to events matching the given filter.
    pub fn subscribe(&self, filter: EventFilter) -> Receiver<ViewerEvent> {
        let (tx, rx) = std::sync::mpsc::channel();
        if let Ok(mut inner) = self.inner.lock() {
            inner.subscribers.push(Subscriber { filter, sender: tx });
        }
        rx
    }

    pub fn subscribe_all(&self) -> Receiver<ViewerEvent> {
        self.subscribe(EventFilter::all())
    }

    /// Deliver `event` to every subscriber whose filter matches.
    /// Subscribers whose receiver was dropped are pruned.
    pub fn emit(&self, mut event: ViewerEvent) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        event.timestamp = inner.start_instant.elapsed().as_secs_f64();
        inner.subscribers.retain(|sub| {
            if sub.filter.matches(&event) {
                sub.sender.send(event.clone()).is_ok()
            } else {
                true
            }
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().map(|i| i.subscribers.len()).unwrap_or(0)
    }
}

impl Default for EventController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_filter_matches() {
        let filter = EventFilter::only(EventKind::TIME_SELECTION | EventKind::CHANNEL_SELECTION);
        assert!(filter.matches(&ViewerEvent::new(EventKind::TIME_SELECTION)));
        assert!(!filter.matches(&ViewerEvent::new(EventKind::ZOOM)));
        assert!(filter.matches(&ViewerEvent::new(
            EventKind::TIME_SELECTION | EventKind::WINDOW_CHANGED
        )));
    }

    #[test]
    fn subscribe_and_emit() {
        let ctrl = EventController::new();
        let rx_all = ctrl.subscribe_all();
        let rx_sel = ctrl.subscribe(EventFilter::only(EventKind::CHANNEL_SELECTION));
        let rx_zoom = ctrl.subscribe(EventFilter::only(EventKind::ZOOM));

        ctrl.emit(ViewerEvent::new(EventKind::CHANNEL_SELECTION));

        assert!(rx_all.try_recv().is_ok());
        assert!(rx_sel.try_recv().is_ok());
        assert!(rx_zoom.try_recv().is_err());
    }

    #[test]
    fn display_joins_names() {
        assert_eq!(format!("{}", EventKind::ZOOM), "ZOOM");
        assert_eq!(format!("{}", EventKind::ZOOM | EventKind::PAN), "ZOOM|PAN");
        assert_eq!(format!("{}", EventKind::ALL), "ALL");
        assert!(format!("{}", EventKind(1 << 63)).starts_with("0x"));
    }

    #[test]
    fn dropped_receiver_is_pruned() {
        let ctrl = EventController::new();
        let rx1 = ctrl.subscribe_all();
        let rx2 = ctrl.subscribe_all();
        drop(rx1);

        ctrl.emit(ViewerEvent::new(EventKind::PAN));
        assert!(rx2.try_recv().is_ok());
        assert_eq!(ctrl.subscriber_count(), 1);
    }

    #[test]
    fn kinds_do_not_overlap() {
        let kinds = [
            EventKind::WINDOW_CHANGED,
            EventKind::VIEW_CHANGED,
            EventKind::TIME_SELECTION,
            EventKind::CHANNEL_SELECTION,
            EventKind::MODE_CHANGED,
            EventKind::ANNOTATION_ADDED,
            EventKind::FILTER_APPLIED,
            EventKind::FILTER_FAILED,
            EventKind::ZOOM,
            EventKind::PAN,
            EventKind::RESET_VIEW,
            EventKind::DATA_LOADED,
            EventKind::DATA_ERROR,
            EventKind::EXPORT,
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert!(!a.intersects(*b), "{a} overlaps {b}");
            }
        }
    }
}
