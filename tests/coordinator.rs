use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui::{pos2, Pos2, Rect};

use rawscope::color_scheme::{ChannelPalette, ChannelRole};
use rawscope::data::overlay::OverlayEvent;
use rawscope::data::preview::PreviewUpdate;
use rawscope::interaction::{
    DataRect, InputEvent, KeyInput, PointerButton, ScreenTransform, SelectionState,
};
use rawscope::data::hotkeys::Modifier;
use rawscope::{
    AnnotationDraft, ChannelMetadata, ChannelType, DataRegistry, DataSourceError, EventKind,
    FilterError, FilterSpec, Mode, Recording, RegistryError, Segment, SignalFilter, Surface,
    ViewCoordinator, ViewerConfig, ViewerEvent,
};

const NAMES: [&str; 12] = [
    "Fp1", "Fp2", "F3", "F4", "C3", "C4", "P3", "P4", "O1", "O2", "EOG1", "ECG",
];
const SFREQ: f64 = 100.0;

/// 12 channels, 100 s at 100 Hz, every sample ±50.
fn recording() -> Arc<Recording> {
    let n = (100.0 * SFREQ) as usize;
    let names: Vec<String> = NAMES.iter().map(|s| s.to_string()).collect();
    let mut types = vec![ChannelType::Eeg; names.len()];
    types[11] = ChannelType::Ecg;
    let data = (0..names.len())
        .map(|_| (0..n).map(|k| if k % 2 == 0 { 50.0 } else { -50.0 }).collect())
        .collect();
    Arc::new(Recording::new(names, types, SFREQ, data).with_bad_channels(["Fp2"]))
}

fn coordinator(rec: &Arc<Recording>) -> ViewCoordinator {
    ViewCoordinator::new(rec.clone(), ViewerConfig::default()).unwrap()
}

fn kinds(rx: &Receiver<ViewerEvent>) -> Vec<EventKind> {
    rx.try_iter().map(|e| e.kinds).collect()
}

fn overview_transform() -> ScreenTransform {
    ScreenTransform::new(
        Rect::from_min_max(pos2(0.0, 0.0), pos2(1024.0, 128.0)),
        DataRect::new(0.0, 100.0, -0.5, 9.5),
    )
}

fn detail_transform() -> ScreenTransform {
    ScreenTransform::new(
        Rect::from_min_max(pos2(0.0, 256.0), pos2(1024.0, 512.0)),
        DataRect::new(0.0, 10.0, -0.5, 11.5),
    )
}

fn primary_drag(c: &mut ViewCoordinator, surface: Surface, from: Pos2, to: Pos2) {
    c.handle_input(InputEvent::PointerPressed {
        surface,
        button: PointerButton::Primary,
        pos: from,
    })
    .unwrap();
    c.handle_input(InputEvent::PointerMoved { surface, pos: to })
        .unwrap();
    c.handle_input(InputEvent::PointerReleased {
        surface,
        button: PointerButton::Primary,
        pos: to,
    })
    .unwrap();
}

#[test]
fn auto_scale_fills_row_spacing() {
    let rec = recording();
    let mut c = coordinator(&rec);
    let scale = c.auto_scale();
    assert!((scale - 0.016).abs() < 1e-12, "scale {scale}");

    let (overview, detail) = c.render_current().unwrap();
    assert!((detail.scale - 0.016).abs() < 1e-12);
    assert!((overview.scale - 0.008).abs() < 1e-12);
}

#[test]
fn frames_stack_rows_top_first() {
    let rec = recording();
    let mut c = coordinator(&rec);
    let (overview, detail) = c.render_current().unwrap();

    assert_eq!(detail.surface, Surface::Detail);
    assert_eq!(detail.time_range, (0.0, 10.0));
    assert_eq!(detail.rows.len(), 12);
    assert_eq!(detail.rows[0].name, "Fp1");
    assert_eq!(detail.rows[0].y_offset, 11.0);
    assert_eq!(detail.rows[11].y_offset, 0.0);
    assert_eq!(detail.rows[0].points.len(), 1000);
    assert_eq!(detail.bounds, DataRect::new(0.0, 10.0, -0.5, 11.5));

    assert_eq!(overview.surface, Surface::Overview);
    assert_eq!(overview.time_range, (0.0, 100.0));
    assert_eq!(overview.rows.len(), 10);
    assert_eq!(overview.highlight, Some((0.0, 10.0)));
    assert!(overview.rows[0].points.len() <= 2 * 2000);
}

#[test]
fn channel_window_clamps_through_coordinator() {
    let names: Vec<String> = (0..64).map(|i| format!("E{i}")).collect();
    let data = vec![vec![0.0; 500]; 64];
    let rec = Arc::new(Recording::new(names, vec![], 250.0, data));
    let mut c = ViewCoordinator::new(rec, ViewerConfig::default()).unwrap();

    c.set_channel_offset(50);
    assert_eq!(c.channel_index().offset(), 44);
    c.set_channel_count(30);
    assert_eq!(c.channel_index().offset(), 34);
    assert_eq!(c.view_info().channels, (34..64).collect::<Vec<_>>());
}

#[test]
fn window_moves_are_published_once() {
    let rec = recording();
    let mut c = coordinator(&rec);
    let rx = c.events().subscribe_all();

    c.set_time_offset(95.0).unwrap();
    assert_eq!(c.time_window().time_offset(), 90.0);
    c.set_time_offset(90.0).unwrap();

    let events: Vec<ViewerEvent> = rx.try_iter().collect();
    assert_eq!(events.len(), 1);
    assert!(events[0].kinds.contains(EventKind::WINDOW_CHANGED | EventKind::VIEW_CHANGED));
    let window = events[0].window.unwrap();
    assert_eq!((window.start, window.end), (9_000, 10_000));
}

#[test]
fn data_error_keeps_last_frames() {
    let rec = recording();
    let mut c = coordinator(&rec);
    let before = c.render_current().unwrap();
    let rx = c.events().subscribe_all();

    rec.unload();
    assert!(matches!(
        c.set_time_offset(20.0),
        Err(DataSourceError::NotLoaded)
    ));
    assert!(matches!(c.render_current(), Err(DataSourceError::NotLoaded)));
    assert_eq!(c.last_frames(), Some(&before));
    assert!(kinds(&rx).iter().any(|k| k.contains(EventKind::DATA_ERROR)));

    rec.reload();
    c.refresh_window().unwrap();
    let (_, detail) = c.render_current().unwrap();
    assert_eq!(detail.time_range, (20.0, 30.0));
}

fn peak(frame: &rawscope::Frame) -> f64 {
    frame.rows[0]
        .points
        .iter()
        .map(|p| p[1].abs())
        .fold(0.0, f64::max)
}

#[test]
fn filter_resumes_after_data_source_recovers() {
    let rec = recording();
    let mut c = coordinator(&rec);
    let spec = FilterSpec::band(1.0, 20.0).unwrap();
    c.set_filter(Some(spec)).unwrap();
    assert!(matches!(
        c.wait_for_preview(Duration::from_secs(5)),
        Some(PreviewUpdate::Applied(_))
    ));
    let generation = c.preview().generation();

    rec.unload();
    assert!(c.set_time_offset(20.0).is_err());
    rec.reload();

    // Rendering the moved window restarts the preview on its own.
    let (_, detail) = c.render_current().unwrap();
    assert_eq!(detail.time_range, (20.0, 30.0));
    assert!(c.preview().generation() > generation);

    let rx = c.events().subscribe_all();
    assert!(matches!(
        c.wait_for_preview(Duration::from_secs(5)),
        Some(PreviewUpdate::Applied(_))
    ));
    let applied: Vec<ViewerEvent> = rx
        .try_iter()
        .filter(|e| e.kinds.contains(EventKind::FILTER_APPLIED))
        .collect();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].filter.as_ref().unwrap().spec, Some(spec));

    let (_, detail) = c.render_current().unwrap();
    assert!(peak(&detail) < 1.0, "peak {}", peak(&detail));
}

#[test]
fn explicit_view_without_filter_shows_raw_samples() {
    let rec = recording();
    let mut c = coordinator(&rec);
    c.set_filter_band(Some(1.0), Some(20.0)).unwrap();
    c.wait_for_preview(Duration::from_secs(5));

    let mut view = c.view_state();
    view.filter = None;
    let (_, raw) = c.render(&view, &SelectionState::default()).unwrap();
    assert_eq!(peak(&raw), 50.0);

    let (_, filtered) = c.render_current().unwrap();
    assert!(peak(&filtered) < 1.0);
}

/// Registry wrapper counting how many samples were read.
struct Counting {
    inner: Arc<Recording>,
    samples: AtomicUsize,
}

impl DataRegistry for Counting {
    fn channel_metadata(&self) -> Result<ChannelMetadata, DataSourceError> {
        self.inner.channel_metadata()
    }

    fn get_segment(&self, start: usize, end: usize) -> Result<Segment, DataSourceError> {
        self.samples.fetch_add(end.saturating_sub(start), Ordering::SeqCst);
        self.inner.get_segment(start, end)
    }

    fn append_annotation(&self, draft: &AnnotationDraft) -> Result<(), RegistryError> {
        self.inner.append_annotation(draft)
    }

    fn events_from_annotations(&self) -> Result<Vec<OverlayEvent>, DataSourceError> {
        self.inner.events_from_annotations()
    }
}

#[test]
fn group_switch_does_not_reread_the_recording() {
    let n = 50_000;
    let names: Vec<String> = (1..=12)
        .map(|i| format!("F{i}"))
        .chain((1..=12).map(|i| format!("C{i}")))
        .collect();
    let data = (0..names.len())
        .map(|ch| (0..n).map(|k| ((k + ch) % 7) as f64).collect())
        .collect();
    let rec = Arc::new(Recording::new(
        names.clone(),
        vec![ChannelType::Eeg; names.len()],
        SFREQ,
        data,
    ));
    let registry = Arc::new(Counting {
        inner: rec,
        samples: AtomicUsize::new(0),
    });
    let mut c = ViewCoordinator::new(registry.clone(), ViewerConfig::default()).unwrap();
    c.render_current().unwrap();

    registry.samples.store(0, Ordering::SeqCst);
    c.set_channel_group("C");
    let (overview, _) = c.render_current().unwrap();
    assert_eq!(registry.samples.load(Ordering::SeqCst), 0);
    assert_eq!(overview.rows[0].name, "C1");
    assert!(!overview.rows[0].points.is_empty());
    assert!(overview.rows[0].points.len() <= 2 * c.config().overview_max_points + 2);
}

#[test]
fn colour_precedence_is_selected_then_bad_then_type() {
    let rec = recording();
    let mut c = coordinator(&rec);
    let palette = ChannelPalette::default();

    c.toggle_channel("Fp2");
    let (_, detail) = c.render_current().unwrap();
    let fp2 = detail.row("Fp2").unwrap();
    assert_eq!(fp2.role, ChannelRole::Selected);
    assert_eq!(fp2.color, palette.selected);
    assert!(fp2.bad && fp2.selected);

    c.toggle_channel("Fp2");
    let (_, detail) = c.render_current().unwrap();
    assert_eq!(detail.row("Fp2").unwrap().role, ChannelRole::Bad);
    assert_eq!(detail.row("Fp2").unwrap().color, palette.bad);

    c.set_show_bad_channels(false);
    let (_, detail) = c.render_current().unwrap();
    assert_eq!(
        detail.row("Fp2").unwrap().role,
        ChannelRole::Typed(ChannelType::Eeg)
    );
    // Name token beats the nominal type.
    assert_eq!(detail.row("EOG1").unwrap().color, palette.eog);
    assert_eq!(detail.row("ECG").unwrap().color, palette.ecg);
}

#[test]
fn overview_drag_selects_capped_window() {
    let rec = recording();
    let mut c = coordinator(&rec);
    c.set_surface_transform(Surface::Overview, overview_transform());
    let rx = c.events().subscribe_all();

    primary_drag(&mut c, Surface::Overview, pos2(128.0, 64.0), pos2(896.0, 64.0));

    let events: Vec<ViewerEvent> = rx.try_iter().collect();
    let selection = events
        .iter()
        .find_map(|e| e.time_selection)
        .expect("time selection event");
    assert_eq!((selection.start_time, selection.end_time), (12.5, 87.5));
    assert!(events
        .iter()
        .any(|e| e.kinds.contains(EventKind::WINDOW_CHANGED)));
    assert_eq!(c.time_window().window_length(), 60.0);
    assert_eq!(c.time_window().time_offset(), 12.5);
}

#[test]
fn annotate_click_reaches_registry_and_overlay() {
    let rec = recording();
    let mut c = coordinator(&rec);
    c.set_surface_transform(Surface::Detail, detail_transform());
    c.set_mode(Mode::Annotate);
    let rx = c.events().subscribe_all();

    c.handle_input(InputEvent::PointerPressed {
        surface: Surface::Detail,
        button: PointerButton::Primary,
        pos: pos2(256.0, 300.0),
    })
    .unwrap();

    assert_eq!(rec.annotation_count(), 1);
    assert_eq!(rec.annotations()[0].0, 2.5);
    assert_eq!(c.overlay().len(), 1);
    let added: Vec<ViewerEvent> = rx
        .try_iter()
        .filter(|e| e.kinds.contains(EventKind::ANNOTATION_ADDED))
        .collect();
    assert_eq!(added.len(), 1);

    let (_, detail) = c.render_current().unwrap();
    assert_eq!(detail.events.len(), 1);
    assert_eq!(detail.events[0].time, 2.5);
}

#[test]
fn rejected_annotation_is_not_fatal() {
    let rec = recording();
    let mut c = coordinator(&rec);
    c.set_surface_transform(Surface::Detail, detail_transform());
    c.set_mode(Mode::Annotate);
    rec.unload();
    let outcomes = c
        .handle_input(InputEvent::PointerPressed {
            surface: Surface::Detail,
            button: PointerButton::Primary,
            pos: pos2(256.0, 300.0),
        })
        .unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(rec.annotation_count(), 0);
}

#[test]
fn zoom_then_reset_view() {
    let rec = recording();
    let mut c = coordinator(&rec);
    c.set_surface_transform(Surface::Detail, detail_transform());
    c.handle_input(InputEvent::Scroll {
        surface: Surface::Detail,
        pos: pos2(512.0, 384.0),
        steps: 2.0,
    })
    .unwrap();
    let zoomed = c.viewport(Surface::Detail).unwrap();
    assert!(zoomed.width() < 10.0);
    let (_, detail) = c.render_current().unwrap();
    assert_eq!(detail.bounds, zoomed);

    c.handle_input(InputEvent::Key {
        key: KeyInput::Char('r'),
        modifier: Modifier::None,
    })
    .unwrap();
    assert_eq!(c.viewport(Surface::Detail), None);
}

#[test]
fn moving_the_window_drops_detail_zoom() {
    let rec = recording();
    let mut c = coordinator(&rec);
    c.set_surface_transform(Surface::Detail, detail_transform());
    c.handle_input(InputEvent::Scroll {
        surface: Surface::Detail,
        pos: pos2(512.0, 384.0),
        steps: 1.0,
    })
    .unwrap();
    c.set_time_offset(30.0).unwrap();
    assert_eq!(c.viewport(Surface::Detail), None);
}

#[test]
fn filter_applies_and_reverts() {
    let rec = recording();
    let mut c = coordinator(&rec);
    let rx = c.events().subscribe_all();

    c.set_filter_band(Some(1.0), Some(20.0)).unwrap();
    let update = c.wait_for_preview(Duration::from_secs(5));
    assert!(matches!(update, Some(PreviewUpdate::Applied(_))));
    assert!(kinds(&rx).iter().any(|k| k.contains(EventKind::FILTER_APPLIED)));

    // A 50 Hz square-ish signal is removed by a 1-20 Hz band.
    let (_, detail) = c.render_current().unwrap();
    let peak = detail.rows[0]
        .points
        .iter()
        .map(|p| p[1].abs())
        .fold(0.0, f64::max);
    assert!(peak < 1.0, "peak {peak}");

    c.set_filter(None).unwrap();
    assert_eq!(c.filter(), None);
    let (_, detail) = c.render_current().unwrap();
    assert_eq!(detail.rows[0].points[0][1], 50.0);
}

#[test]
fn invalid_filter_keeps_previous_spec() {
    let rec = recording();
    let mut c = coordinator(&rec);
    c.set_filter_band(Some(1.0), Some(20.0)).unwrap();
    let active = c.filter();

    assert!(matches!(
        c.set_filter_band(Some(30.0), Some(5.0)),
        Err(FilterError::InvalidBand { .. })
    ));
    assert!(matches!(
        c.set_filter_band(None, Some(50.0)),
        Err(FilterError::AboveNyquist { .. })
    ));
    assert_eq!(c.filter(), active);
}

struct Broken;

impl SignalFilter for Broken {
    fn apply(&self, _: &[Vec<f64>], _: f64, _: &FilterSpec) -> Result<Vec<Vec<f64>>, FilterError> {
        Err(FilterError::Compute("singular".into()))
    }
}

#[test]
fn failed_filter_shows_unfiltered_data() {
    let rec = recording();
    let mut c =
        ViewCoordinator::with_filter(rec.clone(), ViewerConfig::default(), Arc::new(Broken))
            .unwrap();
    let rx = c.events().subscribe_all();

    c.set_filter_band(Some(1.0), Some(20.0)).unwrap();
    let update = c.wait_for_preview(Duration::from_secs(5));
    assert!(matches!(update, Some(PreviewUpdate::FellBack { .. })));

    let failed: Vec<ViewerEvent> = rx
        .try_iter()
        .filter(|e| e.kinds.contains(EventKind::FILTER_FAILED))
        .collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].filter.as_ref().unwrap().error.is_some());

    let (_, detail) = c.render_current().unwrap();
    assert_eq!(detail.rows[0].points[0][1], 50.0);
}

#[test]
fn render_accepts_an_explicit_view() {
    let rec = recording();
    let mut c = coordinator(&rec);
    let mut view = c.view_state();
    view.time_offset = 40.0;
    view.window_length = 5.0;
    view.channel_count = 3;
    let mut selection = SelectionState::default();
    selection.selected.push("F3".to_string());

    let (_, detail) = c.render(&view, &selection).unwrap();
    assert_eq!(detail.time_range, (40.0, 45.0));
    assert_eq!(detail.rows.len(), 3);
    assert!(detail.row("F3").unwrap().selected);
    // Own state is untouched.
    assert_eq!(c.time_window().time_offset(), 0.0);
}

#[test]
fn amplitude_rejects_nonsense() {
    let rec = recording();
    let mut c = coordinator(&rec);
    c.set_amplitude(f64::NAN);
    assert_eq!(c.amplitude(), 1.0);
    c.set_amplitude(-3.0);
    assert_eq!(c.amplitude(), rawscope::coordinator::MIN_AMPLITUDE);
}

#[test]
fn view_info_serialises() {
    let rec = recording();
    let mut c = coordinator(&rec);
    c.toggle_channel("C3");
    let json = c.view_info().to_json().unwrap();
    assert!(json.contains("\"time_range\""));
    assert!(json.contains("\"C3\""));
    assert!(json.contains("\"Time\""));
}
