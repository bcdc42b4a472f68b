//! Dual-scale view coordinator.
//!
//! [`ViewCoordinator`] owns the time window, the channel index, the filter
//! preview, the overlay index and the interaction machine, and composes
//! them into an overview [`Frame`] (full duration, few channels, reduced
//! amplitude) and a detail [`Frame`] (current window and channels). Every
//! state change is republished through its [`EventController`].
//!
//! All methods run on the owner's thread. The only work that leaves it is
//! filter computation inside [`FilterPreview`].

mod frame;

pub use frame::{ChannelRow, EventMarker, Frame};

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::color_scheme::{channel_role, event_color, ChannelPalette};
use crate::config::ViewerConfig;
use crate::data::channels::ChannelIndex;
use crate::data::filter::{FilterSpec, SignalFilter, SpectralFilter};
use crate::data::overlay::{OverlayEvent, OverlayIndex};
use crate::data::preview::{FilterPreview, Notify, PreviewUpdate};
use crate::data::recording::{ChannelMetadata, ChannelType, DataRegistry, Segment};
use crate::data::scaling::{min_max_decimate, optimal_scale};
use crate::data::time_window::{SampleRange, TimeWindow};
use crate::data::view_state::{ViewInfo, ViewState};
use crate::error::{DataSourceError, ExportError, FilterError};
use crate::events::{
    EventController, EventKind, ExportMeta, FilterMeta, TimeSelectionMeta, ViewerEvent,
    ViewportMeta,
};
use crate::export::{export_frame, ExportFormat};
use crate::interaction::{
    DataRect, InputEvent, InteractionMachine, Mode, Outcome, ScreenTransform, SelectionState, Surface,
    ViewportChange,
};

/// Samples fetched per request while building the overview.
const OVERVIEW_CHUNK_SAMPLES: usize = 1 << 16;

/// Smallest amplitude scale accepted.
pub const MIN_AMPLITUDE: f64 = 1e-9;

pub struct ViewCoordinator {
    registry: Arc<dyn DataRegistry>,
    config: ViewerConfig,
    palette: ChannelPalette,
    metadata: ChannelMetadata,
    time: TimeWindow,
    channels: ChannelIndex,
    preview: FilterPreview,
    overlay: OverlayIndex,
    machine: InteractionMachine,
    events: EventController,
    amplitude: f64,
    filter: Option<FilterSpec>,
    show_events: bool,
    show_bad_channels: bool,
    overview_viewport: Option<DataRect>,
    detail_viewport: Option<DataRect>,
    /// Min/max envelope of every channel over the whole recording, indexed
    /// by channel. Built once per load; a channel change only re-indexes it.
    overview: Vec<Vec<[f64; 2]>>,
    last_frames: Option<(Frame, Frame)>,
}

impl ViewCoordinator {
    /// Build a coordinator with the spectral filter from `config`.
    pub fn new(registry: Arc<dyn DataRegistry>, config: ViewerConfig) -> Result<Self, DataSourceError> {
        let filter = Arc::new(SpectralFilter::new(config.filter_transition_hz));
        Self::with_filter(registry, config, filter)
    }

    /// Build a coordinator with a custom filter implementation.
    pub fn with_filter(
        registry: Arc<dyn DataRegistry>,
        config: ViewerConfig,
        filter: Arc<dyn SignalFilter>,
    ) -> Result<Self, DataSourceError> {
        let metadata = registry.channel_metadata()?;
        let time = TimeWindow::new(
            metadata.sample_rate,
            metadata.total_samples,
            config.default_window_s,
            config.min_window_s,
        );
        let channels = ChannelIndex::new(
            &metadata,
            &config.channel_groups,
            config.default_channel_count,
        );
        let overlay = OverlayIndex::new(load_events(registry.as_ref()), metadata.sample_rate);
        let overview = build_overview(registry.as_ref(), &metadata, config.overview_max_points)?;
        let mut machine = InteractionMachine::new(config.zoom_step_factor, config.hotkeys.clone());
        machine.set_known_channels(&metadata.names);

        let mut coordinator = Self {
            palette: ChannelPalette::from_config(&config.palette),
            registry,
            metadata,
            time,
            channels,
            preview: FilterPreview::new(filter),
            overlay,
            machine,
            events: EventController::new(),
            amplitude: 1.0,
            filter: None,
            show_events: true,
            show_bad_channels: true,
            overview_viewport: None,
            detail_viewport: None,
            overview,
            last_frames: None,
            config,
        };
        info!(
            channels = coordinator.metadata.channel_count(),
            sample_rate = coordinator.metadata.sample_rate,
            duration_s = coordinator.metadata.duration(),
            "recording loaded"
        );
        coordinator.refresh_window()?;
        coordinator.events.emit(ViewerEvent::new(EventKind::DATA_LOADED));
        Ok(coordinator)
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn events(&self) -> &EventController {
        &self.events
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn metadata(&self) -> &ChannelMetadata {
        &self.metadata
    }

    pub fn time_window(&self) -> &TimeWindow {
        &self.time
    }

    pub fn channel_index(&self) -> &ChannelIndex {
        &self.channels
    }

    pub fn preview(&self) -> &FilterPreview {
        &self.preview
    }

    pub fn overlay(&self) -> &OverlayIndex {
        &self.overlay
    }

    pub fn selection(&self) -> &SelectionState {
        self.machine.selection()
    }

    pub fn mode(&self) -> Mode {
        self.machine.mode()
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn filter(&self) -> Option<FilterSpec> {
        self.filter
    }

    pub fn show_events(&self) -> bool {
        self.show_events
    }

    pub fn show_bad_channels(&self) -> bool {
        self.show_bad_channels
    }

    /// Last successfully rendered `(overview, detail)` pair.
    pub fn last_frames(&self) -> Option<&(Frame, Frame)> {
        self.last_frames.as_ref()
    }

    pub fn viewport(&self, surface: Surface) -> Option<DataRect> {
        match surface {
            Surface::Overview => self.overview_viewport,
            Surface::Detail => self.detail_viewport,
        }
    }

    /// Wake-up hook called from filter workers after they deliver a result.
    pub fn set_repaint_notify(&mut self, notify: Option<Notify>) {
        self.preview.set_notify(notify);
    }

    pub fn view_state(&self) -> ViewState {
        ViewState {
            time_offset: self.time.time_offset(),
            window_length: self.time.window_length(),
            channel_group: self.channels.group().to_string(),
            channel_offset: self.channels.offset(),
            channel_count: self.channels.count(),
            amplitude_scale: self.amplitude,
            filter: self.filter,
        }
    }

    pub fn view_info(&self) -> ViewInfo {
        let range = self.time.current_range();
        let channels = self.channels.visible_channel_indices();
        let channel_names = channels
            .iter()
            .filter_map(|&i| self.channels.name(i).map(str::to_string))
            .collect();
        ViewInfo {
            time_range: (self.time.to_seconds(range.start), self.time.to_seconds(range.end)),
            channels,
            channel_names,
            amplitude_scale: self.amplitude,
            filter: self.filter,
            show_events: self.show_events,
            show_bad_channels: self.show_bad_channels,
            selected_channels: self.machine.selection().selected.clone(),
            mode: self.machine.mode().label().to_string(),
        }
    }

    // ── Data flow ───────────────────────────────────────────────────────

    /// Fetch the current window and start a preview for it.
    pub fn refresh_window(&mut self) -> Result<(), DataSourceError> {
        let range = self.time.current_range();
        let slice = self.fetch(range)?;
        let generation = self.preview.request(slice, self.filter);
        debug!(generation, start = range.start, end = range.end, "window refreshed");
        Ok(())
    }

    /// Re-read events after the annotation source changed.
    pub fn refresh_overlay(&mut self) {
        self.overlay.replace(load_events(self.registry.as_ref()));
    }

    /// Apply completed filter jobs. Call once per UI frame.
    pub fn poll(&mut self) -> Vec<PreviewUpdate> {
        let updates = self.preview.poll();
        for update in &updates {
            self.publish_preview_update(update);
        }
        updates
    }

    /// Block up to `timeout` for the next filter job to complete.
    pub fn wait_for_preview(&mut self, timeout: std::time::Duration) -> Option<PreviewUpdate> {
        let update = self.preview.wait(timeout)?;
        self.publish_preview_update(&update);
        Some(update)
    }

    fn publish_preview_update(&self, update: &PreviewUpdate) {
        let (kind, generation, error) = match update {
            PreviewUpdate::Applied(g) => (EventKind::FILTER_APPLIED, *g, None),
            PreviewUpdate::FellBack { generation, error } => {
                (EventKind::FILTER_FAILED, *generation, Some(error.to_string()))
            }
            PreviewUpdate::Stale(_) => return,
        };
        let mut evt = ViewerEvent::new(kind);
        evt.filter = Some(FilterMeta {
            generation,
            spec: self.preview.spec(),
            error,
        });
        self.events.emit(evt);
    }

    /// Frames for the coordinator's own state and selection.
    pub fn render_current(&mut self) -> Result<(Frame, Frame), DataSourceError> {
        let view = self.view_state();
        let selection = self.machine.selection().clone();
        self.render(&view, &selection)
    }

    /// Build `(overview, detail)` frames for `view` and `selection`.
    ///
    /// The detail frame shows the preview slice when it covers the view's
    /// window and `view.filter` is the active filter. A view without a filter
    /// gets the unfiltered slice. Filtered output exists only for the active
    /// filter, so any other spec, or any other window, is drawn from raw
    /// samples. If the active window has no preview yet (its fetch failed
    /// earlier) a new preview is requested here. On a data-source error the
    /// previous frames stay available through [`last_frames`](Self::last_frames).
    pub fn render(
        &mut self,
        view: &ViewState,
        selection: &SelectionState,
    ) -> Result<(Frame, Frame), DataSourceError> {
        let result = self.build_frames(view, selection);
        match result {
            Ok(frames) => {
                let rows = frames
                    .1
                    .rows
                    .iter()
                    .map(|r| (r.name.clone(), r.y_offset))
                    .collect();
                self.machine.set_detail_rows(rows);
                self.last_frames = Some(frames.clone());
                Ok(frames)
            }
            Err(err) => {
                error!(%err, "render failed, keeping last frames");
                let mut evt = ViewerEvent::new(EventKind::DATA_ERROR);
                evt.error = Some(err.to_string());
                self.events.emit(evt);
                Err(err)
            }
        }
    }

    fn build_frames(
        &mut self,
        view: &ViewState,
        selection: &SelectionState,
    ) -> Result<(Frame, Frame), DataSourceError> {
        let mut index = self.channels.clone();
        if index.group() != view.channel_group {
            index.set_group(&view.channel_group);
        }
        index.set_count(view.channel_count);
        index.set_offset(view.channel_offset);

        let mut window = TimeWindow::new(
            self.metadata.sample_rate,
            self.metadata.total_samples,
            view.window_length,
            self.config.min_window_s,
        );
        window.set_time_offset(view.time_offset);
        let range = window.current_range();

        if range == self.time.current_range() {
            self.ensure_preview(range)?;
        }
        let detail_slice = self.detail_slice(view.filter, range)?;
        let scale = view.amplitude_scale.max(MIN_AMPLITUDE);
        let visible = index.visible_channel_indices();
        let detail = self.detail_frame(&detail_slice, &visible, range, scale, selection);

        let overview_channels = index.leading_channels(self.config.overview_channels);
        let overview = self.overview_frame(
            &overview_channels,
            scale * self.config.overview_amplitude_ratio,
            selection,
            (window.to_seconds(range.start), window.to_seconds(range.end)),
        );
        Ok((overview, detail))
    }

    /// Restart the preview when it does not hold the active window.
    fn ensure_preview(&mut self, range: SampleRange) -> Result<(), DataSourceError> {
        if self
            .preview
            .unfiltered()
            .is_some_and(|seg| seg.covers(range.start, range.end))
        {
            return Ok(());
        }
        debug!(start = range.start, end = range.end, "preview missing for window, requesting");
        self.refresh_window()
    }

    fn detail_slice(&self, filter: Option<FilterSpec>, range: SampleRange) -> Result<Segment, DataSourceError> {
        let filter = filter.filter(|s| !s.is_passthrough());
        let cached = if filter == self.preview.spec() {
            self.preview.displayed()
        } else {
            self.preview.unfiltered()
        };
        match cached {
            Some(seg) if seg.covers(range.start, range.end) => Ok(seg.clone()),
            _ => self.fetch(range),
        }
    }

    fn detail_frame(
        &self,
        slice: &Segment,
        visible: &[usize],
        range: SampleRange,
        scale: f64,
        selection: &SelectionState,
    ) -> Frame {
        let spacing = self.config.row_spacing;
        let n = visible.len();
        let rows = visible
            .iter()
            .enumerate()
            .map(|(i, &ch)| {
                let points = slice
                    .channel(ch)
                    .map(|values| {
                        values
                            .iter()
                            .enumerate()
                            .map(|(k, v)| [slice.time_at(k), *v])
                            .collect()
                    })
                    .unwrap_or_default();
                self.make_row(ch, Frame::row_offset(i, n, spacing), points, selection)
            })
            .collect();
        let time_range = (self.time.to_seconds(range.start), self.time.to_seconds(range.end));
        let events = if self.show_events {
            self.markers(time_range)
        } else {
            Vec::new()
        };
        Frame {
            surface: Surface::Detail,
            time_range,
            bounds: self
                .detail_viewport
                .unwrap_or_else(|| Frame::natural_bounds(time_range, n, spacing)),
            rows,
            events,
            scale,
            row_spacing: spacing,
            highlight: None,
        }
    }

    fn overview_frame(
        &self,
        channels: &[usize],
        scale: f64,
        selection: &SelectionState,
        window: (f64, f64),
    ) -> Frame {
        let spacing = self.config.row_spacing;
        let n = channels.len();
        let rows = channels
            .iter()
            .enumerate()
            .map(|(i, &ch)| {
                let points = self.overview.get(ch).cloned().unwrap_or_default();
                self.make_row(ch, Frame::row_offset(i, n, spacing), points, selection)
            })
            .collect();
        let time_range = (0.0, self.metadata.duration());
        let events = if self.show_events {
            self.markers(time_range)
        } else {
            Vec::new()
        };
        Frame {
            surface: Surface::Overview,
            time_range,
            bounds: self
                .overview_viewport
                .unwrap_or_else(|| Frame::natural_bounds(time_range, n, spacing)),
            rows,
            events,
            scale,
            row_spacing: spacing,
            highlight: Some(window),
        }
    }

    fn make_row(
        &self,
        ch: usize,
        y_offset: f64,
        points: Vec<[f64; 2]>,
        selection: &SelectionState,
    ) -> ChannelRow {
        let name = self.channels.name(ch).unwrap_or_default().to_string();
        let nominal = self
            .channels
            .channel_type(ch)
            .unwrap_or(ChannelType::Misc);
        let selected = selection.contains(&name);
        let bad = self.channels.is_bad(&name);
        let role = channel_role(&name, nominal, selected, bad, self.show_bad_channels);
        ChannelRow {
            color: self.palette.color_for(role),
            role,
            name,
            index: ch,
            y_offset,
            bad,
            selected,
            points,
        }
    }

    fn markers(&self, time_range: (f64, f64)) -> Vec<EventMarker> {
        self.overlay
            .events_in_range(time_range.0, time_range.1)
            .iter()
            .map(|e| EventMarker {
                time: self.overlay.time_of(e),
                type_id: e.type_id,
                color: event_color(e.type_id),
            })
            .collect()
    }

    fn fetch(&self, range: SampleRange) -> Result<Segment, DataSourceError> {
        self.registry
            .get_segment(range.start, range.end)
            .inspect_err(|err| error!(%err, start = range.start, end = range.end, "segment fetch failed"))
    }

    // ── View state changes ──────────────────────────────────────────────

    fn emit_view_changed(&self, kinds: EventKind, window: Option<SampleRange>) {
        let mut evt = ViewerEvent::new(kinds | EventKind::VIEW_CHANGED);
        evt.window = window;
        evt.view = Some(self.view_state());
        self.events.emit(evt);
    }

    fn after_window_change(&mut self, changed: Option<SampleRange>) -> Result<(), DataSourceError> {
        let Some(range) = changed else {
            return Ok(());
        };
        self.detail_viewport = None;
        self.emit_view_changed(EventKind::WINDOW_CHANGED, Some(range));
        self.refresh_window()
    }

    pub fn set_time_offset(&mut self, seconds: f64) -> Result<(), DataSourceError> {
        let changed = self.time.set_time_offset(seconds);
        self.after_window_change(changed)
    }

    pub fn set_window_length(&mut self, seconds: f64) -> Result<(), DataSourceError> {
        let changed = self.time.set_window_length(seconds);
        self.after_window_change(changed)
    }

    pub fn set_channel_group(&mut self, name: &str) {
        if self.channels.set_group(name) {
            self.detail_viewport = None;
            self.overview_viewport = None;
            self.emit_view_changed(EventKind::VIEW_CHANGED, None);
        }
    }

    pub fn set_channel_offset(&mut self, index: usize) {
        if self.channels.set_offset(index) {
            self.detail_viewport = None;
            self.emit_view_changed(EventKind::VIEW_CHANGED, None);
        }
    }

    pub fn set_channel_count(&mut self, n: usize) {
        if self.channels.set_count(n) {
            self.detail_viewport = None;
            self.emit_view_changed(EventKind::VIEW_CHANGED, None);
        }
    }

    /// Set the amplitude scale. Non-finite values are ignored; the scale is
    /// kept at or above [`MIN_AMPLITUDE`].
    pub fn set_amplitude(&mut self, scale: f64) {
        if !scale.is_finite() {
            return;
        }
        let scale = scale.max(MIN_AMPLITUDE);
        if scale != self.amplitude {
            self.amplitude = scale;
            self.emit_view_changed(EventKind::VIEW_CHANGED, None);
        }
    }

    /// Fit the amplitude to the visible channels of the displayed slice and
    /// return the new scale.
    pub fn auto_scale(&mut self) -> f64 {
        let visible = self.channels.visible_channel_indices();
        let scale = match self.preview.displayed() {
            Some(seg) => optimal_scale(
                visible.iter().filter_map(|&ch| seg.channel(ch)),
                self.config.row_spacing,
                self.config.auto_scale.target_fill,
                self.config.auto_scale.percentile,
            ),
            None => 1.0,
        };
        info!(scale, "amplitude auto-scaled");
        self.set_amplitude(scale);
        self.amplitude
    }

    /// Replace the filter. `None` (or a spec without cutoffs) shows raw data.
    /// Cutoffs at or above Nyquist are rejected and the previous filter stays.
    pub fn set_filter(&mut self, spec: Option<FilterSpec>) -> Result<(), FilterError> {
        let spec = spec.filter(|s| !s.is_passthrough());
        if let Some(s) = &spec {
            if let Err(err) = s.check_nyquist(self.metadata.sample_rate) {
                warn!(%err, "filter rejected");
                return Err(err);
            }
        }
        if spec == self.filter {
            return Ok(());
        }
        self.filter = spec;
        if let Some(slice) = self.preview.unfiltered().cloned() {
            self.preview.request(slice, self.filter);
        }
        self.emit_view_changed(EventKind::VIEW_CHANGED, None);
        Ok(())
    }

    /// Validate a cutoff pair and apply it.
    pub fn set_filter_band(&mut self, low_hz: Option<f64>, high_hz: Option<f64>) -> Result<(), FilterError> {
        let spec = FilterSpec::new(low_hz, high_hz).inspect_err(|err| warn!(%err, "filter rejected"))?;
        self.set_filter(Some(spec))
    }

    pub fn set_show_events(&mut self, show: bool) {
        if show != self.show_events {
            self.show_events = show;
            self.emit_view_changed(EventKind::VIEW_CHANGED, None);
        }
    }

    pub fn set_show_bad_channels(&mut self, show: bool) {
        if show != self.show_bad_channels {
            self.show_bad_channels = show;
            self.emit_view_changed(EventKind::VIEW_CHANGED, None);
        }
    }

    // ── Interaction ─────────────────────────────────────────────────────

    /// Where a surface was drawn this frame. Must be called before input
    /// for that surface is handled.
    pub fn set_surface_transform(&mut self, surface: Surface, transform: ScreenTransform) {
        self.machine.set_transform(surface, transform);
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if let Some(outcome) = self.machine.set_mode(mode) {
            let _ = self.apply_outcome(outcome);
        }
    }

    pub fn toggle_channel(&mut self, name: &str) {
        if self.machine.toggle_channel(name) {
            let selected = self.machine.selection().selected.clone();
            let _ = self.apply_outcome(Outcome::SelectionChanged(selected));
        }
    }

    pub fn clear_selection(&mut self) {
        if let Some(outcome) = self.machine.clear_selection() {
            let _ = self.apply_outcome(outcome);
        }
    }

    pub fn select_all(&mut self) {
        if let Some(outcome) = self.machine.select_all() {
            let _ = self.apply_outcome(outcome);
        }
    }

    pub fn reset_view(&mut self) {
        let _ = self.apply_outcome(Outcome::ResetView);
    }

    /// Feed one input event through the interaction machine and apply what
    /// it produced.
    pub fn handle_input(&mut self, event: InputEvent) -> Result<Vec<Outcome>, DataSourceError> {
        let outcomes = self.machine.handle(event);
        let mut result = Ok(());
        for outcome in &outcomes {
            if let Err(err) = self.apply_outcome(outcome.clone()) {
                result = Err(err);
            }
        }
        result.map(|()| outcomes)
    }

    fn apply_outcome(&mut self, outcome: Outcome) -> Result<(), DataSourceError> {
        match outcome {
            Outcome::TimeSelected { start, end } => {
                let mut evt = ViewerEvent::new(EventKind::TIME_SELECTION);
                evt.time_selection = Some(TimeSelectionMeta {
                    start_time: start,
                    end_time: end,
                });
                self.events.emit(evt);
                let length = (end - start).min(self.config.max_selection_window_s);
                let changed = self.time.set_window(start, length);
                self.after_window_change(changed)
            }
            Outcome::SelectionChanged(names) => {
                let mut evt = ViewerEvent::new(EventKind::CHANNEL_SELECTION);
                evt.selected_channels = Some(names);
                self.events.emit(evt);
                Ok(())
            }
            Outcome::AnnotationCreated(draft) => {
                match self.registry.append_annotation(&draft) {
                    Ok(()) => {
                        info!(onset = draft.onset, "annotation added");
                        self.refresh_overlay();
                        let mut evt = ViewerEvent::new(EventKind::ANNOTATION_ADDED);
                        evt.annotation = Some(draft);
                        self.events.emit(evt);
                    }
                    Err(err) => warn!(%err, onset = draft.onset, "annotation not stored"),
                }
                Ok(())
            }
            Outcome::ViewportChanged {
                surface,
                bounds,
                change,
            } => {
                match surface {
                    Surface::Overview => self.overview_viewport = Some(bounds),
                    Surface::Detail => self.detail_viewport = Some(bounds),
                }
                let kind = match change {
                    ViewportChange::Zoom => EventKind::ZOOM,
                    ViewportChange::Pan => EventKind::PAN,
                };
                let mut evt = ViewerEvent::new(kind);
                evt.viewport = Some(ViewportMeta {
                    surface,
                    x_range: (bounds.min_x, bounds.max_x),
                    y_range: (bounds.min_y, bounds.max_y),
                });
                self.events.emit(evt);
                Ok(())
            }
            Outcome::ModeChanged(mode) => {
                let mut evt = ViewerEvent::new(EventKind::MODE_CHANGED);
                evt.mode = Some(mode);
                self.events.emit(evt);
                Ok(())
            }
            Outcome::ResetView => {
                self.overview_viewport = None;
                self.detail_viewport = None;
                self.events.emit(ViewerEvent::new(EventKind::RESET_VIEW));
                Ok(())
            }
        }
    }

    // ── Export ──────────────────────────────────────────────────────────

    /// Write the last rendered detail frame to `path`.
    pub fn export_view(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let (_, detail) = self.last_frames.as_ref().ok_or(ExportError::NoFrame)?;
        export_frame(detail, path, format)?;
        info!(path = %path.display(), format = %format, "view exported");
        let mut evt = ViewerEvent::new(EventKind::EXPORT);
        evt.export = Some(ExportMeta {
            format: format.to_string(),
            path: Some(path.display().to_string()),
        });
        self.events.emit(evt);
        Ok(())
    }
}

/// Min/max envelope of every channel, read in chunks.
fn build_overview(
    registry: &dyn DataRegistry,
    metadata: &ChannelMetadata,
    max_points: usize,
) -> Result<Vec<Vec<[f64; 2]>>, DataSourceError> {
    let total = metadata.total_samples;
    let max_points = max_points.max(1);
    let mut points: Vec<Vec<[f64; 2]>> = vec![Vec::new(); metadata.channel_count()];
    let mut start = 0;
    while start < total {
        let end = (start + OVERVIEW_CHUNK_SAMPLES).min(total);
        let seg = registry
            .get_segment(start, end)
            .inspect_err(|err| error!(%err, start, end, "overview fetch failed"))?;
        let bins = (max_points * (end - start)).div_ceil(total).max(1);
        for (ch, out) in points.iter_mut().enumerate() {
            if let Some(values) = seg.channel(ch) {
                out.extend(min_max_decimate(values, start, seg.sample_rate, bins));
            }
        }
        start = end;
    }
    debug!(channels = points.len(), "overview envelope built");
    Ok(points)
}

fn load_events(registry: &dyn DataRegistry) -> Vec<OverlayEvent> {
    registry.events_from_annotations().unwrap_or_else(|err| {
        warn!(%err, "could not read events, overlay left empty");
        Vec::new()
    })
}
