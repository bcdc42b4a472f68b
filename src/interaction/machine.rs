use eframe::egui::Pos2;
use tracing::debug;

use super::transform::{DataRect, ScreenTransform};
use super::{InputEvent, KeyInput, Mode, Outcome, PointerButton, Surface, ViewportChange};
use crate::data::hotkeys::{Hotkey, HotkeyName, Hotkeys, Modifier};
use crate::data::recording::AnnotationDraft;

/// Description given to annotations created by clicking.
pub const MANUAL_ANNOTATION: &str = "manual_annotation";

/// A primary-button drag in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    start: [f64; 2],
    current: [f64; 2],
}

impl Drag {
    fn rect(&self) -> DataRect {
        DataRect::from_corners(self.start, self.current)
    }
}

/// Per-mode gesture state. Each mode carries only what it can use.
#[derive(Debug, Clone, PartialEq)]
enum ModeState {
    TimeSelect { drag: Option<Drag> },
    ChannelSelect { drag: Option<Drag> },
    Annotate,
}

impl ModeState {
    fn fresh(mode: Mode) -> Self {
        match mode {
            Mode::TimeSelect => ModeState::TimeSelect { drag: None },
            Mode::ChannelSelect => ModeState::ChannelSelect { drag: None },
            Mode::Annotate => ModeState::Annotate,
        }
    }

    fn mode(&self) -> Mode {
        match self {
            ModeState::TimeSelect { .. } => Mode::TimeSelect,
            ModeState::ChannelSelect { .. } => Mode::ChannelSelect,
            ModeState::Annotate => Mode::Annotate,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Pan {
    surface: Surface,
    last: Pos2,
}

/// Selected channels and the rectangle being dragged, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    /// Unique names, in the order they were selected.
    pub selected: Vec<String>,
    /// In-progress rectangle in data space.
    pub rect: Option<DataRect>,
}

impl SelectionState {
    pub fn contains(&self, name: &str) -> bool {
        self.selected.iter().any(|s| s == name)
    }
}

pub struct InteractionMachine {
    state: ModeState,
    selection: SelectionState,
    known: Vec<String>,
    /// Detail rows: channel name and row centre in data y.
    rows: Vec<(String, f64)>,
    overview: Option<ScreenTransform>,
    detail: Option<ScreenTransform>,
    pan: Option<Pan>,
    zoom_step_factor: f64,
    hotkeys: Hotkeys,
}

impl InteractionMachine {
    pub fn new(zoom_step_factor: f64, hotkeys: Hotkeys) -> Self {
        Self {
            state: ModeState::fresh(Mode::TimeSelect),
            selection: SelectionState::default(),
            known: Vec::new(),
            rows: Vec::new(),
            overview: None,
            detail: None,
            pan: None,
            zoom_step_factor,
            hotkeys,
        }
    }

    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn hotkeys(&self) -> &Hotkeys {
        &self.hotkeys
    }

    /// Names selectable at all. The selection is trimmed to this set.
    pub fn set_known_channels(&mut self, names: &[String]) {
        self.known = names.to_vec();
        let known = &self.known;
        self.selection.selected.retain(|s| known.contains(s));
    }

    pub fn set_detail_rows(&mut self, rows: Vec<(String, f64)>) {
        self.rows = rows;
    }

    pub fn set_transform(&mut self, surface: Surface, transform: ScreenTransform) {
        match surface {
            Surface::Overview => self.overview = Some(transform),
            Surface::Detail => self.detail = Some(transform),
        }
    }

    pub fn transform(&self, surface: Surface) -> Option<&ScreenTransform> {
        match surface {
            Surface::Overview => self.overview.as_ref(),
            Surface::Detail => self.detail.as_ref(),
        }
    }

    fn transform_mut(&mut self, surface: Surface) -> Option<&mut ScreenTransform> {
        match surface {
            Surface::Overview => self.overview.as_mut(),
            Surface::Detail => self.detail.as_mut(),
        }
    }

    /// Switch mode. Any gesture in progress is dropped without side effects.
    pub fn set_mode(&mut self, mode: Mode) -> Option<Outcome> {
        if mode == self.mode() {
            return None;
        }
        self.state = ModeState::fresh(mode);
        self.selection.rect = None;
        debug!(%mode, "interaction mode changed");
        Some(Outcome::ModeChanged(mode))
    }

    /// XOR-toggle one channel. Unknown names are ignored.
    pub fn toggle_channel(&mut self, name: &str) -> bool {
        if !self.known.iter().any(|k| k == name) {
            return false;
        }
        if let Some(pos) = self.selection.selected.iter().position(|s| s == name) {
            self.selection.selected.remove(pos);
        } else {
            self.selection.selected.push(name.to_string());
        }
        true
    }

    pub fn clear_selection(&mut self) -> Option<Outcome> {
        let had_rect = self.selection.rect.take().is_some();
        if let ModeState::ChannelSelect { drag } = &mut self.state {
            *drag = None;
        }
        if self.selection.selected.is_empty() {
            return had_rect.then(|| Outcome::SelectionChanged(Vec::new()));
        }
        self.selection.selected.clear();
        Some(Outcome::SelectionChanged(Vec::new()))
    }

    pub fn select_all(&mut self) -> Option<Outcome> {
        if self.selection.selected == self.known {
            return None;
        }
        self.selection.selected = self.known.clone();
        Some(Outcome::SelectionChanged(self.selection.selected.clone()))
    }

    pub fn handle(&mut self, event: InputEvent) -> Vec<Outcome> {
        match event {
            InputEvent::Key { key, modifier } => self.on_key(key, modifier).into_iter().collect(),
            InputEvent::PointerPressed {
                surface,
                button,
                pos,
            } => self.on_press(surface, button, pos).into_iter().collect(),
            InputEvent::PointerMoved { surface, pos } => {
                self.on_move(surface, pos).into_iter().collect()
            }
            InputEvent::PointerReleased {
                surface,
                button,
                pos,
            } => self.on_release(surface, button, pos).into_iter().collect(),
            InputEvent::Scroll {
                surface,
                pos,
                steps,
            } => self.on_scroll(surface, pos, steps).into_iter().collect(),
        }
    }

    fn inside(&self, surface: Surface, pos: Pos2) -> Option<ScreenTransform> {
        self.transform(surface).filter(|t| t.contains(pos)).copied()
    }

    fn on_key(&mut self, key: KeyInput, modifier: Modifier) -> Option<Outcome> {
        let ch = match key {
            KeyInput::Escape => return self.clear_selection(),
            KeyInput::Char(ch) => ch,
        };
        match self.hotkeys.action_for(&Hotkey::new(modifier, ch))? {
            HotkeyName::TimeMode => self.set_mode(Mode::TimeSelect),
            HotkeyName::ChannelMode => self.set_mode(Mode::ChannelSelect),
            HotkeyName::AnnotateMode => self.set_mode(Mode::Annotate),
            HotkeyName::SelectAll => self.select_all(),
            HotkeyName::ResetView => {
                self.pan = None;
                Some(Outcome::ResetView)
            }
        }
    }

    fn on_press(&mut self, surface: Surface, button: PointerButton, pos: Pos2) -> Option<Outcome> {
        let transform = self.inside(surface, pos)?;
        let at = transform.to_data(pos);
        match button {
            PointerButton::Middle => {
                self.pan = Some(Pan { surface, last: pos });
                None
            }
            PointerButton::Secondary => None,
            PointerButton::Primary => match (&mut self.state, surface) {
                (ModeState::TimeSelect { drag }, Surface::Overview) => {
                    *drag = Some(Drag {
                        start: at,
                        current: at,
                    });
                    None
                }
                (ModeState::ChannelSelect { drag }, Surface::Detail) => {
                    let d = Drag {
                        start: at,
                        current: at,
                    };
                    self.selection.rect = Some(d.rect());
                    *drag = Some(d);
                    None
                }
                (ModeState::Annotate, Surface::Detail) => {
                    let channels = if self.selection.selected.is_empty() {
                        None
                    } else {
                        Some(self.selection.selected.clone())
                    };
                    Some(Outcome::AnnotationCreated(AnnotationDraft {
                        onset: at[0],
                        duration: 0.0,
                        description: MANUAL_ANNOTATION.to_string(),
                        channels,
                    }))
                }
                _ => None,
            },
        }
    }

    fn on_move(&mut self, surface: Surface, pos: Pos2) -> Option<Outcome> {
        if let Some(pan) = self.pan.filter(|p| p.surface == surface) {
            let transform = self.transform_mut(surface)?;
            if !transform.contains(pos) {
                return None;
            }
            let [dx, dy] = transform.delta_to_data(pos - pan.last);
            // Content follows the pointer, so bounds move the other way.
            transform.bounds = transform.bounds.translate(-dx, -dy);
            let bounds = transform.bounds;
            self.pan = Some(Pan { surface, last: pos });
            return Some(Outcome::ViewportChanged {
                surface,
                bounds,
                change: ViewportChange::Pan,
            });
        }

        let transform = self.inside(surface, pos)?;
        let at = transform.to_data(pos);
        match (&mut self.state, surface) {
            (ModeState::TimeSelect { drag: Some(d) }, Surface::Overview) => {
                d.current = at;
            }
            (ModeState::ChannelSelect { drag: Some(d) }, Surface::Detail) => {
                d.current = at;
                self.selection.rect = Some(d.rect());
            }
            _ => {}
        }
        None
    }

    fn on_release(
        &mut self,
        surface: Surface,
        button: PointerButton,
        pos: Pos2,
    ) -> Option<Outcome> {
        if button == PointerButton::Middle {
            self.pan = None;
            return None;
        }
        if button != PointerButton::Primary {
            return None;
        }
        let release_at = self.inside(surface, pos).map(|t| t.to_data(pos));
        match (&mut self.state, surface) {
            (ModeState::TimeSelect { drag }, Surface::Overview) => {
                let mut d = drag.take()?;
                if let Some(at) = release_at {
                    d.current = at;
                }
                let start = d.start[0].min(d.current[0]);
                let end = d.start[0].max(d.current[0]);
                (end > start).then_some(Outcome::TimeSelected { start, end })
            }
            (ModeState::ChannelSelect { drag }, Surface::Detail) => {
                let mut d = drag.take()?;
                if let Some(at) = release_at {
                    d.current = at;
                }
                self.selection.rect = None;
                let rect = d.rect();
                let hit: Vec<String> = self
                    .rows
                    .iter()
                    .filter(|(_, y)| rect.contains_y(*y))
                    .map(|(name, _)| name.clone())
                    .collect();
                let mut changed = false;
                for name in &hit {
                    changed |= self.toggle_channel(name);
                }
                changed.then(|| Outcome::SelectionChanged(self.selection.selected.clone()))
            }
            _ => None,
        }
    }

    fn on_scroll(&mut self, surface: Surface, pos: Pos2, steps: f32) -> Option<Outcome> {
        if steps == 0.0 || !steps.is_finite() {
            return None;
        }
        let factor = self.zoom_step_factor;
        let transform = self.transform_mut(surface)?;
        if !transform.contains(pos) {
            return None;
        }
        let center = transform.to_data(pos);
        transform.bounds = transform
            .bounds
            .zoom_around(center, factor.powf(-(steps as f64)));
        Some(Outcome::ViewportChanged {
            surface,
            bounds: transform.bounds,
            change: ViewportChange::Zoom,
        })
    }
}
