//! Gesture and keyboard handling.
//!
//! Input arrives as toolkit-neutral [`InputEvent`]s in screen pixels. The
//! [`InteractionMachine`] interprets them according to the active [`Mode`]
//! and returns [`Outcome`]s; it never touches the time window or the
//! recording itself.

mod machine;
pub mod transform;

use std::fmt;

use eframe::egui::Pos2;
use serde::{Deserialize, Serialize};

use crate::data::hotkeys::Modifier;
use crate::data::recording::AnnotationDraft;

pub use machine::{InteractionMachine, SelectionState, MANUAL_ANNOTATION};
pub use transform::{DataRect, ScreenTransform};

/// The two plotting surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Surface {
    Overview,
    Detail,
}

/// Interaction mode. `TimeSelect` is the initial mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    TimeSelect,
    ChannelSelect,
    Annotate,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::TimeSelect, Mode::ChannelSelect, Mode::Annotate];

    pub fn label(&self) -> &'static str {
        match self {
            Mode::TimeSelect => "Time",
            Mode::ChannelSelect => "Channel",
            Mode::Annotate => "Annotate",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Escape,
}

/// One unit of user input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerPressed {
        surface: Surface,
        button: PointerButton,
        pos: Pos2,
    },
    PointerMoved {
        surface: Surface,
        pos: Pos2,
    },
    PointerReleased {
        surface: Surface,
        button: PointerButton,
        pos: Pos2,
    },
    /// Wheel input; positive steps zoom in.
    Scroll {
        surface: Surface,
        pos: Pos2,
        steps: f32,
    },
    Key {
        key: KeyInput,
        modifier: Modifier,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportChange {
    Zoom,
    Pan,
}

/// State change requested by a gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Raw dragged pair on the overview, `start < end`.
    TimeSelected { start: f64, end: f64 },
    SelectionChanged(Vec<String>),
    AnnotationCreated(AnnotationDraft),
    ViewportChanged {
        surface: Surface,
        bounds: DataRect,
        change: ViewportChange,
    },
    ModeChanged(Mode),
    ResetView,
}
