#![allow(clippy::match_same_arms)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Types
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modifier {
    None,
    Ctrl,
    Alt,
    Shift,
    CtrlAlt,
    CtrlShift,
    AltShift,
    CtrlAltShift,
}

impl Modifier {
    pub fn from_flags(ctrl: bool, alt: bool, shift: bool) -> Self {
        match (ctrl, alt, shift) {
            (false, false, false) => Modifier::None,
            (true, false, false) => Modifier::Ctrl,
            (false, true, false) => Modifier::Alt,
            (false, false, true) => Modifier::Shift,
            (true, true, false) => Modifier::CtrlAlt,
            (true, false, true) => Modifier::CtrlShift,
            (false, true, true) => Modifier::AltShift,
            (true, true, true) => Modifier::CtrlAltShift,
        }
    }

    pub fn has_ctrl(self) -> bool {
        matches!(
            self,
            Modifier::Ctrl | Modifier::CtrlAlt | Modifier::CtrlShift | Modifier::CtrlAltShift
        )
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Modifier::None => "",
            Modifier::Ctrl => "Ctrl",
            Modifier::Alt => "Alt",
            Modifier::Shift => "Shift",
            Modifier::CtrlAlt => "Ctrl+Alt",
            Modifier::CtrlShift => "Ctrl+Shift",
            Modifier::AltShift => "Alt+Shift",
            Modifier::CtrlAltShift => "Ctrl+Alt+Shift",
        };
        write!(f, "{}", s)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hotkey {
    pub modifier: Modifier,
    pub key: char,
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self.key {
            ' ' => "Space".to_string(),
            other => other.to_string(),
        };

        if self.modifier == Modifier::None {
            write!(f, "{}", key)
        } else {
            write!(f, "{}+{}", self.modifier, key)
        }
    }
}

impl FromStr for Hotkey {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty hotkey".to_string());
        }
        let parts: Vec<&str> = s.split('+').map(|p| p.trim()).collect();
        let (last, mods) = match parts.split_last() {
            Some((last, mods)) => (*last, mods),
            None => return Err("invalid hotkey".to_string()),
        };
        let ch = match last.to_lowercase().as_str() {
            "space" => ' ',
            _ => last
                .chars()
                .next()
                .ok_or_else(|| "no key char".to_string())?
                .to_ascii_uppercase(),
        };
        let mut ctrl = false;
        let mut alt = false;
        let mut shift = false;
        for m in mods {
            let flag = match m.to_lowercase().as_str() {
                "ctrl" | "control" | "cmd" => &mut ctrl,
                "alt" => &mut alt,
                "shift" => &mut shift,
                other => return Err(format!("unknown modifier '{}'", other)),
            };
            if *flag {
                return Err(format!("duplicate modifier in '{}'", s));
            }
            *flag = true;
        }
        Ok(Hotkey {
            modifier: Modifier::from_flags(ctrl, alt, shift),
            key: ch,
        })
    }
}

impl Hotkey {
    pub fn new(modifier: Modifier, key: char) -> Self {
        Self {
            modifier,
            key: key.to_ascii_uppercase(),
        }
    }

    /// Same key and modifiers, ignoring letter case.
    pub fn matches(&self, other: &Hotkey) -> bool {
        self.modifier == other.modifier
            && self.key.to_ascii_uppercase() == other.key.to_ascii_uppercase()
    }
}

/// Rebindable shortcuts of the viewer. `Escape` (clear selection) is fixed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hotkeys {
    pub time_mode: Option<Hotkey>,
    pub channel_mode: Option<Hotkey>,
    pub annotate_mode: Option<Hotkey>,
    pub reset_view: Option<Hotkey>,
    pub select_all: Option<Hotkey>,
}

impl Default for Hotkeys {
    fn default() -> Self {
        Self {
            time_mode: Some(Hotkey::new(Modifier::None, 'T')),
            channel_mode: Some(Hotkey::new(Modifier::None, 'C')),
            annotate_mode: Some(Hotkey::new(Modifier::None, 'A')),
            reset_view: Some(Hotkey::new(Modifier::None, 'R')),
            select_all: Some(Hotkey::new(Modifier::Ctrl, 'A')),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HotkeyName {
    TimeMode,
    ChannelMode,
    AnnotateMode,
    ResetView,
    SelectAll,
}

impl Hotkeys {
    pub fn reset_defaults(&mut self) {
        *self = Hotkeys::default();
    }

    fn bindings(&self) -> [(Option<&Hotkey>, HotkeyName); 5] {
        [
            (self.select_all.as_ref(), HotkeyName::SelectAll),
            (self.time_mode.as_ref(), HotkeyName::TimeMode),
            (self.channel_mode.as_ref(), HotkeyName::ChannelMode),
            (self.annotate_mode.as_ref(), HotkeyName::AnnotateMode),
            (self.reset_view.as_ref(), HotkeyName::ResetView),
        ]
    }

    /// The action bound to `pressed`, if any.
    pub fn action_for(&self, pressed: &Hotkey) -> Option<HotkeyName> {
        self.bindings()
            .into_iter()
            .find(|(hk, _)| hk.is_some_and(|hk| hk.matches(pressed)))
            .map(|(_, name)| name)
    }

    /// First pair of actions sharing the same binding.
    pub fn find_conflict(&self) -> Option<(HotkeyName, HotkeyName)> {
        let bound: Vec<(&Hotkey, HotkeyName)> = self
            .bindings()
            .into_iter()
            .filter_map(|(hk, name)| hk.map(|hk| (hk, name)))
            .collect();
        for (i, (a, name_a)) in bound.iter().enumerate() {
            for (b, name_b) in &bound[i + 1..] {
                if a.matches(b) {
                    return Some((*name_a, *name_b));
                }
            }
        }
        None
    }
}
