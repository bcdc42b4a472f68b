//! Channel and event colours.
//!
//! The colour of a channel row is decided in one place, [`channel_role`],
//! with a fixed precedence: selected, then bad, then type. Overview and
//! detail frames both go through it.

use eframe::egui::Color32;

use crate::config::PaletteConfig;
use crate::data::recording::ChannelType;

/// What a row's colour is keyed on, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    Selected,
    Bad,
    Typed(ChannelType),
}

/// Nominal type unless the name carries an ocular, cardiac or muscular
/// marker token (case-insensitive).
pub fn classify_channel(name: &str, nominal: ChannelType) -> ChannelType {
    let lower = name.to_ascii_lowercase();
    if lower.contains("eog") {
        // Also covers veog / heog.
        ChannelType::Eog
    } else if lower.contains("ecg") {
        ChannelType::Ecg
    } else if lower.contains("emg") {
        ChannelType::Emg
    } else {
        nominal
    }
}

/// Role of a channel row. `show_bad` off demotes bad channels to their type.
pub fn channel_role(
    name: &str,
    nominal: ChannelType,
    selected: bool,
    bad: bool,
    show_bad: bool,
) -> ChannelRole {
    if selected {
        ChannelRole::Selected
    } else if bad && show_bad {
        ChannelRole::Bad
    } else {
        ChannelRole::Typed(classify_channel(name, nominal))
    }
}

#[inline]
fn rgb(c: [u8; 3]) -> Color32 {
    Color32::from_rgb(c[0], c[1], c[2])
}

/// Resolved channel palette.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelPalette {
    pub selected: Color32,
    pub bad: Color32,
    pub eeg: Color32,
    pub meg_mag: Color32,
    pub meg_grad: Color32,
    pub eog: Color32,
    pub ecg: Color32,
    pub emg: Color32,
    pub stim: Color32,
    pub misc: Color32,
}

impl ChannelPalette {
    pub fn from_config(cfg: &PaletteConfig) -> Self {
        Self {
            selected: rgb(cfg.selected),
            bad: rgb(cfg.bad),
            eeg: rgb(cfg.eeg),
            meg_mag: rgb(cfg.meg_mag),
            meg_grad: rgb(cfg.meg_grad),
            eog: rgb(cfg.eog),
            ecg: rgb(cfg.ecg),
            emg: rgb(cfg.emg),
            stim: rgb(cfg.stim),
            misc: rgb(cfg.misc),
        }
    }

    pub fn type_color(&self, ty: ChannelType) -> Color32 {
        match ty {
            ChannelType::Eeg => self.eeg,
            ChannelType::MegMag => self.meg_mag,
            ChannelType::MegGrad => self.meg_grad,
            ChannelType::Eog => self.eog,
            ChannelType::Ecg => self.ecg,
            ChannelType::Emg => self.emg,
            ChannelType::Stim => self.stim,
            ChannelType::Misc => self.misc,
        }
    }

    pub fn color_for(&self, role: ChannelRole) -> Color32 {
        match role {
            ChannelRole::Selected => self.selected,
            ChannelRole::Bad => self.bad,
            ChannelRole::Typed(ty) => self.type_color(ty),
        }
    }
}

impl Default for ChannelPalette {
    fn default() -> Self {
        Self::from_config(&PaletteConfig::default())
    }
}

const EVENT_PALETTE: [Color32; 10] = [
    Color32::from_rgb(0xff, 0x00, 0x00),
    Color32::from_rgb(0x00, 0xff, 0x00),
    Color32::from_rgb(0x00, 0x00, 0xff),
    Color32::from_rgb(0xff, 0xff, 0x00),
    Color32::from_rgb(0xff, 0x00, 0xff),
    Color32::from_rgb(0x00, 0xff, 0xff),
    Color32::from_rgb(0xff, 0xa5, 0x00),
    Color32::from_rgb(0x80, 0x00, 0x80),
    Color32::from_rgb(0xff, 0xc0, 0xcb),
    Color32::from_rgb(0xa5, 0x2a, 0x2a),
];

/// Colour of an event marker. Ids 1..=10 have fixed colours; any other id
/// maps deterministically into the same palette.
pub fn event_color(type_id: u32) -> Color32 {
    match type_id {
        1..=10 => EVENT_PALETTE[(type_id - 1) as usize],
        other => {
            // Fibonacci hashing spreads consecutive ids.
            let h = other.wrapping_mul(0x9E37_79B9) >> 16;
            EVENT_PALETTE[h as usize % EVENT_PALETTE.len()]
        }
    }
}

/// `#rrggbb` form for SVG output.
pub fn to_hex(color: Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_token_overrides_type() {
        assert_eq!(classify_channel("VEOG", ChannelType::Eeg), ChannelType::Eog);
        assert_eq!(classify_channel("ecg-l", ChannelType::Misc), ChannelType::Ecg);
        assert_eq!(classify_channel("Cz", ChannelType::Eeg), ChannelType::Eeg);
    }

    #[test]
    fn event_colors_are_stable() {
        assert_eq!(event_color(1), Color32::from_rgb(255, 0, 0));
        assert_eq!(event_color(42), event_color(42));
        assert_eq!(to_hex(event_color(7)), "#ffa500");
    }
}
