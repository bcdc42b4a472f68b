pub mod channels;
pub mod filter;
pub mod hotkeys;
pub mod overlay;
pub mod preview;
pub mod recording;
pub mod scaling;
pub mod time_window;
pub mod view_state;
