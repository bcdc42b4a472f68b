//! rawscope crate root: re-exports and module wiring.
//!
//! A windowed, multi-scale viewer for multichannel time series:
//! - `data`: recording access, time window, channel index, filter preview, overlays
//! - `interaction`: mode-dependent gesture handling
//! - `coordinator`: overview + detail frame composition
//! - `events`: pub/sub of viewer state changes
//! - `export`: static image / CSV export of the detail view
//! - `app`: native egui viewer driving a [`ViewCoordinator`]

pub mod app;
pub mod color_scheme;
pub mod config;
pub mod coordinator;
pub mod data;
pub mod error;
pub mod events;
pub mod export;
pub mod interaction;
pub mod logging;

// Public re-exports for a compact external API
pub use app::{run_viewer, ViewerApp};
pub use config::ViewerConfig;
pub use coordinator::{ChannelRow, EventMarker, Frame, ViewCoordinator};
pub use data::filter::{FilterSpec, SignalFilter, SpectralFilter};
pub use data::recording::{
    AnnotationDraft, ChannelMetadata, ChannelType, DataRegistry, Recording, Segment,
};
pub use data::view_state::{ViewInfo, ViewState};
pub use error::{ConfigError, DataSourceError, ExportError, FilterError, RegistryError};
pub use events::{EventController, EventFilter, EventKind, ViewerEvent};
pub use export::ExportFormat;
pub use interaction::{InputEvent, Mode, Surface};
