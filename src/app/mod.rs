//! Native viewer.
//!
//! | Sub-module   | Responsibility |
//! | ------------ | -------------- |
//! | [`controls`] | Control strip: time, channels, amplitude, filter, display, mode, export |
//! | [`plot`]     | Overview and detail plots, forwarding pointer/keyboard input |
//! | [`run`]      | [`run_viewer()`] entry point |
//!
//! The app owns a [`ViewCoordinator`] and never changes view state itself:
//! every widget and gesture goes through the coordinator, which publishes the
//! change and produces the frames drawn on the next pass.

mod controls;
mod plot;
mod run;

pub use run::run_viewer;

use std::sync::Arc;

use eframe::egui;
use tracing::debug;

use crate::coordinator::{Frame, ViewCoordinator};
use crate::export::ExportFormat;

/// Filter fields as edited in the control strip, applied on change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FilterControls {
    pub enabled: bool,
    pub high_pass_hz: f64,
    pub low_pass_hz: f64,
}

impl Default for FilterControls {
    fn default() -> Self {
        Self {
            enabled: false,
            high_pass_hz: 1.0,
            low_pass_hz: 40.0,
        }
    }
}

pub struct ViewerApp {
    pub(crate) coordinator: ViewCoordinator,
    pub(crate) frames: Option<(Frame, Frame)>,
    pub(crate) filter_controls: FilterControls,
    pub(crate) export_format: ExportFormat,
    /// Last error shown in the status bar.
    pub(crate) status: Option<String>,
    repaint_hooked: bool,
}

impl ViewerApp {
    pub fn new(coordinator: ViewCoordinator) -> Self {
        let mut filter_controls = FilterControls::default();
        if let Some(spec) = coordinator.filter() {
            filter_controls.enabled = true;
            filter_controls.high_pass_hz = spec.low_hz.unwrap_or(0.0);
            filter_controls.low_pass_hz = spec.high_hz.unwrap_or(0.0);
        }
        Self {
            coordinator,
            frames: None,
            filter_controls,
            export_format: ExportFormat::Png,
            status: None,
            repaint_hooked: false,
        }
    }

    pub fn coordinator(&self) -> &ViewCoordinator {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut ViewCoordinator {
        &mut self.coordinator
    }

    pub(crate) fn report<E: std::fmt::Display>(&mut self, result: Result<(), E>) {
        if let Err(e) = result {
            self.status = Some(e.to_string());
        }
    }

    fn refresh_frames(&mut self) {
        match self.coordinator.render_current() {
            Ok(frames) => self.frames = Some(frames),
            Err(e) => {
                // Keep drawing the last good frames.
                self.frames = self.coordinator.last_frames().cloned();
                self.status = Some(e.to_string());
            }
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.repaint_hooked {
            let repaint_ctx = ctx.clone();
            self.coordinator
                .set_repaint_notify(Some(Arc::new(move || repaint_ctx.request_repaint())));
            self.repaint_hooked = true;
        }

        let updates = self.coordinator.poll();
        if !updates.is_empty() {
            debug!(count = updates.len(), "filter updates applied");
        }

        egui::TopBottomPanel::top("rawscope_controls").show(ctx, |ui| {
            self.render_controls(ui);
        });

        egui::TopBottomPanel::bottom("rawscope_status").show(ctx, |ui| {
            self.render_status(ui);
        });

        self.refresh_frames();

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_plots(ui);
        });

        self.forward_input(ctx);
    }
}
