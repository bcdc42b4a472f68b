//! Overview and detail plots.
//!
//! egui_plot's own navigation is switched off: zoom, pan and selection are
//! interpreted by the coordinator's interaction machine, and the plots only
//! show the bounds the frames carry.

use eframe::egui;
use egui_plot::{Line, LineStyle, Plot, PlotPoints, Polygon, VLine};

use super::ViewerApp;
use crate::coordinator::Frame;
use crate::data::hotkeys::Modifier;
use crate::interaction::{DataRect, InputEvent, KeyInput, PointerButton, ScreenTransform, Surface};

/// Scroll distance in points treated as one wheel step.
const SCROLL_STEP_POINTS: f32 = 50.0;

/// Share of the central area given to the overview.
const OVERVIEW_FRACTION: f32 = 0.3;

impl ViewerApp {
    pub(super) fn render_plots(&mut self, ui: &mut egui::Ui) {
        let Some((overview, detail)) = self.frames.clone() else {
            ui.centered_and_justified(|ui| ui.label("No data"));
            return;
        };
        let total = ui.available_height();
        let overview_h = (total * OVERVIEW_FRACTION).max(80.0);

        if let Some(t) = show_frame(ui, "rawscope_overview", &overview, overview_h, None) {
            self.coordinator.set_surface_transform(Surface::Overview, t);
        }
        ui.separator();
        let rect = self.coordinator.selection().rect;
        let detail_h = ui.available_height();
        if let Some(t) = show_frame(ui, "rawscope_detail", &detail, detail_h, rect) {
            self.coordinator.set_surface_transform(Surface::Detail, t);
        }
    }

    /// Translate this pass's raw input into viewer input events.
    pub(super) fn forward_input(&mut self, ctx: &egui::Context) {
        let keyboard_free = !ctx.wants_keyboard_input();
        let events = ctx.input(|i| collect_input(i, keyboard_free));
        for event in events {
            if let Err(e) = self.coordinator.handle_input(event) {
                self.status = Some(e.to_string());
            }
        }
    }
}

fn show_frame(
    ui: &mut egui::Ui,
    id: &str,
    frame: &Frame,
    height: f32,
    selection_rect: Option<DataRect>,
) -> Option<ScreenTransform> {
    let labels: Vec<(f64, String)> = frame
        .rows
        .iter()
        .map(|r| (r.y_offset, r.name.clone()))
        .collect();
    let spacing = frame.row_spacing;
    let b = frame.bounds;

    let plot = Plot::new(id)
        .height(height)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .allow_double_click_reset(false)
        .show_x(false)
        .show_y(false)
        .y_grid_spacer(egui_plot::uniform_grid_spacer(move |_| {
            [spacing, spacing, spacing]
        }))
        .y_axis_formatter(move |mark, _range| {
            labels
                .iter()
                .find(|(y, _)| (y - mark.value).abs() < spacing * 1e-3)
                .map(|(_, name)| name.clone())
                .unwrap_or_default()
        })
        .x_axis_formatter(|mark, _range| format!("{:.2} s", mark.value));

    let resp = plot.show(ui, |plot_ui| {
        plot_ui.set_plot_bounds_x(b.min_x..=b.max_x);
        plot_ui.set_plot_bounds_y(b.min_y..=b.max_y);

        if let Some((start, end)) = frame.highlight {
            let band = PlotPoints::from(vec![
                [start, b.min_y],
                [end, b.min_y],
                [end, b.max_y],
                [start, b.max_y],
            ]);
            plot_ui.polygon(
                Polygon::new("window", band)
                    .fill_color(egui::Color32::from_rgba_unmultiplied(100, 150, 255, 40))
                    .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(100, 150, 255))),
            );
        }

        for ev in &frame.events {
            plot_ui.vline(
                VLine::new(format!("event {}", ev.type_id), ev.time)
                    .color(ev.color)
                    .width(1.0)
                    .style(LineStyle::Dashed { length: 4.0 }),
            );
        }

        for row in &frame.rows {
            if row.points.is_empty() {
                continue;
            }
            let width = if row.selected { 1.5 } else { 1.0 };
            plot_ui.line(
                Line::new(row.name.clone(), row.plotted(frame.scale))
                    .color(row.color)
                    .width(width),
            );
        }

        if let Some(r) = selection_rect {
            let pts = PlotPoints::from(vec![
                [r.min_x, r.min_y],
                [r.max_x, r.min_y],
                [r.max_x, r.max_y],
                [r.min_x, r.max_y],
            ]);
            plot_ui.polygon(
                Polygon::new("selection", pts)
                    .fill_color(egui::Color32::from_rgba_unmultiplied(255, 0, 0, 30))
                    .stroke(egui::Stroke::new(1.0, egui::Color32::RED)),
            );
        }
    });

    let shown = resp.transform.bounds();
    let [x0, y0] = shown.min();
    let [x1, y1] = shown.max();
    let rect = *resp.transform.frame();
    (rect.width() > 0.0 && rect.height() > 0.0)
        .then(|| ScreenTransform::new(rect, DataRect::new(x0, x1, y0, y1)))
}

fn map_button(button: egui::PointerButton) -> Option<PointerButton> {
    match button {
        egui::PointerButton::Primary => Some(PointerButton::Primary),
        egui::PointerButton::Secondary => Some(PointerButton::Secondary),
        egui::PointerButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

fn map_key(key: egui::Key) -> Option<KeyInput> {
    if key == egui::Key::Escape {
        return Some(KeyInput::Escape);
    }
    let mut chars = key.name().chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Some(KeyInput::Char(ch)),
        _ => None,
    }
}

/// Pointer events go to both surfaces; the interaction machine ignores
/// positions outside a surface's rectangle.
fn collect_input(input: &egui::InputState, keyboard_free: bool) -> Vec<InputEvent> {
    let mut out = Vec::new();
    let surfaces = [Surface::Overview, Surface::Detail];
    for event in &input.events {
        match event {
            egui::Event::PointerButton {
                pos,
                button,
                pressed,
                ..
            } => {
                let Some(button) = map_button(*button) else {
                    continue;
                };
                for surface in surfaces {
                    out.push(if *pressed {
                        InputEvent::PointerPressed {
                            surface,
                            button,
                            pos: *pos,
                        }
                    } else {
                        InputEvent::PointerReleased {
                            surface,
                            button,
                            pos: *pos,
                        }
                    });
                }
            }
            egui::Event::PointerMoved(pos) => {
                out.extend(surfaces.map(|surface| InputEvent::PointerMoved { surface, pos: *pos }));
            }
            egui::Event::Key {
                key,
                pressed: true,
                modifiers,
                ..
            } if keyboard_free => {
                if let Some(key) = map_key(*key) {
                    out.push(InputEvent::Key {
                        key,
                        modifier: Modifier::from_flags(
                            modifiers.command,
                            modifiers.alt,
                            modifiers.shift,
                        ),
                    });
                }
            }
            _ => {}
        }
    }

    let scroll = input.raw_scroll_delta.y;
    if scroll != 0.0 {
        if let Some(pos) = input.pointer.hover_pos() {
            let steps = scroll / SCROLL_STEP_POINTS;
            out.extend(surfaces.map(|surface| InputEvent::Scroll { surface, pos, steps }));
        }
    }
    out
}
