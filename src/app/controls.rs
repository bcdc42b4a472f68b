use eframe::egui;

use super::ViewerApp;
use crate::export::ExportFormat;
use crate::interaction::Mode;

impl ViewerApp {
    pub(super) fn render_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            self.time_controls(ui);
            ui.separator();
            self.channel_controls(ui);
        });
        ui.horizontal_wrapped(|ui| {
            self.amplitude_controls(ui);
            ui.separator();
            self.filter_controls_ui(ui);
            ui.separator();
            self.display_controls(ui);
            ui.separator();
            self.mode_controls(ui);
            ui.separator();
            self.export_controls(ui);
        });
    }

    fn time_controls(&mut self, ui: &mut egui::Ui) {
        let tw = self.coordinator.time_window();
        let mut offset = tw.time_offset();
        let max_offset = tw.max_offset();
        let mut length = tw.window_length();
        let min_window = self.coordinator.config().min_window_s;
        let max_window = tw.total_duration().max(min_window);

        let offset_resp = ui.add(
            egui::Slider::new(&mut offset, 0.0..=max_offset)
                .text("Time (s)")
                .fixed_decimals(2),
        );
        if offset_resp.changed() {
            let r = self.coordinator.set_time_offset(offset);
            self.report(r);
        }
        let length_resp = ui.add(
            egui::DragValue::new(&mut length)
                .range(min_window..=max_window)
                .speed(0.1)
                .suffix(" s"),
        );
        ui.label("Window");
        if length_resp.changed() {
            let r = self.coordinator.set_window_length(length);
            self.report(r);
        }
    }

    fn channel_controls(&mut self, ui: &mut egui::Ui) {
        let index = self.coordinator.channel_index();
        let groups: Vec<String> = index.group_names().iter().map(|g| g.to_string()).collect();
        let mut group = index.group().to_string();
        let mut count = index.count();
        let mut offset = index.offset();
        let group_size = index.group_size().max(1);
        let max_offset = index.max_offset();

        egui::ComboBox::from_label("Group")
            .selected_text(group.clone())
            .show_ui(ui, |ui| {
                for g in &groups {
                    ui.selectable_value(&mut group, g.clone(), g);
                }
            });
        if group != self.coordinator.channel_index().group() {
            self.coordinator.set_channel_group(&group);
        }

        if ui
            .add(egui::Slider::new(&mut count, 1..=group_size).text("Channels"))
            .changed()
        {
            self.coordinator.set_channel_count(count);
        }
        if ui
            .add(egui::Slider::new(&mut offset, 0..=max_offset).text("Offset"))
            .changed()
        {
            self.coordinator.set_channel_offset(offset);
        }
    }

    fn amplitude_controls(&mut self, ui: &mut egui::Ui) {
        let mut amp = self.coordinator.amplitude();
        if ui
            .add(
                egui::Slider::new(&mut amp, 1e-6..=1e3)
                    .logarithmic(true)
                    .text("Amplitude"),
            )
            .changed()
        {
            self.coordinator.set_amplitude(amp);
        }
        if ui.button("Auto").clicked() {
            self.coordinator.auto_scale();
        }
    }

    fn filter_controls_ui(&mut self, ui: &mut egui::Ui) {
        let mut fc = self.filter_controls;
        ui.checkbox(&mut fc.enabled, "Filter");
        ui.add_enabled_ui(fc.enabled, |ui| {
            ui.label("HP");
            ui.add(
                egui::DragValue::new(&mut fc.high_pass_hz)
                    .range(0.0..=f64::MAX)
                    .speed(0.1)
                    .suffix(" Hz"),
            );
            ui.label("LP");
            ui.add(
                egui::DragValue::new(&mut fc.low_pass_hz)
                    .range(0.0..=f64::MAX)
                    .speed(0.5)
                    .suffix(" Hz"),
            );
        });
        if fc == self.filter_controls {
            return;
        }
        self.filter_controls = fc;
        // Zero means "cutoff off".
        let cutoff = |hz: f64| (hz > 0.0).then_some(hz);
        let result = if fc.enabled {
            self.coordinator
                .set_filter_band(cutoff(fc.high_pass_hz), cutoff(fc.low_pass_hz))
        } else {
            self.coordinator.set_filter(None)
        };
        match result {
            Ok(()) => self.status = None,
            Err(e) => self.status = Some(format!("Filter not applied: {e}")),
        }
    }

    fn display_controls(&mut self, ui: &mut egui::Ui) {
        let mut show_events = self.coordinator.show_events();
        if ui.checkbox(&mut show_events, "Events").changed() {
            self.coordinator.set_show_events(show_events);
        }
        let mut show_bad = self.coordinator.show_bad_channels();
        if ui.checkbox(&mut show_bad, "Bad channels").changed() {
            self.coordinator.set_show_bad_channels(show_bad);
        }
        if ui.button("Reset view").clicked() {
            self.coordinator.reset_view();
        }
    }

    fn mode_controls(&mut self, ui: &mut egui::Ui) {
        let current = self.coordinator.mode();
        for mode in Mode::ALL {
            if ui.selectable_label(current == mode, mode.label()).clicked() {
                self.coordinator.set_mode(mode);
            }
        }
    }

    fn export_controls(&mut self, ui: &mut egui::Ui) {
        egui::ComboBox::from_id_salt("rawscope_export_format")
            .selected_text(self.export_format.to_string().to_uppercase())
            .show_ui(ui, |ui| {
                for fmt in ExportFormat::ALL {
                    ui.selectable_value(
                        &mut self.export_format,
                        fmt,
                        fmt.to_string().to_uppercase(),
                    );
                }
            });
        if !ui.button("Export…").clicked() {
            return;
        }
        let fmt = self.export_format;
        let default_name = format!(
            "rawscope_{:.0}.{}",
            chrono::Local::now().timestamp_millis(),
            fmt.extension()
        );
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(&default_name)
            .add_filter(fmt.to_string().to_uppercase(), &[fmt.extension()])
            .save_file()
        {
            let r = self.coordinator.export_view(&path, fmt);
            self.report(r);
        }
    }

    pub(super) fn render_status(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let info = self.coordinator.view_info();
            ui.label(format!(
                "{:.2}-{:.2} s | {} channels | scale {:.3e} | filter {} | mode {}",
                info.time_range.0,
                info.time_range.1,
                info.channels.len(),
                info.amplitude_scale,
                info.filter.map(|f| f.label()).unwrap_or_else(|| "off".to_string()),
                info.mode,
            ));
            if self.coordinator.preview().is_pending() {
                ui.spinner();
            }
            if !info.selected_channels.is_empty() {
                ui.separator();
                ui.label(format!("{} selected", info.selected_channels.len()));
            }
            if let Some(msg) = &self.status {
                ui.separator();
                ui.colored_label(egui::Color32::LIGHT_RED, msg);
            }
        });
    }
}
