//! Top-level entry point for running the viewer as a native window.

use eframe::egui;

use super::ViewerApp;
use crate::coordinator::ViewCoordinator;

/// Open a native window driving `coordinator`. Blocks until it is closed.
pub fn run_viewer(coordinator: ViewCoordinator, title: &str) -> eframe::Result<()> {
    let mut opts = eframe::NativeOptions::default();
    if let Some(icon) = load_app_icon_svg() {
        opts.viewport = opts.viewport.with_icon(icon);
    }
    opts.viewport = opts
        .viewport
        .clone()
        .with_inner_size(egui::vec2(1400.0, 900.0));

    let app = ViewerApp::new(coordinator);
    eframe::run_native(title, opts, Box::new(|_cc| Ok(Box::new(app))))
}

/// Load `icon.svg` from the package root as window icon, if present.
fn load_app_icon_svg() -> Option<egui::IconData> {
    let svg_path = concat!(env!("CARGO_MANIFEST_DIR"), "/icon.svg");
    let data = std::fs::read(svg_path).ok()?;

    let opt = usvg::Options::default();
    let tree = usvg::Tree::from_data(&data, &opt).ok()?;
    let size = tree.size().to_int_size();
    if size.width() == 0 || size.height() == 0 {
        return None;
    }
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())?;
    let mut canvas = pixmap.as_mut();
    resvg::render(&tree, tiny_skia::Transform::default(), &mut canvas);
    Some(egui::IconData {
        rgba: pixmap.take(),
        width: size.width(),
        height: size.height(),
    })
}
