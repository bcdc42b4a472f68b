//! Static export of a rendered frame.
//!
//! Images are produced by writing the frame as SVG and, for raster formats,
//! rendering that SVG with resvg. CSV writes the frame's unscaled samples.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::color_scheme::to_hex;
use crate::coordinator::Frame;
use crate::error::ExportError;

const WIDTH: f64 = 1600.0;
const ROW_HEIGHT: f64 = 48.0;
const MIN_HEIGHT: f64 = 300.0;
const MARGIN: f64 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Jpeg,
    Svg,
    Csv,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Png,
        ExportFormat::Jpeg,
        ExportFormat::Svg,
        ExportFormat::Csv,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Svg => "svg",
            ExportFormat::Csv => "csv",
        }
    }

    /// Format implied by the file extension of `path`.
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ExportError::UnsupportedFormat(path.display().to_string()))?;
        ext.parse()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
            ExportFormat::Svg => "svg",
            ExportFormat::Csv => "csv",
        };
        f.write_str(s)
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpeg),
            "svg" => Ok(ExportFormat::Svg),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Write `frame` to `path` in `format`.
pub fn export_frame(frame: &Frame, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
    match format {
        ExportFormat::Svg => {
            let svg = frame_to_svg(frame);
            std::fs::write(path, svg).map_err(|source| io_error(path, source))
        }
        ExportFormat::Png => rasterize(frame)?
            .save_with_format(path, ImageFormat::Png)
            .map_err(ExportError::from),
        ExportFormat::Jpeg => DynamicImage::ImageRgba8(rasterize(frame)?)
            .to_rgb8()
            .save_with_format(path, ImageFormat::Jpeg)
            .map_err(ExportError::from),
        ExportFormat::Csv => write_csv(frame, path),
    }
}

fn io_error(path: &Path, source: std::io::Error) -> ExportError {
    ExportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// SVG document of the frame: white background, event markers and one
/// polyline per channel row.
pub fn frame_to_svg(frame: &Frame) -> String {
    let height = (frame.rows.len() as f64 * ROW_HEIGHT + 2.0 * MARGIN).max(MIN_HEIGHT);
    let b = frame.bounds;
    let plot_w = WIDTH - 2.0 * MARGIN;
    let plot_h = height - 2.0 * MARGIN;
    let sx = |t: f64| MARGIN + (t - b.min_x) / b.width() * plot_w;
    let sy = |y: f64| MARGIN + (b.max_y - y) / b.height() * plot_h;

    let mut svg = String::with_capacity(64 * 1024);
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{height}\" viewBox=\"0 0 {WIDTH} {height}\">\n"
    ));
    svg.push_str("<rect x=\"0\" y=\"0\" width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>\n");
    svg.push_str(&format!(
        "<clipPath id=\"plot\"><rect x=\"{MARGIN}\" y=\"{MARGIN}\" width=\"{plot_w}\" height=\"{plot_h}\"/></clipPath>\n<g clip-path=\"url(#plot)\">\n"
    ));
    for ev in &frame.events {
        let x = sx(ev.time);
        svg.push_str(&format!(
            "<line x1=\"{x:.2}\" y1=\"{MARGIN}\" x2=\"{x:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"1\" stroke-dasharray=\"4 3\" stroke-opacity=\"0.7\"/>\n",
            MARGIN + plot_h,
            to_hex(ev.color)
        ));
    }
    for row in &frame.rows {
        if row.points.is_empty() {
            continue;
        }
        let pts: Vec<String> = row
            .plotted(frame.scale)
            .iter()
            .map(|[t, y]| format!("{:.2},{:.2}", sx(*t), sy(*y)))
            .collect();
        let width = if row.selected { 1.5 } else { 1.0 };
        svg.push_str(&format!(
            "<polyline fill=\"none\" stroke=\"{}\" stroke-width=\"{width}\" points=\"{}\"/>\n",
            to_hex(row.color),
            pts.join(" ")
        ));
    }
    svg.push_str("</g>\n");
    svg.push_str(&format!(
        "<rect x=\"{MARGIN}\" y=\"{MARGIN}\" width=\"{plot_w}\" height=\"{plot_h}\" fill=\"none\" stroke=\"#444444\"/>\n"
    ));
    svg.push_str("</svg>\n");
    svg
}

fn rasterize(frame: &Frame) -> Result<RgbaImage, ExportError> {
    let svg = frame_to_svg(frame);
    let opt = usvg::Options::default();
    let tree = usvg::Tree::from_data(svg.as_bytes(), &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| ExportError::Raster(format!("invalid size {}x{}", size.width(), size.height())))?;
    pixmap.fill(tiny_skia::Color::WHITE);
    let mut canvas = pixmap.as_mut();
    resvg::render(&tree, tiny_skia::Transform::default(), &mut canvas);
    RgbaImage::from_raw(size.width(), size.height(), pixmap.take())
        .ok_or_else(|| ExportError::Raster("pixel buffer size mismatch".to_string()))
}

fn csv_field(name: &str) -> String {
    if name.contains(|c: char| matches!(c, ',' | '"' | '\n')) {
        format!("\"{}\"", name.replace('"', "\"\""))
    } else {
        name.to_string()
    }
}

fn write_csv(frame: &Frame, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|e| io_error(path, e))?;
    let mut w = BufWriter::new(file);
    let write = |w: &mut BufWriter<File>| -> std::io::Result<()> {
        let header: Vec<String> = std::iter::once("time_s".to_string())
            .chain(frame.rows.iter().map(|r| csv_field(&r.name)))
            .collect();
        writeln!(w, "{}", header.join(","))?;
        let len = frame.rows.iter().map(|r| r.points.len()).min().unwrap_or(0);
        for i in 0..len {
            let t = frame.rows[0].points[i][0];
            write!(w, "{:.6}", t)?;
            for row in &frame.rows {
                write!(w, ",{}", row.points[i][1])?;
            }
            writeln!(w)?;
        }
        w.flush()
    };
    write(&mut w).map_err(|e| io_error(path, e))
}
