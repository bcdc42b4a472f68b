//! Screen ↔ data coordinate transforms for one plotting surface.

use eframe::egui::{Pos2, Rect, Vec2};

/// Axis-aligned bounds in data space (x = seconds, y = row units).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataRect {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl DataRect {
    /// Bounds spanning both corners, in any order.
    pub fn from_corners(a: [f64; 2], b: [f64; 2]) -> Self {
        Self {
            min_x: a[0].min(b[0]),
            max_x: a[0].max(b[0]),
            min_y: a[1].min(b[1]),
            max_y: a[1].max(b[1]),
        }
    }

    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self::from_corners([min_x, min_y], [max_x, max_y])
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains_y(&self, y: f64) -> bool {
        self.min_y <= y && y <= self.max_y
    }

    /// Scale around `center`, keeping it fixed. `scale < 1` zooms in.
    pub fn zoom_around(&self, center: [f64; 2], scale: f64) -> Self {
        Self {
            min_x: center[0] - (center[0] - self.min_x) * scale,
            max_x: center[0] + (self.max_x - center[0]) * scale,
            min_y: center[1] - (center[1] - self.min_y) * scale,
            max_y: center[1] + (self.max_y - center[1]) * scale,
        }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            min_x: self.min_x + dx,
            max_x: self.max_x + dx,
            min_y: self.min_y + dy,
            max_y: self.max_y + dy,
        }
    }
}

/// Maps a pixel rectangle onto data bounds. Screen y grows downwards, data y
/// upwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenTransform {
    pub rect: Rect,
    pub bounds: DataRect,
}

impl ScreenTransform {
    pub fn new(rect: Rect, bounds: DataRect) -> Self {
        Self { rect, bounds }
    }

    pub fn contains(&self, pos: Pos2) -> bool {
        self.rect.contains(pos)
    }

    pub fn to_data(&self, pos: Pos2) -> [f64; 2] {
        let fx = ((pos.x - self.rect.left()) / self.rect.width()) as f64;
        let fy = ((pos.y - self.rect.top()) / self.rect.height()) as f64;
        [
            self.bounds.min_x + fx * self.bounds.width(),
            self.bounds.max_y - fy * self.bounds.height(),
        ]
    }

    pub fn to_screen(&self, value: [f64; 2]) -> Pos2 {
        let fx = (value[0] - self.bounds.min_x) / self.bounds.width();
        let fy = (self.bounds.max_y - value[1]) / self.bounds.height();
        Pos2::new(
            self.rect.left() + (fx as f32) * self.rect.width(),
            self.rect.top() + (fy as f32) * self.rect.height(),
        )
    }

    /// A pixel delta expressed in data units.
    pub fn delta_to_data(&self, delta: Vec2) -> [f64; 2] {
        [
            delta.x as f64 / self.rect.width() as f64 * self.bounds.width(),
            -(delta.y as f64) / self.rect.height() as f64 * self.bounds.height(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::pos2;

    fn transform() -> ScreenTransform {
        ScreenTransform::new(
            Rect::from_min_max(pos2(100.0, 50.0), pos2(500.0, 250.0)),
            DataRect::new(0.0, 10.0, -0.5, 19.5),
        )
    }

    #[test]
    fn corners_map_to_bounds() {
        let t = transform();
        assert_eq!(t.to_data(pos2(100.0, 50.0)), [0.0, 19.5]);
        assert_eq!(t.to_data(pos2(500.0, 250.0)), [10.0, -0.5]);
    }

    #[test]
    fn screen_round_trip() {
        let t = transform();
        let p = t.to_screen([2.5, 4.0]);
        let back = t.to_data(p);
        assert!((back[0] - 2.5).abs() < 1e-4);
        assert!((back[1] - 4.0).abs() < 1e-4);
    }

    #[test]
    fn zoom_keeps_center_fixed() {
        let r = DataRect::new(0.0, 10.0, 0.0, 10.0).zoom_around([2.0, 5.0], 0.5);
        assert_eq!(r, DataRect::new(1.0, 6.0, 2.5, 7.5));
    }
}
