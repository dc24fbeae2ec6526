//! Cached grid overlay.
//!
//! The grid is never painted into the raster itself, so history snapshots
//! stay grid-free. It is composited on top of the ink only for display and
//! export.

use egui::Color32;
use tiny_skia::{PathBuilder, Pixmap, Transform};

use crate::raster::{RasterError, round_stroke, solid_paint};

pub const DEFAULT_CELL_SIZE: u32 = 20;

/// rgba(0, 0, 0, 0.1)
pub const GRID_COLOR: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 26);

#[derive(Debug, Clone)]
pub struct GridOverlay {
    cell_size: u32,
    cache: Option<Pixmap>,
}

impl Default for GridOverlay {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl GridOverlay {
    pub fn new(cell_size: u32) -> Self {
        Self {
            cell_size: cell_size.max(1),
            cache: None,
        }
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    /// Drop the cached lines; the next request rebuilds them.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    /// Grid lines for a canvas of the given size, rebuilt only when the size
    /// changed or the cache was invalidated.
    pub fn overlay(&mut self, width: u32, height: u32) -> Result<&Pixmap, RasterError> {
        let stale = self
            .cache
            .as_ref()
            .is_none_or(|cached| cached.width() != width || cached.height() != height);
        if stale {
            log::debug!("Rebuilding {}x{} grid overlay", width, height);
            self.cache = Some(self.build(width, height)?);
        }
        self.cache
            .as_ref()
            .ok_or(RasterError::InvalidDimensions { width, height })
    }

    fn build(&self, width: u32, height: u32) -> Result<Pixmap, RasterError> {
        let mut pixmap = Pixmap::new(width, height).ok_or(RasterError::InvalidDimensions { width, height })?;
        let (w, h) = (width as f32, height as f32);

        // Lines sit on pixel centers so each covers exactly one column or row.
        let mut pb = PathBuilder::new();
        for x in (0..=width).step_by(self.cell_size as usize) {
            let x = x as f32 + 0.5;
            pb.move_to(x, 0.0);
            pb.line_to(x, h);
        }
        for y in (0..=height).step_by(self.cell_size as usize) {
            let y = y as f32 + 0.5;
            pb.move_to(0.0, y);
            pb.line_to(w, y);
        }
        let path = pb.finish().ok_or(RasterError::InvalidPath("grid"))?;

        let mut paint = solid_paint(GRID_COLOR);
        paint.anti_alias = false;
        let mut stroke = round_stroke(1.0);
        stroke.line_cap = tiny_skia::LineCap::Butt;
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        Ok(pixmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_every_cell() {
        let mut grid = GridOverlay::new(20);
        let overlay = grid.overlay(100, 60).unwrap();

        assert!(overlay.pixel(0, 7).unwrap().alpha() > 0);
        assert!(overlay.pixel(40, 7).unwrap().alpha() > 0);
        assert!(overlay.pixel(7, 20).unwrap().alpha() > 0);
        assert_eq!(overlay.pixel(10, 10).unwrap().alpha(), 0);
        assert_eq!(overlay.pixel(41, 7).unwrap().alpha(), 0);
    }

    #[test]
    fn test_cache_follows_size() {
        let mut grid = GridOverlay::default();
        assert!(!grid.is_cached());

        grid.overlay(40, 40).unwrap();
        assert!(grid.is_cached());

        let resized = grid.overlay(80, 30).unwrap();
        assert_eq!((resized.width(), resized.height()), (80, 30));

        grid.invalidate();
        assert!(!grid.is_cached());
    }
}
