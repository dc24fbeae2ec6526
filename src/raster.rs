//! The drawing surface shared by the stroke renderer, the shape painter and
//! history restores.
//!
//! Only one of those may hold `&mut Raster` at a time; the session enforces
//! that no stroke touches the surface while a restore is pending.

use egui::{Color32, Pos2, Rect};
use thiserror::Error;
use tiny_skia::{
    BlendMode, Color, FillRule, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, PixmapPaint,
    Stroke as SkStroke, Transform,
};

/// Errors raised while allocating or painting the raster
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("cannot allocate a {width}x{height} raster")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("cannot build {0} path")]
    InvalidPath(&'static str),
}

/// Pixel surface in premultiplied RGBA.
#[derive(Clone)]
pub struct Raster {
    pixmap: Pixmap,
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

impl Raster {
    /// Create a fully transparent raster
    pub fn new(width: u32, height: u32) -> Result<Self, RasterError> {
        let pixmap = Pixmap::new(width, height).ok_or(RasterError::InvalidDimensions { width, height })?;
        Ok(Self { pixmap })
    }

    pub fn from_pixmap(pixmap: Pixmap) -> Self {
        Self { pixmap }
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Premultiplied RGBA bytes, row-major
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Alpha of the pixel at `(x, y)`, `None` outside the raster
    pub fn alpha_at(&self, x: u32, y: u32) -> Option<u8> {
        self.pixmap.pixel(x, y).map(|p| p.alpha())
    }

    /// True when no pixel carries any coverage
    pub fn is_blank(&self) -> bool {
        self.pixmap.pixels().iter().all(|p| p.alpha() == 0)
    }

    pub fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    /// Replace every pixel with `source`, drawn at the origin.
    ///
    /// A source of a different size is clipped or leaves the uncovered area
    /// transparent.
    pub fn replace_with(&mut self, source: &Pixmap) {
        if source.width() == self.width() && source.height() == self.height() {
            self.pixmap.data_mut().copy_from_slice(source.data());
            return;
        }
        self.clear();
        self.pixmap.draw_pixmap(
            0,
            0,
            source.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    /// Composite `overlay` on top of the current pixels (source-over).
    pub fn composite(&mut self, overlay: &Pixmap) {
        self.pixmap.draw_pixmap(
            0,
            0,
            overlay.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    /// Resize the surface, keeping existing pixels anchored at the origin.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RasterError> {
        if width == self.width() && height == self.height() {
            return Ok(());
        }
        let mut resized = Raster::new(width, height)?;
        resized.composite(&self.pixmap);
        *self = resized;
        Ok(())
    }

    /// Stroke `path` with round caps and joins.
    pub fn stroke_path(&mut self, path: &Path, color: Color32, width: f32) {
        let paint = solid_paint(color);
        let stroke = round_stroke(width);
        self.pixmap.stroke_path(path, &paint, &stroke, Transform::identity(), None);
    }

    /// Straight segment, used by the textured trail.
    pub fn stroke_segment(&mut self, from: Pos2, to: Pos2, color: Color32, width: f32) -> Result<(), RasterError> {
        let mut pb = PathBuilder::new();
        pb.move_to(from.x, from.y);
        pb.line_to(to.x, to.y);
        let path = pb.finish().ok_or(RasterError::InvalidPath("segment"))?;
        self.stroke_path(&path, color, width);
        Ok(())
    }

    /// Remove coverage inside a disc (destination-out compositing).
    pub fn erase_circle(&mut self, center: Pos2, radius: f32) -> Result<(), RasterError> {
        let path = PathBuilder::from_circle(center.x, center.y, radius.max(0.5))
            .ok_or(RasterError::InvalidPath("eraser disc"))?;
        let mut paint = solid_paint(Color32::BLACK);
        paint.blend_mode = BlendMode::DestinationOut;
        self.pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        Ok(())
    }

    /// Make every pixel inside `rect` fully transparent.
    pub fn clear_rect(&mut self, rect: Rect) {
        let Some(rect) = tiny_skia::Rect::from_ltrb(rect.min.x, rect.min.y, rect.max.x, rect.max.y) else {
            return;
        };
        let mut paint = solid_paint(Color32::BLACK);
        paint.blend_mode = BlendMode::Clear;
        paint.anti_alias = false;
        self.pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }

    /// Copy of the pixels flattened onto an opaque background.
    pub fn flattened_on(&self, background: Color32) -> Pixmap {
        let mut flat = self.pixmap.clone();
        let [r, g, b, a] = background.to_srgba_unmultiplied();
        flat.fill(Color::from_rgba8(r, g, b, a));
        flat.draw_pixmap(
            0,
            0,
            self.pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        flat
    }
}

pub(crate) fn solid_paint(color: Color32) -> Paint<'static> {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

pub(crate) fn round_stroke(width: f32) -> SkStroke {
    SkStroke {
        width: width.max(0.1),
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(
            Raster::new(0, 10),
            Err(RasterError::InvalidDimensions { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_segment_paints_and_erase_clears() {
        let mut raster = Raster::new(40, 40).unwrap();
        assert!(raster.is_blank());

        raster
            .stroke_segment(pos2(5.0, 20.0), pos2(35.0, 20.0), Color32::BLACK, 6.0)
            .unwrap();
        assert_eq!(raster.alpha_at(20, 20), Some(255));

        raster.erase_circle(pos2(20.0, 20.0), 8.0).unwrap();
        assert_eq!(raster.alpha_at(20, 20), Some(0));
        assert_eq!(raster.alpha_at(6, 20), Some(255));
    }

    #[test]
    fn test_clear_rect() {
        let mut raster = Raster::new(20, 20).unwrap();
        raster
            .stroke_segment(pos2(0.0, 10.0), pos2(20.0, 10.0), Color32::RED, 8.0)
            .unwrap();
        raster.clear_rect(Rect::from_min_max(pos2(0.0, 0.0), pos2(10.0, 20.0)));

        assert_eq!(raster.alpha_at(5, 10), Some(0));
        assert_eq!(raster.alpha_at(15, 10), Some(255));
    }

    #[test]
    fn test_resize_keeps_origin_content() {
        let mut raster = Raster::new(20, 20).unwrap();
        raster
            .stroke_segment(pos2(2.0, 2.0), pos2(8.0, 2.0), Color32::BLACK, 2.0)
            .unwrap();
        raster.resize(50, 30).unwrap();

        assert_eq!((raster.width(), raster.height()), (50, 30));
        assert!(raster.alpha_at(5, 2).unwrap() > 0);
        assert_eq!(raster.alpha_at(40, 25), Some(0));
    }

    #[test]
    fn test_flattened_is_opaque() {
        let raster = Raster::new(4, 4).unwrap();
        let flat = raster.flattened_on(Color32::WHITE);
        assert!(flat.pixels().iter().all(|p| p.alpha() == 255 && p.red() == 255));
    }
}
