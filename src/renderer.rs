//! Live feedback for the stroke being drawn.
//!
//! The renderer is fed the whole point buffer after every new sample and
//! only paints the part it has not painted yet, so the raster receives each
//! curve segment exactly once.

use std::collections::VecDeque;

use egui::{Color32, Pos2};
use tiny_skia::PathBuilder;

use crate::geometry::midpoint;
use crate::raster::{Raster, RasterError};
use crate::tool::Tool;

/// Points needed before any curve is drawn
pub const MIN_POINTS_TO_DRAW: usize = 3;

/// Raw points kept for the brush smudge
pub const TRAIL_CAPACITY: usize = 5;

/// Opacity of the smudge segments
pub const SMUDGE_OPACITY: f32 = 0.3;

/// Width added per trail segment, relative to the stroke width
const SMUDGE_WIDTH_STEP: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderVariant {
    /// One stroke at the configured width
    Fine,
    /// Main stroke plus a widening translucent trail
    Textured,
    /// Destination-out discs of half the width
    Erase,
}

impl From<Tool> for RenderVariant {
    fn from(tool: Tool) -> Self {
        match tool {
            Tool::Pencil => RenderVariant::Fine,
            Tool::Brush => RenderVariant::Textured,
            Tool::Eraser => RenderVariant::Erase,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StrokeRenderer {
    variant: RenderVariant,
    color: Color32,
    width: f32,
    // End of the last painted curve segment
    cursor: Option<Pos2>,
    // Index of the next point to consume
    next: usize,
    trail: VecDeque<Pos2>,
    has_painted: bool,
}

impl StrokeRenderer {
    pub fn new(variant: RenderVariant, color: Color32, width: f32) -> Self {
        Self {
            variant,
            color,
            width,
            cursor: None,
            next: 0,
            trail: VecDeque::with_capacity(TRAIL_CAPACITY + 1),
            has_painted: false,
        }
    }

    pub fn variant(&self) -> RenderVariant {
        self.variant
    }

    /// True once anything reached the raster
    pub fn has_painted(&self) -> bool {
        self.has_painted
    }

    /// Paint whatever `points` adds since the previous call.
    pub fn extend(&mut self, raster: &mut Raster, points: &[Pos2]) -> Result<(), RasterError> {
        match self.variant {
            RenderVariant::Erase => self.erase_new_points(raster, points),
            RenderVariant::Fine | RenderVariant::Textured => self.draw_new_segments(raster, points),
        }
    }

    /// End the stroke. The smudge trail never carries over to the next one.
    pub fn finish(&mut self) {
        self.trail.clear();
        self.cursor = None;
        self.next = 0;
    }

    fn erase_new_points(&mut self, raster: &mut Raster, points: &[Pos2]) -> Result<(), RasterError> {
        let radius = self.width / 2.0;
        while self.next < points.len() {
            raster.erase_circle(points[self.next], radius)?;
            self.has_painted = true;
            self.next += 1;
        }
        Ok(())
    }

    fn draw_new_segments(&mut self, raster: &mut Raster, points: &[Pos2]) -> Result<(), RasterError> {
        if points.len() < MIN_POINTS_TO_DRAW {
            return Ok(());
        }

        let mut cursor = self.cursor.unwrap_or(points[0]);
        self.next = self.next.max(1);

        if self.variant == RenderVariant::Textured {
            self.push_trail(points[points.len() - 1]);
            self.draw_smudge(raster)?;
        }

        // Every interior point that now has a successor becomes a curve
        // from the cursor through it to the midpoint of its outgoing edge.
        while self.next + 1 < points.len() {
            let control = points[self.next];
            let end = midpoint(control, points[self.next + 1]);

            let mut pb = PathBuilder::new();
            pb.move_to(cursor.x, cursor.y);
            pb.quad_to(control.x, control.y, end.x, end.y);
            if let Some(path) = pb.finish() {
                raster.stroke_path(&path, self.color, self.width);
                self.has_painted = true;
            }

            cursor = end;
            self.next += 1;
        }

        self.cursor = Some(cursor);
        Ok(())
    }

    fn push_trail(&mut self, point: Pos2) {
        self.trail.push_back(point);
        if self.trail.len() > TRAIL_CAPACITY {
            self.trail.pop_front();
        }
    }

    fn draw_smudge(&mut self, raster: &mut Raster) -> Result<(), RasterError> {
        if self.trail.len() < 2 {
            return Ok(());
        }

        let color = with_opacity(self.color, SMUDGE_OPACITY);
        for (i, (start, end)) in self.trail.iter().zip(self.trail.iter().skip(1)).enumerate() {
            if start == end {
                continue;
            }
            let width = self.width * (1.0 + i as f32 * SMUDGE_WIDTH_STEP);
            raster.stroke_segment(*start, *end, color, width)?;
        }
        self.has_painted = true;
        Ok(())
    }

    #[cfg(test)]
    fn trail_len(&self) -> usize {
        self.trail.len()
    }
}

fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    Color32::from_rgba_unmultiplied(r, g, b, (a as f32 * opacity).round() as u8)
}
