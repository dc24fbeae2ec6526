//! Idealized primitives that replace recognized freehand ink.

mod classifier;

pub use classifier::{ClassifierConfig, ShapeClassifier};

use egui::{Color32, Pos2, Rect};
use serde::{Deserialize, Serialize};
use tiny_skia::{Path, PathBuilder};

use crate::raster::{Raster, RasterError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    Line,
    Circle,
    Square,
    Rectangle,
    Triangle,
    Polygon,
}

impl ShapeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Line => "line",
            ShapeKind::Circle => "circle",
            ShapeKind::Square => "square",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Triangle => "triangle",
            ShapeKind::Polygon => "polygon",
        }
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A recognized primitive with just enough geometry to draw it.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeCandidate {
    Line { start: Pos2, end: Pos2 },
    Circle { center: Pos2, radius: f32 },
    /// Drawn with side `max(width, height)` from `bounds.min`
    Square { bounds: Rect },
    Rectangle { bounds: Rect },
    Triangle { vertices: [Pos2; 3] },
    /// Corner points, closed back to the first
    Polygon { vertices: Vec<Pos2> },
}

impl ShapeCandidate {
    pub fn kind(&self) -> ShapeKind {
        match self {
            ShapeCandidate::Line { .. } => ShapeKind::Line,
            ShapeCandidate::Circle { .. } => ShapeKind::Circle,
            ShapeCandidate::Square { .. } => ShapeKind::Square,
            ShapeCandidate::Rectangle { .. } => ShapeKind::Rectangle,
            ShapeCandidate::Triangle { .. } => ShapeKind::Triangle,
            ShapeCandidate::Polygon { .. } => ShapeKind::Polygon,
        }
    }

    /// Outline of the primitive, `None` when its geometry is degenerate.
    pub fn to_path(&self) -> Option<Path> {
        match self {
            ShapeCandidate::Line { start, end } => {
                let mut pb = PathBuilder::new();
                pb.move_to(start.x, start.y);
                pb.line_to(end.x, end.y);
                pb.finish()
            }
            ShapeCandidate::Circle { center, radius } => PathBuilder::from_circle(center.x, center.y, *radius),
            ShapeCandidate::Square { bounds } => {
                let side = bounds.width().max(bounds.height());
                let rect = tiny_skia::Rect::from_xywh(bounds.min.x, bounds.min.y, side, side)?;
                Some(PathBuilder::from_rect(rect))
            }
            ShapeCandidate::Rectangle { bounds } => {
                let rect = tiny_skia::Rect::from_ltrb(bounds.min.x, bounds.min.y, bounds.max.x, bounds.max.y)?;
                Some(PathBuilder::from_rect(rect))
            }
            ShapeCandidate::Triangle { vertices } => closed_polyline(vertices),
            ShapeCandidate::Polygon { vertices } => closed_polyline(vertices),
        }
    }

    /// Stroke the outline onto the raster.
    pub fn render(&self, raster: &mut Raster, color: Color32, width: f32) -> Result<(), RasterError> {
        let path = self.to_path().ok_or(RasterError::InvalidPath(self.kind().name()))?;
        raster.stroke_path(&path, color, width);
        Ok(())
    }
}

fn closed_polyline(vertices: &[Pos2]) -> Option<Path> {
    let (first, rest) = vertices.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for v in rest {
        pb.line_to(v.x, v.y);
    }
    pb.close();
    pb.finish()
}
