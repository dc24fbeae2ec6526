use egui::{Color32, Pos2};

use crate::tool::Tool;

// Finished stroke, handed to the classifier once input ends
#[derive(Debug, Clone)]
pub struct Stroke {
    points: Vec<Pos2>,
    color: Color32,
    width: f32,
    tool: Tool,
}

// Growing point buffer of the stroke being drawn
#[derive(Debug, Clone)]
pub struct MutableStroke {
    points: Vec<Pos2>,
    color: Color32,
    width: f32,
    tool: Tool,
}

impl Stroke {
    pub fn new(tool: Tool, color: Color32, width: f32, points: Vec<Pos2>) -> Self {
        Self {
            points,
            color,
            width,
            tool,
        }
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl MutableStroke {
    pub fn new(tool: Tool, color: Color32, width: f32) -> Self {
        Self {
            points: Vec::new(),
            color,
            width,
            tool,
        }
    }

    // Recorded points are never modified afterwards
    pub fn add_point(&mut self, point: Pos2) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    // Consume the buffer into a finished stroke
    pub fn finish(self) -> Stroke {
        Stroke::new(self.tool, self.color, self.width, self.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn test_points_keep_order() {
        let mut stroke = MutableStroke::new(Tool::Brush, Color32::RED, 8.0);
        assert!(stroke.is_empty());

        stroke.add_point(pos2(1.0, 1.0));
        stroke.add_point(pos2(2.0, 3.0));
        let finished = stroke.finish();

        assert_eq!(finished.points(), &[pos2(1.0, 1.0), pos2(2.0, 3.0)]);
        assert_eq!(finished.tool(), Tool::Brush);
        assert_eq!(finished.color(), Color32::RED);
        assert_eq!(finished.width(), 8.0);
    }
}
