use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;

/// Drawing tools available on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tool {
    /// Single fine stroke
    #[default]
    Pencil,
    /// Stroke with a translucent smudge trail
    Brush,
    /// Removes coverage under the pointer
    Eraser,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::Pencil, Tool::Brush, Tool::Eraser];

    pub fn name(&self) -> &'static str {
        match self {
            Tool::Pencil => "Pencil",
            Tool::Brush => "Brush",
            Tool::Eraser => "Eraser",
        }
    }

    pub fn is_eraser(&self) -> bool {
        matches!(self, Tool::Eraser)
    }
}

pub const MIN_WIDTH: f32 = 1.0;
pub const MAX_WIDTH: f32 = 50.0;

/// The user-facing drawing settings shared by the renderer and classifier.
///
/// Fields are private so the eraser rules below cannot be bypassed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    tool: Tool,
    color: Color32,
    width: f32,
    shape_detection: bool,
    grid: bool,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            tool: Tool::Pencil,
            color: Color32::BLACK,
            width: 5.0,
            shape_detection: false,
            grid: false,
        }
    }
}

impl ToolSettings {
    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn shape_detection(&self) -> bool {
        self.shape_detection
    }

    pub fn grid(&self) -> bool {
        self.grid
    }

    /// Switch tools. Returns the previous tool.
    ///
    /// Selecting the eraser turns shape detection off.
    pub fn set_tool(&mut self, tool: Tool) -> Tool {
        let old = self.tool;
        self.tool = tool;
        if tool.is_eraser() {
            self.shape_detection = false;
        }
        old
    }

    /// Pick a new ink color; while erasing this also returns to the pencil.
    pub fn set_color(&mut self, color: Color32) {
        self.color = color;
        if self.tool.is_eraser() {
            self.tool = Tool::Pencil;
        }
    }

    pub fn set_width(&mut self, width: f32) -> Result<(), ToolError> {
        if !width.is_finite() || !(MIN_WIDTH..=MAX_WIDTH).contains(&width) {
            return Err(ToolError::InvalidWidth(width));
        }
        self.width = width;
        Ok(())
    }

    pub fn set_shape_detection(&mut self, enabled: bool) -> Result<(), ToolError> {
        if enabled && self.tool.is_eraser() {
            return Err(ToolError::ShapeDetectionWithEraser);
        }
        self.shape_detection = enabled;
        Ok(())
    }

    pub fn set_grid(&mut self, enabled: bool) {
        self.grid = enabled;
    }

    // Settings loaded from disk may carry combinations the setters forbid.
    pub(crate) fn normalized(mut self) -> Self {
        if self.tool.is_eraser() {
            self.shape_detection = false;
        }
        if !self.width.is_finite() {
            self.width = Self::default().width;
        }
        self.width = self.width.clamp(MIN_WIDTH, MAX_WIDTH);
        self
    }
}
