use uuid::Uuid;

use crate::input::InputMode;
use crate::shape::ShapeKind;
use crate::tool::Tool;

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    ToolChanged {
        old: Tool,
        new: Tool,
    },
    InputModeChanged {
        mode: InputMode,
    },
    GridToggled {
        enabled: bool,
    },
    StrokeStarted {
        tool: Tool,
    },
    /// Raw ink was committed to history
    StrokeCommitted {
        tool: Tool,
        points: usize,
    },
    /// A recognized primitive replaced the raw ink
    ShapeRecognized {
        kind: ShapeKind,
    },
    HistoryChanged {
        cursor: usize,
        len: usize,
    },
    /// A snapshot could not be painted back; history is unchanged
    RestoreFailed {
        snapshot: Uuid,
        reason: String,
    },
    Cleared,
    DrawingSaved,
    DrawingLoaded,
}
