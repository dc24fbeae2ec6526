//! The state machine behind a drawing session.
//!
//! ```text
//!              pointer down / draw gesture
//!     ┌──────┐ ──────────────────────────► ┌─────────┐
//!     │      │ ◄────────────────────────── │ Drawing │
//!     │      │   up / leave / end gesture  └─────────┘
//!     │ Idle │   erase gesture             ┌────────────────┐
//!     │      │ ──────────────────────────► │ GestureErasing │
//!     │      │ ◄────────────────────────── └────────────────┘
//!     │      │   undo / redo / load        ┌───────────┐
//!     │      │ ──────────────────────────► │ Restoring │
//!     └──────┘ ◄────────────────────────── └───────────┘
//!                 decode finished
//! ```
//!
//! While `Restoring`, every request that would touch the raster is queued
//! and replayed in order once the decode finishes.

use futures::channel::oneshot;
use tiny_skia::Pixmap;
use uuid::Uuid;

use crate::raster::Raster;
use crate::renderer::StrokeRenderer;
use crate::snapshot::{Snapshot, SnapshotResult};
use crate::stroke::MutableStroke;

/// The stroke currently being drawn
#[derive(Debug)]
pub struct ActiveStroke {
    pub stroke: MutableStroke,
    pub renderer: StrokeRenderer,
    /// Raster as it was before the stroke, kept only when shape detection
    /// may need to replace the raw ink
    pub before: Option<Raster>,
}

/// What a finished decode is applied to
#[derive(Debug)]
pub enum RestoreTarget {
    /// Move the history cursor to this index
    Cursor(usize),
    /// Replace the whole history with this snapshot
    Reset(Snapshot),
}

/// A decode in flight
#[derive(Debug)]
pub struct PendingRestore {
    pub target: RestoreTarget,
    pub snapshot_id: Uuid,
    pub receiver: oneshot::Receiver<SnapshotResult<Pixmap>>,
}

#[derive(Debug, Default)]
pub enum SessionState {
    /// No active operation
    #[default]
    Idle,
    /// Collecting points for a stroke
    Drawing(ActiveStroke),
    /// A run of gesture erases not yet committed to history
    GestureErasing,
    /// Waiting for a snapshot decode
    Restoring(PendingRestore),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Drawing(_) => "Drawing",
            SessionState::GestureErasing => "GestureErasing",
            SessionState::Restoring(_) => "Restoring",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self, SessionState::Drawing(_))
    }

    pub fn is_gesture_erasing(&self) -> bool {
        matches!(self, SessionState::GestureErasing)
    }

    pub fn is_restoring(&self) -> bool {
        matches!(self, SessionState::Restoring(_))
    }

    /// The stroke being drawn, if any
    pub fn active_stroke(&self) -> Option<&ActiveStroke> {
        match self {
            SessionState::Drawing(active) => Some(active),
            _ => None,
        }
    }
}
