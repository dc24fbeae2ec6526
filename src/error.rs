use thiserror::Error;
use uuid::Uuid;

use crate::raster::RasterError;
use crate::snapshot::SnapshotError;
use crate::state::PersistenceError;

/// Rejected changes to the tool settings
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("shape detection cannot be used with the eraser; select a drawing tool first")]
    ShapeDetectionWithEraser,

    #[error("stroke width {0} is out of range")]
    InvalidWidth(f32),
}

/// Errors surfaced by the drawing session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error("failed to capture canvas: {0}")]
    Capture(#[source] SnapshotError),

    /// The snapshot could not be painted back. History is left as it was.
    #[error("failed to restore snapshot {id}: {source}")]
    Restore {
        id: Uuid,
        #[source]
        source: SnapshotError,
    },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("saved drawing is not a usable image: {0}")]
    InvalidDrawing(#[source] SnapshotError),
}

pub type SessionResult<T> = Result<T, SessionError>;
