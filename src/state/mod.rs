mod editor_state;
mod persistence;
mod session;

pub use editor_state::{ActiveStroke, PendingRestore, RestoreTarget, SessionState};
pub use persistence::{
    DrawingStore,
    FileStore,
    MemoryStore,
    PersistenceError,
    PersistenceResult,
    SAVED_DRAWING_KEY,
};
pub use session::DrawingSession;
