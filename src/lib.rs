#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod config;
pub mod error;
pub mod event;
pub mod geometry;
pub mod grid;
pub mod history;
pub mod input;
pub mod ocr;
pub mod panels;
pub mod raster;
pub mod renderer;
pub mod shape;
pub mod snapshot;
pub mod state;
pub mod stroke;
pub mod tool;

pub use app::PaintApp;
pub use config::Settings;
pub use error::{SessionError, SessionResult, ToolError};
pub use event::{EditorEvent, EventBus, EventHandler};
pub use history::HistoryManager;
pub use input::{Gesture, GestureMessage, InputEvent, InputMode, spawn_feed};
pub use raster::Raster;
pub use shape::{ShapeCandidate, ShapeClassifier, ShapeKind};
pub use snapshot::Snapshot;
pub use state::DrawingSession;
pub use stroke::Stroke;
pub use tool::{Tool, ToolSettings};
