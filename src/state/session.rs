//! The drawing session ties the raster, renderer, classifier and history
//! together and is the single entry point for user actions.
//!
//! Snapshot encoding is synchronous, so every commit lands in history before
//! the next request is looked at. Decoding (undo, redo, load) happens off
//! the UI thread; until it finishes the session sits in
//! [`SessionState::Restoring`] and queues every raster-mutating request.
//! Drive it with [`DrawingSession::poll`] once per frame, or await
//! [`DrawingSession::settle`].

use std::collections::VecDeque;

use egui::{Color32, Pos2, Rect, Vec2};
use tiny_skia::Pixmap;

use super::editor_state::{ActiveStroke, PendingRestore, RestoreTarget, SessionState};
use super::persistence::{DrawingStore, FileStore, MemoryStore, SAVED_DRAWING_KEY};
use crate::config::Settings;
use crate::error::{SessionError, SessionResult, ToolError};
use crate::event::{EditorEvent, EventBus};
use crate::grid::GridOverlay;
use crate::history::HistoryManager;
use crate::input::{Gesture, GestureMessage, InputEvent, InputMode};
use crate::raster::Raster;
use crate::renderer::{RenderVariant, StrokeRenderer};
use crate::shape::{ClassifierConfig, ShapeClassifier};
use crate::snapshot::{Snapshot, SnapshotError, SnapshotResult, encode_png};
use crate::stroke::MutableStroke;
use crate::tool::{Tool, ToolSettings};

const DEFAULT_GESTURE_ERASE_SIZE: f32 = 40.0;

/// Requests deferred while a restore is in flight
#[derive(Debug)]
enum Request {
    Input(InputEvent),
    Undo,
    Redo,
    Clear,
    Load(Snapshot),
    Save,
    Resize(u32, u32),
    SetInputMode(InputMode),
}

/// How an open stroke is finalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finish {
    /// Try shape recognition if it is enabled
    Recognize,
    /// Keep the raw ink
    Raw,
}

pub struct DrawingSession {
    raster: Raster,
    history: HistoryManager,
    grid: GridOverlay,
    tools: ToolSettings,
    input_mode: InputMode,
    classifier: ShapeClassifier,
    state: SessionState,
    queue: VecDeque<Request>,
    store: Box<dyn DrawingStore>,
    event_bus: EventBus,
    gesture_erase_size: f32,
}

impl std::fmt::Debug for DrawingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawingSession")
            .field("raster", &self.raster)
            .field("history", &format!("{}/{}", self.history.cursor(), self.history.len()))
            .field("tools", &self.tools)
            .field("input_mode", &self.input_mode)
            .field("state", &self.state.name())
            .field("queued", &self.queue.len())
            .finish()
    }
}

impl DrawingSession {
    /// Blank session with default settings and an in-memory store
    pub fn new(width: u32, height: u32) -> SessionResult<Self> {
        let raster = Raster::new(width, height)?;
        let initial = Snapshot::capture(&raster).map_err(SessionError::Capture)?;

        Ok(Self {
            raster,
            history: HistoryManager::new(initial),
            grid: GridOverlay::default(),
            tools: ToolSettings::default(),
            input_mode: InputMode::default(),
            classifier: ShapeClassifier::default(),
            state: SessionState::Idle,
            queue: VecDeque::new(),
            store: Box::new(MemoryStore::new()),
            event_bus: EventBus::new(),
            gesture_erase_size: DEFAULT_GESTURE_ERASE_SIZE,
        })
    }

    pub fn from_settings(settings: &Settings) -> SessionResult<Self> {
        let store: Box<dyn DrawingStore> = match &settings.storage_dir {
            Some(dir) => Box::new(FileStore::new(dir)),
            None => Box::new(MemoryStore::new()),
        };

        let mut session = Self::new(settings.canvas.width, settings.canvas.height)?
            .with_classifier(settings.classifier.clone())
            .with_tool_settings(settings.tools.clone())
            .with_store(store);
        session.grid = GridOverlay::new(settings.canvas.grid_cell_size);
        session.gesture_erase_size = settings.canvas.gesture_erase_size;
        Ok(session)
    }

    pub fn with_classifier(mut self, config: ClassifierConfig) -> Self {
        self.classifier = ShapeClassifier::new(config);
        self
    }

    pub fn with_tool_settings(mut self, tools: ToolSettings) -> Self {
        self.tools = tools.normalized();
        self
    }

    pub fn with_store(mut self, store: Box<dyn DrawingStore>) -> Self {
        self.store = store;
        self
    }

    // Accessors

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn tools(&self) -> &ToolSettings {
        &self.tools
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn classifier(&self) -> &ShapeClassifier {
        &self.classifier
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn is_restoring(&self) -> bool {
        self.state.is_restoring()
    }

    /// Requests waiting for the current restore
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn canvas_size(&self) -> Vec2 {
        Vec2::new(self.raster.width() as f32, self.raster.height() as f32)
    }

    // Settings hooks. None of these touch the raster.

    pub fn set_tool(&mut self, tool: Tool) {
        let old = self.tools.set_tool(tool);
        if old != tool {
            log::info!("Tool changed: {} -> {}", old.name(), tool.name());
            self.event_bus.emit(EditorEvent::ToolChanged { old, new: tool });
        }
    }

    pub fn set_color(&mut self, color: Color32) {
        let old = self.tools.tool();
        self.tools.set_color(color);
        if old != self.tools.tool() {
            self.event_bus.emit(EditorEvent::ToolChanged {
                old,
                new: self.tools.tool(),
            });
        }
    }

    pub fn set_width(&mut self, width: f32) -> Result<(), ToolError> {
        self.tools.set_width(width)
    }

    pub fn set_shape_detection(&mut self, enabled: bool) -> Result<(), ToolError> {
        self.tools.set_shape_detection(enabled)
    }

    /// Show or hide the grid. The grid is only composited into
    /// [`frame`](Self::frame), so no restore is needed either way.
    pub fn set_grid(&mut self, enabled: bool) {
        if self.tools.grid() != enabled {
            self.tools.set_grid(enabled);
            self.event_bus.emit(EditorEvent::GridToggled { enabled });
        }
    }

    /// Switch input source, finalizing anything the old source left open.
    pub fn set_input_mode(&mut self, mode: InputMode) -> SessionResult<()> {
        if self.state.is_restoring() {
            self.queue.push_back(Request::SetInputMode(mode));
            return Ok(());
        }
        if self.input_mode == mode {
            return Ok(());
        }
        self.finalize_open(Finish::Raw)?;
        self.input_mode = mode;
        self.event_bus.emit(EditorEvent::InputModeChanged { mode });
        Ok(())
    }

    // Input

    /// Feed one input event. Events from the inactive source are ignored.
    pub fn handle_input(&mut self, event: InputEvent) -> SessionResult<()> {
        if self.state.is_restoring() {
            log::trace!("Restore pending, queueing {:?}", event);
            self.queue.push_back(Request::Input(event));
            return Ok(());
        }

        match (self.input_mode, event) {
            (InputMode::Mouse, InputEvent::PointerDown { position }) => {
                self.finalize_open(Finish::Raw)?;
                self.begin_stroke(position)
            }
            (InputMode::Mouse, InputEvent::PointerMove { position }) => self.extend_stroke(position),
            (InputMode::Mouse, InputEvent::PointerUp) => self.finalize_open(Finish::Recognize),
            // Leaving the canvas keeps the raw ink, like a mouse-out would.
            (InputMode::Mouse, InputEvent::PointerLeave) => self.finalize_open(Finish::Raw),
            (InputMode::Hand, InputEvent::Gesture(message)) => self.handle_gesture(message),
            (mode, event) => {
                log::trace!("Ignoring {:?} in {:?} mode", event, mode);
                Ok(())
            }
        }
    }

    fn handle_gesture(&mut self, message: GestureMessage) -> SessionResult<()> {
        let size = self.canvas_size();
        let Some(position) = message.position(size.x, size.y) else {
            // No hand visible
            return self.finalize_open(Finish::Recognize);
        };

        match message.gesture {
            Gesture::Draw => {
                if self.state.is_gesture_erasing() {
                    self.commit_erase_run()?;
                }
                if self.state.is_drawing() {
                    self.extend_stroke(position)
                } else {
                    self.begin_stroke(position)
                }
            }
            Gesture::Erase => {
                if self.state.is_drawing() {
                    self.finalize_open(Finish::Raw)?;
                }
                let half = self.gesture_erase_size / 2.0;
                self.raster
                    .clear_rect(Rect::from_center_size(position, Vec2::splat(half * 2.0)));
                self.state = SessionState::GestureErasing;
                Ok(())
            }
            Gesture::Other(_) => self.finalize_open(Finish::Recognize),
        }
    }

    /// Commit an open stroke or erase run. Used by every path that ends
    /// input (pointer up or leave, lost hand, neutral gesture, mode switch).
    pub fn flush(&mut self) -> SessionResult<()> {
        if self.state.is_restoring() {
            return Ok(());
        }
        self.finalize_open(Finish::Raw)
    }

    fn finalize_open(&mut self, finish: Finish) -> SessionResult<()> {
        match &self.state {
            SessionState::Drawing(_) => self.end_stroke(finish),
            SessionState::GestureErasing => self.commit_erase_run(),
            SessionState::Idle | SessionState::Restoring(_) => Ok(()),
        }
    }

    fn begin_stroke(&mut self, position: Pos2) -> SessionResult<()> {
        let tool = self.tools.tool();
        let detect = self.tools.shape_detection() && !tool.is_eraser();

        let mut stroke = MutableStroke::new(tool, self.tools.color(), self.tools.width());
        let mut renderer = StrokeRenderer::new(RenderVariant::from(tool), self.tools.color(), self.tools.width());
        let before = detect.then(|| self.raster.clone());

        stroke.add_point(position);
        renderer.extend(&mut self.raster, stroke.points())?;

        log::debug!("Stroke started with {} at {:?}", tool.name(), position);
        self.state = SessionState::Drawing(ActiveStroke {
            stroke,
            renderer,
            before,
        });
        self.event_bus.emit(EditorEvent::StrokeStarted { tool });
        Ok(())
    }

    fn extend_stroke(&mut self, position: Pos2) -> SessionResult<()> {
        let SessionState::Drawing(active) = &mut self.state else {
            return Ok(());
        };
        active.stroke.add_point(position);
        active.renderer.extend(&mut self.raster, active.stroke.points())?;
        Ok(())
    }

    fn take_active_stroke(&mut self) -> Option<ActiveStroke> {
        if !self.state.is_drawing() {
            return None;
        }
        match std::mem::take(&mut self.state) {
            SessionState::Drawing(active) => Some(active),
            other => {
                self.state = other;
                None
            }
        }
    }

    fn end_stroke(&mut self, finish: Finish) -> SessionResult<()> {
        let Some(ActiveStroke {
            stroke,
            mut renderer,
            before,
        }) = self.take_active_stroke()
        else {
            return Ok(());
        };
        renderer.finish();
        let stroke = stroke.finish();

        if finish == Finish::Recognize {
            if let Some(before) = before {
                if let Some(shape) = self.classifier.classify(stroke.points()) {
                    // Paint onto the pre-stroke copy so a failed render keeps the raw ink.
                    let mut shaped = before;
                    match shape.render(&mut shaped, stroke.color(), stroke.width()) {
                        Ok(()) => {
                            log::info!("Recognized {} from {} points", shape.kind(), stroke.len());
                            self.raster = shaped;
                            self.commit()?;
                            self.event_bus.emit(EditorEvent::ShapeRecognized { kind: shape.kind() });
                            return Ok(());
                        }
                        Err(err) => log::warn!("Could not draw recognized {}: {}", shape.kind(), err),
                    }
                } else {
                    log::debug!("No shape recognized in {} points", stroke.len());
                }
            }
        }

        if !renderer.has_painted() {
            log::debug!("Stroke left no ink, nothing to commit");
            return Ok(());
        }

        self.commit()?;
        self.event_bus.emit(EditorEvent::StrokeCommitted {
            tool: stroke.tool(),
            points: stroke.len(),
        });
        Ok(())
    }

    fn commit_erase_run(&mut self) -> SessionResult<()> {
        if self.state.is_gesture_erasing() {
            self.state = SessionState::Idle;
            self.commit()?;
        }
        Ok(())
    }

    /// Capture the raster into history.
    fn commit(&mut self) -> SessionResult<()> {
        let snapshot = Snapshot::capture(&self.raster).map_err(SessionError::Capture)?;
        self.history.push(snapshot);
        self.emit_history_changed();
        Ok(())
    }

    fn emit_history_changed(&self) {
        self.event_bus.emit(EditorEvent::HistoryChanged {
            cursor: self.history.cursor(),
            len: self.history.len(),
        });
    }

    // History

    /// Step back one snapshot. Returns `false` when already at the oldest
    /// entry. The raster changes once the decode completes.
    pub fn undo(&mut self) -> SessionResult<bool> {
        if self.state.is_restoring() {
            self.queue.push_back(Request::Undo);
            return Ok(true);
        }
        self.finalize_open(Finish::Raw)?;

        let Some((index, snapshot)) = self.history.undo_target() else {
            return Ok(false);
        };
        log::info!("Undo to {}/{}", index, self.history.len());
        self.state = begin_restore(snapshot, RestoreTarget::Cursor(index));
        Ok(true)
    }

    /// Step forward one snapshot. Returns `false` at the newest entry.
    pub fn redo(&mut self) -> SessionResult<bool> {
        if self.state.is_restoring() {
            self.queue.push_back(Request::Redo);
            return Ok(true);
        }
        self.finalize_open(Finish::Raw)?;

        let Some((index, snapshot)) = self.history.redo_target() else {
            return Ok(false);
        };
        log::info!("Redo to {}/{}", index, self.history.len());
        self.state = begin_restore(snapshot, RestoreTarget::Cursor(index));
        Ok(true)
    }

    /// Erase everything and restart history from a blank canvas.
    pub fn clear(&mut self) -> SessionResult<()> {
        if self.state.is_restoring() {
            self.queue.push_back(Request::Clear);
            return Ok(());
        }
        // An open stroke or erase run is dropped along with the ink.
        self.state = SessionState::Idle;

        self.raster.clear();
        let blank = Snapshot::capture(&self.raster).map_err(SessionError::Capture)?;
        self.history.clear_with(blank);

        log::info!("Canvas cleared");
        self.event_bus.emit(EditorEvent::Cleared);
        self.emit_history_changed();
        Ok(())
    }

    /// Resize the canvas, keeping pixels anchored at the origin.
    pub fn resize(&mut self, width: u32, height: u32) -> SessionResult<()> {
        if self.state.is_restoring() {
            self.queue.push_back(Request::Resize(width, height));
            return Ok(());
        }
        if width == self.raster.width() && height == self.raster.height() {
            return Ok(());
        }
        self.finalize_open(Finish::Raw)?;
        self.raster.resize(width, height)?;
        self.grid.invalidate();
        log::debug!("Canvas resized to {}x{}", width, height);
        Ok(())
    }

    /// Apply a finished decode if there is one, without blocking.
    ///
    /// Returns `Ok(true)` once no restore is pending.
    pub fn poll(&mut self) -> SessionResult<bool> {
        let result = match &mut self.state {
            SessionState::Restoring(pending) => match pending.receiver.try_recv() {
                Ok(Some(result)) => result,
                Ok(None) => return Ok(false),
                Err(_canceled) => Err(SnapshotError::Cancelled),
            },
            _ => return Ok(true),
        };

        let restored = self.finish_restore(result);
        let drained = self.drain_queue();
        restored.and(drained)?;
        Ok(!self.state.is_restoring())
    }

    /// Wait until every pending restore and queued request has been applied.
    ///
    /// The first error is returned after the queue has been fully drained.
    pub async fn settle(&mut self) -> SessionResult<()> {
        let mut first_error = None;
        loop {
            let result = match &mut self.state {
                SessionState::Restoring(pending) => match (&mut pending.receiver).await {
                    Ok(result) => result,
                    Err(_canceled) => Err(SnapshotError::Cancelled),
                },
                _ => break,
            };

            if let Err(err) = self.finish_restore(result) {
                first_error.get_or_insert(err);
            }
            if let Err(err) = self.drain_queue() {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn finish_restore(&mut self, result: SnapshotResult<Pixmap>) -> SessionResult<()> {
        let PendingRestore { target, snapshot_id, .. } = match std::mem::take(&mut self.state) {
            SessionState::Restoring(pending) => pending,
            other => {
                self.state = other;
                return Ok(());
            }
        };

        let pixmap = match result {
            Ok(pixmap) => pixmap,
            Err(source) => {
                log::error!("Restore of snapshot {} failed: {}", snapshot_id, source);
                self.event_bus.emit(EditorEvent::RestoreFailed {
                    snapshot: snapshot_id,
                    reason: source.to_string(),
                });
                return Err(SessionError::Restore { id: snapshot_id, source });
            }
        };

        self.raster.replace_with(&pixmap);
        match target {
            RestoreTarget::Cursor(index) => {
                self.history.set_cursor(index);
            }
            RestoreTarget::Reset(snapshot) => {
                // A drawing saved at another size no longer matches the canvas.
                let initial = if snapshot.width() == self.raster.width() && snapshot.height() == self.raster.height() {
                    snapshot
                } else {
                    Snapshot::capture(&self.raster).map_err(SessionError::Capture)?
                };
                self.history.clear_with(initial);
                log::info!("Loaded saved drawing");
                self.event_bus.emit(EditorEvent::DrawingLoaded);
            }
        }
        self.emit_history_changed();
        Ok(())
    }

    /// Replay queued requests until the queue is empty or one of them starts
    /// another restore.
    fn drain_queue(&mut self) -> SessionResult<()> {
        let mut first_error = None;
        while !self.state.is_restoring() {
            let Some(request) = self.queue.pop_front() else {
                break;
            };
            let result = match request {
                Request::Input(event) => self.handle_input(event),
                Request::Undo => self.undo().map(|_| ()),
                Request::Redo => self.redo().map(|_| ()),
                Request::Clear => self.clear(),
                Request::Load(snapshot) => {
                    self.request_load(snapshot);
                    Ok(())
                }
                Request::Save => self.save_drawing(),
                Request::Resize(width, height) => self.resize(width, height),
                Request::SetInputMode(mode) => self.set_input_mode(mode),
            };
            if let Err(err) = result {
                log::error!("Queued request failed: {}", err);
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    // Persistence

    /// Store the current ink under the saved-drawing key.
    pub fn save_drawing(&mut self) -> SessionResult<()> {
        if self.state.is_restoring() {
            self.queue.push_back(Request::Save);
            return Ok(());
        }
        let png = encode_png(self.raster.pixmap()).map_err(SessionError::Capture)?;
        self.store.save(SAVED_DRAWING_KEY, &png)?;
        self.event_bus.emit(EditorEvent::DrawingSaved);
        Ok(())
    }

    /// Restore the saved drawing as the only history entry.
    ///
    /// Returns `Ok(false)` when nothing was saved.
    pub fn load_drawing(&mut self) -> SessionResult<bool> {
        let Some(bytes) = self.store.load(SAVED_DRAWING_KEY)? else {
            log::info!("No saved drawing");
            return Ok(false);
        };
        let snapshot = Snapshot::from_png(bytes).map_err(SessionError::InvalidDrawing)?;

        if self.state.is_restoring() {
            self.queue.push_back(Request::Load(snapshot));
        } else {
            self.request_load(snapshot);
        }
        Ok(true)
    }

    fn request_load(&mut self, snapshot: Snapshot) {
        // The loaded drawing replaces whatever was in progress.
        self.state = begin_restore(&snapshot, RestoreTarget::Reset(snapshot.clone()));
    }

    // Output

    /// What the user sees: the ink with the grid on top when enabled.
    pub fn frame(&mut self) -> SessionResult<Pixmap> {
        let mut frame = self.raster.clone();
        if self.tools.grid() {
            let overlay = self.grid.overlay(frame.width(), frame.height())?;
            frame.composite(overlay);
        }
        Ok(frame.pixmap().clone())
    }

    /// PNG of the visible frame, for download.
    pub fn export_png(&mut self) -> SessionResult<Vec<u8>> {
        let frame = self.frame()?;
        encode_png(&frame).map_err(SessionError::Capture)
    }

    /// The ink flattened on white, as handed to text recognition.
    pub fn recognition_png(&self) -> SessionResult<Vec<u8>> {
        encode_png(&self.raster.flattened_on(Color32::WHITE)).map_err(SessionError::Capture)
    }
}

fn begin_restore(snapshot: &Snapshot, target: RestoreTarget) -> SessionState {
    SessionState::Restoring(PendingRestore {
        target,
        snapshot_id: snapshot.id(),
        receiver: snapshot.spawn_decode(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventRecorder;
    use egui::pos2;
    use futures::executor::block_on;

    fn session() -> (DrawingSession, EventRecorder) {
        let session = DrawingSession::new(200, 150).unwrap();
        let recorder = EventRecorder::new();
        session.event_bus().subscribe(Box::new(recorder.clone()));
        (session, recorder)
    }

    fn draw(session: &mut DrawingSession, points: &[Pos2]) {
        session
            .handle_input(InputEvent::PointerDown { position: points[0] })
            .unwrap();
        for p in &points[1..] {
            session.handle_input(InputEvent::PointerMove { position: *p }).unwrap();
        }
        session.handle_input(InputEvent::PointerUp).unwrap();
    }

    fn horizontal(y: f32) -> Vec<Pos2> {
        (0..8).map(|i| pos2(20.0 + i as f32 * 15.0, y)).collect()
    }

    #[test]
    fn test_stroke_commits_snapshot() {
        let (mut session, recorder) = session();
        draw(&mut session, &horizontal(40.0));

        assert_eq!(session.history().len(), 2);
        assert!(!session.raster().is_blank());
        assert!(recorder.drain().contains(&EditorEvent::StrokeCommitted {
            tool: Tool::Pencil,
            points: 8
        }));
    }

    #[test]
    fn test_click_without_ink_is_not_committed() {
        let (mut session, _) = session();
        draw(&mut session, &[pos2(10.0, 10.0), pos2(11.0, 10.0)]);
        assert_eq!(session.history().len(), 1);
        assert!(session.state().is_idle());
    }

    #[test]
    fn test_undo_waits_for_decode() {
        let (mut session, _) = session();
        draw(&mut session, &horizontal(40.0));

        assert!(session.undo().unwrap());
        assert!(session.is_restoring());
        // The cursor only moves once the pixels are back.
        assert_eq!(session.history().cursor(), 1);

        block_on(session.settle()).unwrap();
        assert_eq!(session.history().cursor(), 0);
        assert!(session.raster().is_blank());

        assert!(!session.undo().unwrap());
    }

    #[test]
    fn test_input_during_restore_is_queued_in_order() {
        let (mut session, _) = session();
        draw(&mut session, &horizontal(40.0));
        session.undo().unwrap();

        // A new stroke arriving mid-restore must land after the undo.
        draw(&mut session, &horizontal(100.0));
        assert_eq!(session.queued(), 9);
        assert_eq!(session.history().len(), 2);

        block_on(session.settle()).unwrap();
        assert_eq!(session.queued(), 0);
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history().cursor(), 1);
        assert_eq!(session.raster().alpha_at(50, 40), Some(0));
        assert!(session.raster().alpha_at(50, 100).unwrap() > 0);
    }

    #[test]
    fn test_pointer_leave_keeps_raw_ink() {
        let (mut session, recorder) = session();
        session.set_shape_detection(true).unwrap();

        let points: Vec<Pos2> = (0..=20).map(|i| pos2(10.0 + i as f32 * 8.0, 60.0)).collect();
        session
            .handle_input(InputEvent::PointerDown { position: points[0] })
            .unwrap();
        for p in &points[1..] {
            session.handle_input(InputEvent::PointerMove { position: *p }).unwrap();
        }
        session.handle_input(InputEvent::PointerLeave).unwrap();

        let events = recorder.drain();
        assert!(!events.iter().any(|e| matches!(e, EditorEvent::ShapeRecognized { .. })));
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn test_pointer_events_ignored_in_hand_mode() {
        let (mut session, _) = session();
        session.set_input_mode(InputMode::Hand).unwrap();
        draw(&mut session, &horizontal(40.0));
        assert!(session.raster().is_blank());
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_gesture_stroke_and_erase_run() {
        let (mut session, _) = session();
        session.set_input_mode(InputMode::Hand).unwrap();

        for i in 0..8 {
            let x = 0.1 + i as f32 * 0.05;
            session
                .handle_input(InputEvent::Gesture(GestureMessage::new(x, 0.5, Gesture::Draw)))
                .unwrap();
        }
        // Lost hand finalizes the stroke.
        session.handle_input(InputEvent::Gesture(GestureMessage::lost())).unwrap();
        assert_eq!(session.history().len(), 2);
        assert!(session.state().is_idle());

        let y = 0.5;
        for x in [0.2, 0.25, 0.3] {
            session
                .handle_input(InputEvent::Gesture(GestureMessage::new(x, y, Gesture::Erase)))
                .unwrap();
        }
        assert!(session.state().is_gesture_erasing());
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.raster().alpha_at(50, 75), Some(0));

        session
            .handle_input(InputEvent::Gesture(GestureMessage::new(0.5, 0.5, Gesture::Other("none".into()))))
            .unwrap();
        assert_eq!(session.history().len(), 3);
        assert!(session.state().is_idle());
    }

    #[test]
    fn test_clear_resets_history() {
        let (mut session, recorder) = session();
        draw(&mut session, &horizontal(40.0));
        draw(&mut session, &horizontal(80.0));
        session.clear().unwrap();

        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history().cursor(), 0);
        assert!(session.raster().is_blank());
        assert!(recorder.drain().contains(&EditorEvent::Cleared));
    }

    #[test]
    fn test_frame_has_grid_raster_does_not() {
        let (mut session, recorder) = session();
        session.set_grid(true);

        let frame = session.frame().unwrap();
        assert!(frame.pixel(0, 5).unwrap().alpha() > 0);
        assert!(session.raster().is_blank());

        session.set_grid(false);
        let frame = session.frame().unwrap();
        assert_eq!(frame.pixel(0, 5).unwrap().alpha(), 0);
        assert_eq!(
            recorder.drain(),
            vec![
                EditorEvent::GridToggled { enabled: true },
                EditorEvent::GridToggled { enabled: false }
            ]
        );
    }

    #[test]
    fn test_save_and_load_drawing() {
        let (mut session, recorder) = session();
        assert!(!session.load_drawing().unwrap());

        draw(&mut session, &horizontal(40.0));
        session.save_drawing().unwrap();
        let saved = session.raster().data().to_vec();

        session.clear().unwrap();
        assert!(session.load_drawing().unwrap());
        block_on(session.settle()).unwrap();

        assert_eq!(session.raster().data(), &saved[..]);
        assert_eq!(session.history().len(), 1);
        assert!(recorder.drain().contains(&EditorEvent::DrawingLoaded));
    }

    #[test]
    fn test_resize_invalidates_grid_and_keeps_ink() {
        let (mut session, _) = session();
        session.set_grid(true);
        draw(&mut session, &horizontal(40.0));
        session.frame().unwrap();

        session.resize(300, 200).unwrap();
        assert!(!session.grid.is_cached());
        assert_eq!(session.canvas_size(), Vec2::new(300.0, 200.0));
        assert!(session.raster().alpha_at(50, 40).unwrap() > 0);
        assert_eq!(session.frame().unwrap().width(), 300);
    }

    #[test]
    fn test_recognition_png_is_opaque() {
        let (session, _) = session();
        let png = session.recognition_png().unwrap();
        let image = image::load_from_memory(&png).unwrap().to_rgba8();
        assert!(image.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }
}
