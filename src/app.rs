use std::sync::Arc;

use futures::channel::{mpsc, oneshot};
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::error::SessionResult;
use crate::event::{EditorEvent, EventRecorder, LogEventHandler};
use crate::input::{GestureMessage, InputEvent, InputHandler, InputMode, drain_feed};
use crate::ocr::{RecognitionGate, RecognitionResult, TesseractCli};
use crate::panels::{central_panel, tools_panel};
use crate::state::DrawingSession;
use crate::tool::ToolSettings;

/// UI state kept across restarts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
struct PersistedUi {
    tools: Option<ToolSettings>,
    input_mode: InputMode,
}

/// An action the user can retry after it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retry {
    Recognize,
    Save,
    Load,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub retry: Option<Retry>,
}

pub struct PaintApp {
    pub(crate) session: DrawingSession,
    pub(crate) input: InputHandler,
    texture: Option<egui::TextureHandle>,
    texture_dirty: bool,
    events: EventRecorder,
    gestures: Option<mpsc::UnboundedReceiver<GestureMessage>>,
    ocr: Arc<RecognitionGate<TesseractCli>>,
    ocr_pending: Option<oneshot::Receiver<RecognitionResult<String>>>,
    pub(crate) recognized_text: String,
    pub(crate) status: Option<StatusMessage>,
    pub(crate) last_shape: Option<String>,
}

impl PaintApp {
    /// Called once before the first frame.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        settings: &Settings,
        gestures: Option<mpsc::UnboundedReceiver<GestureMessage>>,
    ) -> SessionResult<Self> {
        let persisted: PersistedUi = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();

        let mut session = DrawingSession::from_settings(settings)?;
        if let Some(tools) = persisted.tools {
            session = session.with_tool_settings(tools);
        }
        session.set_input_mode(persisted.input_mode)?;

        let events = EventRecorder::new();
        session.event_bus().subscribe(Box::new(LogEventHandler));
        session.event_bus().subscribe(Box::new(events.clone()));

        let mut app = Self {
            session,
            input: InputHandler::new(),
            texture: None,
            texture_dirty: true,
            events,
            gestures,
            ocr: Arc::new(RecognitionGate::new(TesseractCli::default())),
            ocr_pending: None,
            recognized_text: String::new(),
            status: None,
            last_shape: None,
        };

        // Pick up where the last run left off.
        let loaded = app.session.load_drawing();
        app.report(loaded, Some(Retry::Load));
        Ok(app)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.texture_dirty = true;
    }

    pub(crate) fn report<T>(&mut self, result: SessionResult<T>, retry: Option<Retry>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                log::error!("{}", err);
                self.status = Some(StatusMessage {
                    text: err.to_string(),
                    retry,
                });
                None
            }
        }
    }

    pub(crate) fn handle_events(&mut self, events: Vec<InputEvent>) {
        if events.is_empty() {
            return;
        }
        for event in events {
            let result = self.session.handle_input(event);
            self.report(result, None);
        }
        self.mark_dirty();
    }

    pub(crate) fn undo(&mut self) {
        let result = self.session.undo();
        self.report(result, None);
    }

    pub(crate) fn redo(&mut self) {
        let result = self.session.redo();
        self.report(result, None);
    }

    pub(crate) fn clear(&mut self) {
        let result = self.session.clear();
        self.report(result, None);
        self.mark_dirty();
    }

    pub(crate) fn save_drawing(&mut self) {
        let result = self.session.save_drawing();
        if self.report(result, Some(Retry::Save)).is_some() {
            self.status = Some(StatusMessage {
                text: "Drawing saved".to_owned(),
                retry: None,
            });
        }
    }

    pub(crate) fn load_drawing(&mut self) {
        let result = self.session.load_drawing();
        if self.report(result, Some(Retry::Load)) == Some(false) {
            self.status = Some(StatusMessage {
                text: "No saved drawing found".to_owned(),
                retry: None,
            });
        }
    }

    pub(crate) fn export_png(&mut self, path: &std::path::Path) {
        let result = self.session.export_png();
        let Some(png) = self.report(result, None) else {
            return;
        };
        self.status = Some(StatusMessage {
            text: match std::fs::write(path, png) {
                Ok(()) => format!("Exported to {}", path.display()),
                Err(err) => format!("Export to {} failed: {}", path.display(), err),
            },
            retry: None,
        });
    }

    pub(crate) fn is_recognizing(&self) -> bool {
        self.ocr_pending.is_some()
    }

    /// Start text recognition on a background thread.
    pub(crate) fn recognize_text(&mut self) {
        if self.is_recognizing() {
            return;
        }
        let result = self.session.recognition_png();
        let Some(png) = self.report(result, Some(Retry::Recognize)) else {
            return;
        };

        let (tx, rx) = oneshot::channel();
        let gate = Arc::clone(&self.ocr);
        std::thread::spawn(move || {
            let _ = tx.send(futures::executor::block_on(gate.recognize(png)));
        });
        self.ocr_pending = Some(rx);
    }

    pub(crate) fn retry(&mut self, action: Retry) {
        self.status = None;
        match action {
            Retry::Recognize => self.recognize_text(),
            Retry::Save => self.save_drawing(),
            Retry::Load => self.load_drawing(),
        }
    }

    fn poll_recognition(&mut self) {
        let Some(pending) = &mut self.ocr_pending else {
            return;
        };
        let result = match pending.try_recv() {
            Ok(Some(result)) => result,
            Ok(None) => return,
            Err(_canceled) => Err(crate::ocr::RecognitionError::Cancelled),
        };
        self.ocr_pending = None;

        match result {
            Ok(text) => self.recognized_text = text,
            Err(err) => {
                log::error!("Text recognition failed: {}", err);
                self.status = Some(StatusMessage {
                    text: format!("Text recognition failed: {}", err),
                    retry: Some(Retry::Recognize),
                });
            }
        }
    }

    fn poll_gestures(&mut self) {
        let Some(feed) = &mut self.gestures else {
            return;
        };
        let (messages, closed) = drain_feed(feed);
        if closed {
            self.gestures = None;
        }
        self.handle_events(messages.into_iter().map(InputEvent::Gesture).collect());
    }

    fn poll_session(&mut self) {
        if !self.session.is_restoring() {
            return;
        }
        let result = self.session.poll();
        self.report(result, None);
        self.mark_dirty();
    }

    fn drain_events(&mut self) {
        for event in self.events.drain() {
            match event {
                EditorEvent::ShapeRecognized { kind } => self.last_shape = Some(kind.to_string()),
                EditorEvent::StrokeCommitted { .. } | EditorEvent::Cleared => self.last_shape = None,
                EditorEvent::RestoreFailed { reason, .. } => {
                    self.status = Some(StatusMessage {
                        text: format!("Could not restore canvas: {}", reason),
                        retry: None,
                    });
                }
                _ => {}
            }
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        use egui::{Key, KeyboardShortcut, Modifiers};

        let undo = KeyboardShortcut::new(Modifiers::COMMAND, Key::Z);
        let redo = KeyboardShortcut::new(Modifiers::COMMAND, Key::Y);
        let redo_shift = KeyboardShortcut::new(Modifiers::COMMAND | Modifiers::SHIFT, Key::Z);
        let save = KeyboardShortcut::new(Modifiers::COMMAND, Key::S);

        // Longest modifier set first, or Ctrl+Z would swallow Ctrl+Shift+Z.
        if ctx.input_mut(|i| i.consume_shortcut(&redo_shift) || i.consume_shortcut(&redo)) {
            self.redo();
        } else if ctx.input_mut(|i| i.consume_shortcut(&undo)) {
            self.undo();
        }
        if ctx.input_mut(|i| i.consume_shortcut(&save)) {
            self.save_drawing();
        }
    }

    /// Canvas texture, re-uploaded when the frame changed.
    pub(crate) fn canvas_texture(&mut self, ctx: &egui::Context) -> Option<egui::TextureId> {
        if self.texture_dirty || self.texture.is_none() {
            let frame = self.session.frame();
            let frame = self.report(frame, None)?;
            let image = egui::ColorImage::from_rgba_premultiplied(
                [frame.width() as usize, frame.height() as usize],
                frame.data(),
            );
            match &mut self.texture {
                Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                None => self.texture = Some(ctx.load_texture("canvas", image, egui::TextureOptions::LINEAR)),
            }
            self.texture_dirty = false;
        }
        self.texture.as_ref().map(|texture| texture.id())
    }
}

impl eframe::App for PaintApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let persisted = PersistedUi {
            tools: Some(self.session.tools().clone()),
            input_mode: self.session.input_mode(),
        };
        eframe::set_value(storage, eframe::APP_KEY, &persisted);
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_session();
        self.poll_gestures();
        self.poll_recognition();
        self.handle_shortcuts(ctx);

        tools_panel(self, ctx);
        central_panel(self, ctx);

        self.drain_events();

        // Background work finishes without any input to wake us up.
        if self.session.is_restoring() || self.is_recognizing() || self.gestures.is_some() {
            ctx.request_repaint();
        }
    }
}
