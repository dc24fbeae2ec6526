use egui::{Context, PointerButton, Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

mod gesture;

pub use gesture::{Gesture, GestureError, GestureMessage, drain_feed, spawn_feed};

/// Which input source drives the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InputMode {
    /// Pointer events draw; gesture messages are ignored
    #[default]
    Mouse,
    /// Gesture messages draw; pointer events are ignored
    Hand,
}

/// Canvas input, with positions already in canvas pixels
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Primary button pressed over the canvas
    PointerDown { position: Pos2 },
    /// Pointer moved over the canvas
    PointerMove { position: Pos2 },
    /// Primary button released
    PointerUp,
    /// Pointer left the canvas
    PointerLeave,
    /// Message from the hand tracker
    Gesture(GestureMessage),
}

/// Turns raw egui pointer input over the canvas widget into `InputEvent`s.
#[derive(Debug, Default)]
pub struct InputHandler {
    last_pointer_pos: Option<Pos2>,
    canvas_rect: Option<Rect>,
    canvas_size: Vec2,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Screen rect the canvas is shown in and its size in pixels
    pub fn set_canvas(&mut self, rect: Rect, size: Vec2) {
        self.canvas_rect = Some(rect);
        self.canvas_size = size;
    }

    /// Map a screen position into canvas pixels.
    pub fn to_canvas(&self, screen: Pos2) -> Option<Pos2> {
        let rect = self.canvas_rect?;
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return None;
        }
        let scale = Vec2::new(self.canvas_size.x / rect.width(), self.canvas_size.y / rect.height());
        Some(Pos2::ZERO + (screen - rect.min) * scale)
    }

    fn inside(&self, screen: Pos2) -> bool {
        self.canvas_rect.is_some_and(|rect| rect.contains(screen))
    }

    /// Process this frame's pointer input
    pub fn process_input(&mut self, ctx: &Context) -> Vec<InputEvent> {
        let mut events = Vec::new();

        ctx.input(|input| {
            let hover = input.pointer.hover_pos().filter(|pos| self.inside(*pos));

            if input.pointer.button_pressed(PointerButton::Primary) {
                if let Some(position) = hover.and_then(|pos| self.to_canvas(pos)) {
                    events.push(InputEvent::PointerDown { position });
                }
            }

            match hover {
                Some(pos) => {
                    if Some(pos) != self.last_pointer_pos {
                        if let Some(position) = self.to_canvas(pos) {
                            events.push(InputEvent::PointerMove { position });
                        }
                    }
                    self.last_pointer_pos = Some(pos);
                }
                None => {
                    if self.last_pointer_pos.take().is_some() {
                        events.push(InputEvent::PointerLeave);
                    }
                }
            }

            if input.pointer.button_released(PointerButton::Primary) {
                events.push(InputEvent::PointerUp);
            }
        });

        events
    }
}
