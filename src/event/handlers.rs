use std::sync::Arc;

use parking_lot::Mutex;

use crate::event::{EditorEvent, EventHandler};

/// Writes every event to the log at debug level
#[derive(Debug, Default)]
pub struct LogEventHandler;

impl EventHandler for LogEventHandler {
    fn handle_event(&mut self, event: &EditorEvent) {
        log::debug!("Editor event: {:?}", event);
    }
}

/// Collects events so another owner can drain them later.
///
/// Cloning shares the same buffer.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<EditorEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything recorded so far
    pub fn drain(&self) -> Vec<EditorEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventHandler for EventRecorder {
    fn handle_event(&mut self, event: &EditorEvent) {
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventBus;

    #[test]
    fn test_recorder_receives_in_order() {
        let bus = EventBus::new();
        let recorder = EventRecorder::new();
        bus.subscribe(Box::new(recorder.clone()));
        bus.subscribe(Box::new(LogEventHandler));
        assert_eq!(bus.handler_count(), 2);

        bus.emit(EditorEvent::Cleared);
        bus.emit(EditorEvent::GridToggled { enabled: true });

        assert_eq!(
            recorder.drain(),
            vec![EditorEvent::Cleared, EditorEvent::GridToggled { enabled: true }]
        );
        assert!(recorder.is_empty());
    }
}
