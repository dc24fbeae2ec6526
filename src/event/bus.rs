use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::event::{EditorEvent, EventHandler};

/// Delivers editor events to every subscribed handler in subscription order.
///
/// Emitting from inside a handler, or from another thread while a dispatch
/// is running, queues the event; it reaches every handler once the current
/// event has been fully delivered. Handlers subscribed during a dispatch
/// start receiving with the next event.
#[derive(Default)]
pub struct EventBus {
    handlers: Mutex<Vec<Box<dyn EventHandler>>>,
    joining: Mutex<Vec<Box<dyn EventHandler>>>,
    queue: Mutex<VecDeque<EditorEvent>>,
    dispatching: AtomicBool,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("queued", &self.queue.lock().len())
            .field("dispatching", &self.dispatching.load(Ordering::Relaxed))
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, handler: Box<dyn EventHandler>) {
        self.joining.lock().push(handler);
    }

    pub fn emit(&self, event: EditorEvent) {
        self.queue.lock().push_back(event);

        loop {
            // Whoever is already dispatching picks the event up.
            if self.dispatching.swap(true, Ordering::AcqRel) {
                return;
            }
            self.dispatch_queued();
            self.dispatching.store(false, Ordering::Release);

            // Something may have been queued after the last pop.
            if self.queue.lock().is_empty() {
                return;
            }
        }
    }

    fn dispatch_queued(&self) {
        while let Some(event) = self.queue.lock().pop_front() {
            let mut handlers = self.handlers.lock();
            handlers.append(&mut self.joining.lock());
            for handler in handlers.iter_mut() {
                handler.handle_event(&event);
            }
        }
    }

    /// Number of subscribed handlers. Must not be called from a handler.
    pub fn handler_count(&self) -> usize {
        self.handlers.lock().len() + self.joining.lock().len()
    }
}
