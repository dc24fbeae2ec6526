//! Messages from the external hand tracker.
//!
//! The tracker emits one JSON object per line:
//! `{"x": 0.42, "y": 0.17, "gesture": "draw"}`. Coordinates are normalized to
//! the canvas; a `null` coordinate means no hand is visible.

use std::io::BufRead;

use egui::{Pos2, pos2};
use futures::channel::mpsc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GestureError {
    #[error("malformed gesture message: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("gesture stream failed: {0}")]
    Io(#[from] std::io::Error),
}

/// What the tracked hand is doing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Gesture {
    Draw,
    Erase,
    /// Any other label; finalizes the open stroke
    Other(String),
}

impl From<String> for Gesture {
    fn from(label: String) -> Self {
        match label.as_str() {
            "draw" => Gesture::Draw,
            "erase" => Gesture::Erase,
            _ => Gesture::Other(label),
        }
    }
}

impl From<Gesture> for String {
    fn from(gesture: Gesture) -> Self {
        match gesture {
            Gesture::Draw => "draw".to_owned(),
            Gesture::Erase => "erase".to_owned(),
            Gesture::Other(label) => label,
        }
    }
}

impl Default for Gesture {
    fn default() -> Self {
        Gesture::Other("none".to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GestureMessage {
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
    #[serde(default)]
    pub gesture: Gesture,
}

impl GestureMessage {
    pub fn new(x: f32, y: f32, gesture: Gesture) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            gesture,
        }
    }

    /// A "no hand detected" message
    pub fn lost() -> Self {
        Self::default()
    }

    pub fn parse(line: &str) -> Result<Self, GestureError> {
        Ok(serde_json::from_str(line)?)
    }

    /// Canvas position, `None` when either coordinate is missing.
    pub fn position(&self, width: f32, height: f32) -> Option<Pos2> {
        Some(pos2(self.x? * width, self.y? * height))
    }
}

/// Read newline-delimited messages on a background thread.
///
/// Malformed lines are logged and skipped. The stream ends with the reader.
pub fn spawn_feed<R>(reader: R) -> mpsc::UnboundedReceiver<GestureMessage>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded();
    std::thread::spawn(move || {
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    log::error!("{}", GestureError::from(err));
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match GestureMessage::parse(&line) {
                Ok(message) => {
                    if tx.unbounded_send(message).is_err() {
                        break;
                    }
                }
                Err(err) => log::warn!("{}", err),
            }
        }
        log::info!("Gesture feed closed");
    });
    rx
}

/// Take every message already waiting on `feed` without blocking.
///
/// The flag is `true` once the feed has closed and will deliver nothing more.
pub fn drain_feed(feed: &mut mpsc::UnboundedReceiver<GestureMessage>) -> (Vec<GestureMessage>, bool) {
    let mut messages = Vec::new();
    loop {
        match feed.try_recv() {
            Ok(message) => messages.push(message),
            Err(mpsc::TryRecvError::Empty) => return (messages, false),
            Err(mpsc::TryRecvError::Closed) => return (messages, true),
        }
    }
}
