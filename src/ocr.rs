//! Handwriting recognition through an external OCR engine.

use std::io::Write;
use std::process::{Command, Stdio};

use futures::channel::oneshot;
use futures::future::BoxFuture;
use futures::lock::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("a recognition request is already running")]
    Busy,

    #[error("recognition engine is not available: {0}")]
    Unavailable(#[source] std::io::Error),

    #[error("recognition engine failed: {0}")]
    Engine(String),

    #[error("recognition was cancelled")]
    Cancelled,
}

pub type RecognitionResult<T> = Result<T, RecognitionError>;

/// Anything that turns a PNG of the ink into text.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, png: Vec<u8>) -> BoxFuture<'static, RecognitionResult<String>>;
}

/// Allows a single request at a time and tidies the engine output.
pub struct RecognitionGate<R> {
    recognizer: R,
    in_flight: Mutex<()>,
}

impl<R: TextRecognizer> RecognitionGate<R> {
    pub fn new(recognizer: R) -> Self {
        Self {
            recognizer,
            in_flight: Mutex::new(()),
        }
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    /// Recognize `png`, failing with [`RecognitionError::Busy`] while an
    /// earlier request is still running.
    pub async fn recognize(&self, png: Vec<u8>) -> RecognitionResult<String> {
        let _guard = self.in_flight.try_lock().ok_or(RecognitionError::Busy)?;

        log::info!("Running text recognition on {} bytes", png.len());
        let text = self.recognizer.recognize(png).await?;
        let text = text.trim().to_owned();
        log::info!("Recognized {} characters", text.chars().count());
        Ok(text)
    }
}

/// Runs the `tesseract` command-line tool, feeding the image on stdin.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    program: String,
    language: String,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self {
            program: "tesseract".to_owned(),
            language: "eng".to_owned(),
        }
    }
}

impl TesseractCli {
    pub fn new(program: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            language: language.into(),
        }
    }

    fn run(&self, png: &[u8]) -> RecognitionResult<String> {
        let mut command = Command::new(&self.program);
        command.args(["stdin", "stdout", "-l", &self.language]);
        run_engine(command, png)
    }
}

/// Run `command` with `input` on stdin and return its stdout.
///
/// Stdin is written from a separate thread so a child that starts writing
/// output before it has read all of its input cannot block us.
fn run_engine(mut command: Command, input: &[u8]) -> RecognitionResult<String> {
    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(RecognitionError::Unavailable)?;

    let writer = child.stdin.take().map(|mut stdin| {
        let input = input.to_vec();
        std::thread::spawn(move || stdin.write_all(&input))
    });

    let output = child.wait_with_output().map_err(RecognitionError::Unavailable)?;
    if let Some(writer) = writer {
        match writer.join() {
            Ok(Ok(())) => {}
            // The engine may exit without reading everything; its status decides.
            Ok(Err(err)) if err.kind() == std::io::ErrorKind::BrokenPipe => {}
            Ok(Err(err)) => return Err(RecognitionError::Unavailable(err)),
            Err(_) => return Err(RecognitionError::Engine("stdin writer panicked".to_owned())),
        }
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
        return Err(RecognitionError::Engine(format!("{} ({})", stderr, output.status)));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

impl TextRecognizer for TesseractCli {
    fn recognize(&self, png: Vec<u8>) -> BoxFuture<'static, RecognitionResult<String>> {
        let (tx, rx) = oneshot::channel();
        let engine = self.clone();

        std::thread::spawn(move || {
            let _ = tx.send(engine.run(&png));
        });

        Box::pin(async move { rx.await.map_err(|_| RecognitionError::Cancelled)? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use futures::executor::block_on;
    use parking_lot::Mutex as SyncMutex;

    /// Answers immediately; `None` fails like an engine error
    struct Canned(Option<&'static str>);

    impl TextRecognizer for Canned {
        fn recognize(&self, _png: Vec<u8>) -> BoxFuture<'static, RecognitionResult<String>> {
            let result = self
                .0
                .map(str::to_owned)
                .ok_or_else(|| RecognitionError::Engine("no text found".to_owned()));
            Box::pin(async move { result })
        }
    }

    /// Completes only when the test says so
    #[derive(Default)]
    struct Manual {
        pending: SyncMutex<Option<oneshot::Receiver<String>>>,
    }

    impl TextRecognizer for Manual {
        fn recognize(&self, _png: Vec<u8>) -> BoxFuture<'static, RecognitionResult<String>> {
            let rx = self.pending.lock().take();
            Box::pin(async move {
                match rx {
                    Some(rx) => rx.await.map_err(|_| RecognitionError::Cancelled),
                    None => Err(RecognitionError::Cancelled),
                }
            })
        }
    }

    #[test]
    fn test_result_is_trimmed() {
        let gate = RecognitionGate::new(Canned(Some("  hello world \n\n")));
        assert_eq!(block_on(gate.recognize(Vec::new())).unwrap(), "hello world");
    }

    #[test]
    fn test_engine_failure_releases_gate() {
        let gate = RecognitionGate::new(Canned(None));
        assert!(matches!(
            block_on(gate.recognize(Vec::new())),
            Err(RecognitionError::Engine(_))
        ));
        assert!(matches!(
            block_on(gate.recognize(Vec::new())),
            Err(RecognitionError::Engine(_))
        ));
    }

    #[test]
    fn test_second_request_is_busy() {
        let (tx, rx) = oneshot::channel();
        let manual = Manual::default();
        *manual.pending.lock() = Some(rx);
        let gate = RecognitionGate::new(manual);

        let mut first = Box::pin(gate.recognize(vec![1, 2, 3]));
        assert!((&mut first).now_or_never().is_none());

        let second = gate.recognize(Vec::new()).now_or_never();
        assert!(matches!(second, Some(Err(RecognitionError::Busy))));

        tx.send(" 42 ".to_owned()).unwrap();
        assert_eq!(block_on(first).unwrap(), "42");
    }

    #[test]
    fn test_missing_engine_is_unavailable() {
        let engine = TesseractCli::new("inkshape-no-such-ocr-engine", "eng");
        assert!(matches!(
            block_on(engine.recognize(Vec::new())),
            Err(RecognitionError::Unavailable(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_large_input_is_streamed_while_output_drains() {
        // Far larger than a pipe buffer in both directions.
        let input = vec![b'a'; 1 << 20];
        let output = run_engine(Command::new("cat"), &input).unwrap();
        assert_eq!(output.len(), input.len());
        assert!(output.bytes().all(|b| b == b'a'));
    }
}
