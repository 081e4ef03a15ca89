//! Text recognition engine
//!
//! Recognizers report through a one-shot completion callback. [`recognize_text`]
//! turns that callback into a future so callers can simply await the outcome.

pub mod mock;
pub mod tesseract;

pub use mock::MockTextRecognizer;
pub use tesseract::TesseractEngine;

use crate::{Error, Result};
use tokio::sync::oneshot;

/// Receives the single outcome of a recognition run.
pub type Completion = Box<dyn FnOnce(Result<String>) + Send + 'static>;

pub trait TextRecognizer: Send + Sync {
    /// Start recognizing `image`. `done` must be called at most once; dropping
    /// it without a call counts as a failure.
    fn recognize(&self, image: Vec<u8>, done: Completion);
}

/// Run one recognition and wait for its completion.
pub async fn recognize_text(engine: &dyn TextRecognizer, image: Vec<u8>) -> Result<String> {
    let (tx, rx) = oneshot::channel();

    engine.recognize(
        image,
        Box::new(move |outcome| {
            // Receiver gone means the invocation was dropped; nothing to report to.
            let _ = tx.send(outcome);
        }),
    );

    rx.await.map_err(|_| Error::EngineAbandoned)?
}
