use super::{Completion, TextRecognizer};
use crate::Error;
use std::sync::{Arc, Mutex};

pub struct MockTextRecognizer {
    text: String,
    call_count: Arc<Mutex<usize>>,
    should_fail: Arc<Mutex<bool>>,
    abandon: bool,
}

impl MockTextRecognizer {
    pub fn new() -> Self {
        Self {
            text: "mock recognized text".to_string(),
            call_count: Arc::new(Mutex::new(0)),
            should_fail: Arc::new(Mutex::new(false)),
            abandon: false,
        }
    }

    pub fn with_text(mut self, text: String) -> Self {
        self.text = text;
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    /// Drop the completion without ever calling it.
    pub fn with_abandon(mut self, abandon: bool) -> Self {
        self.abandon = abandon;
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Default for MockTextRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRecognizer for MockTextRecognizer {
    fn recognize(&self, _image: Vec<u8>, done: Completion) {
        *self.call_count.lock().unwrap() += 1;

        if self.abandon {
            return;
        }

        if *self.should_fail.lock().unwrap() {
            done(Err(Error::Recognition("Mock failure".to_string())));
        } else {
            done(Ok(self.text.clone()));
        }
    }
}
