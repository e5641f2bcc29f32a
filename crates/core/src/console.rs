//! Display side of the live log: sinks that receive decoded text.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::decode::Utf8StreamDecoder;

/// Receives decoded log text in arrival order.
pub trait ConsoleSink: Send + Sync {
    fn append(&self, text: &str);

    /// Keep the newest output in view. No-op for sinks without a viewport.
    fn scroll_to_end(&self) {}
}

#[derive(Debug, Default)]
struct BufferState {
    text: String,
    scroll_offset: usize,
}

/// Growing in-memory console transcript shared between writers and a view.
#[derive(Debug, Clone, Default)]
pub struct ConsoleBuffer {
    state: Arc<Mutex<BufferState>>,
}

impl ConsoleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, BufferState> {
        self.state.lock().expect("console buffer mutex poisoned")
    }

    pub fn contents(&self) -> String {
        self.state().text.clone()
    }

    pub fn len(&self) -> usize {
        self.state().text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte offset the view is scrolled to.
    pub fn scroll_offset(&self) -> usize {
        self.state().scroll_offset
    }

    pub fn clear(&self) {
        let mut state = self.state();
        state.text.clear();
        state.scroll_offset = 0;
    }
}

impl ConsoleSink for ConsoleBuffer {
    fn append(&self, text: &str) {
        self.state().text.push_str(text);
    }

    fn scroll_to_end(&self) {
        let mut state = self.state();
        state.scroll_offset = state.text.len();
    }
}

impl<T: ConsoleSink + ?Sized> ConsoleSink for Arc<T> {
    fn append(&self, text: &str) {
        (**self).append(text);
    }

    fn scroll_to_end(&self) {
        (**self).scroll_to_end();
    }
}

/// Decodes raw chunks of one connection and appends them to a sink.
pub struct ChunkAppender<S> {
    decoder: Utf8StreamDecoder,
    sink: S,
}

impl<S: ConsoleSink> ChunkAppender<S> {
    pub fn new(sink: S) -> Self {
        Self {
            decoder: Utf8StreamDecoder::new(),
            sink,
        }
    }

    /// Append a chunk verbatim and scroll to the end.
    pub fn push(&mut self, chunk: &[u8]) {
        let text = self.decoder.decode(chunk);
        if !text.is_empty() {
            self.sink.append(&text);
        }
        self.sink.scroll_to_end();
    }

    /// Flush what the decoder still holds at end of stream.
    pub fn finish(&mut self) {
        let tail = self.decoder.finish();
        if !tail.is_empty() {
            self.sink.append(&tail);
            self.sink.scroll_to_end();
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
