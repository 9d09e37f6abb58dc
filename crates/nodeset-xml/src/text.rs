/// Character data collected between a start element and its end element.
///
/// Tokenizers may deliver one text node in several fragments; they are
/// concatenated in delivery order. Finished strings are moved out with
/// [`TextBuffer::take`] and owned by whatever consumes them.
#[derive(Debug, Default)]
pub struct TextBuffer {
    buf: String,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop any pending text.
    pub fn begin(&mut self) {
        self.buf.clear();
    }

    pub fn append(&mut self, fragment: &str) {
        self.buf.push_str(fragment);
    }

    /// Return the accumulated text and reset.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.buf)
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
