//! Prompt matchers.

/// Trait for prompt matching.
pub trait PromptMatcher: Send + Sync {
    /// Returns byte offset where match ends, or None if no match.
    fn find_match(&self, data: &[u8]) -> Option<usize>;

    /// Check if the data matches the pattern.
    fn is_match(&self, data: &[u8]) -> bool {
        self.find_match(data).is_some()
    }

    /// Human readable form, used in timeout errors.
    fn describe(&self) -> String;
}

/// Matches when the text occurs anywhere in the searched data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal(pub String);

impl Literal {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl PromptMatcher for Literal {
    fn find_match(&self, data: &[u8]) -> Option<usize> {
        memchr::memmem::find(data, self.0.as_bytes()).map(|start| start + self.0.len())
    }

    fn describe(&self) -> String {
        self.0.clone()
    }
}

/// Matches a prompt line: the last, unterminated line ends with the marker.
///
/// `switch#` matches `'#'`, while a `#` inside earlier output does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailingPrompt(pub char);

impl PromptMatcher for TrailingPrompt {
    fn find_match(&self, data: &[u8]) -> Option<usize> {
        let line_start = memchr::memrchr(b'\n', data).map_or(0, |i| i + 1);
        let last_line = String::from_utf8_lossy(&data[line_start..]);
        last_line
            .trim_end()
            .ends_with(self.0)
            .then_some(data.len())
    }

    fn describe(&self) -> String {
        format!("prompt ending in '{}'", self.0)
    }
}
