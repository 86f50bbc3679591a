//! Protocol Commands
//!
//! A [`Command`] is one protocol message in either direction: an ordered list
//! of string tokens. The first token conventionally names the operation
//! (`set`, `note_on`, `fft`, ...) and the rest are positional arguments, but
//! that convention belongs to the Audio Engine: the bridge treats every
//! token as opaque payload and never inspects command semantics.

use std::fmt;

/// One protocol message: an ordered, immutable-once-sent list of tokens.
///
/// Numbers and booleans are stringified by the caller before they become
/// tokens; [`Command::arg`] does this via `Display`, producing canonical
/// decimal and `true`/`false` forms. The codec itself is string-only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Command(Vec<String>);

impl Command {
    /// Create a command with the given name as its first token.
    pub fn new(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    /// Create a command directly from a token list.
    #[must_use]
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        Self(tokens)
    }

    /// Append one positional argument, stringified via `Display`.
    #[must_use]
    pub fn arg(mut self, value: impl fmt::Display) -> Self {
        self.0.push(value.to_string());
        self
    }

    /// The command name (first token), if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// All tokens in order.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    /// Consume the command, yielding its tokens.
    #[must_use]
    pub fn into_tokens(self) -> Vec<String> {
        self.0
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the command has no tokens at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for Command {
    fn from(tokens: Vec<String>) -> Self {
        Self(tokens)
    }
}

impl From<&[&str]> for Command {
    fn from(tokens: &[&str]) -> Self {
        Self(tokens.iter().map(|t| (*t).to_string()).collect())
    }
}

impl FromIterator<String> for Command {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Command {
    /// Human-readable form for logs: tokens joined by spaces, unescaped.
    /// Not the wire form; use [`crate::codec::encode`] for that.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" "))
    }
}
