//! Built-in message types.
//!
//! `end`, `log` and `error` carry built-in policy. Any other type name is
//! either claimed by an embedder-supplied handler or treated as an error.

/// The child signalled logical completion of its response.
pub const END: &str = "end";

/// A log entry for the debug sink.
pub const LOG: &str = "log";

/// A diagnostic for the client-facing output.
pub const ERROR: &str = "error";

/// Error code reported when the child could not resolve a dependency.
pub const MODULE_NOT_FOUND: &str = "MODULE_NOT_FOUND";

/// Classification of a message type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    End,
    Log,
    Error,
    /// A type name with no built-in meaning.
    Unknown,
    /// The record carried no string `type` field.
    Untyped,
}

impl MessageKind {
    /// Classify an optional type name.
    pub fn classify(type_name: Option<&str>) -> Self {
        match type_name {
            Some(END) => Self::End,
            Some(LOG) => Self::Log,
            Some(ERROR) => Self::Error,
            Some(_) => Self::Unknown,
            None => Self::Untyped,
        }
    }

    /// Returns true if built-in policy handles this kind as an error.
    pub fn is_error_like(self) -> bool {
        matches!(self, Self::Error | Self::Unknown | Self::Untyped)
    }

    /// Short human-readable name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::End => END,
            Self::Log => LOG,
            Self::Error => ERROR,
            Self::Unknown => "unknown",
            Self::Untyped => "untyped",
        }
    }
}
