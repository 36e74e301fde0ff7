//! Error types for the bridge

use std::fmt;

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Bridge error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BridgeError {
    /// A host value has no VM type mapping, or a descriptor was used as a value
    #[error("marshal error: {0}")]
    Marshal(String),

    /// Class, method or field lookup failed without a pending exception
    #[error("resolution error: {0}")]
    Resolution(String),

    /// A Java exception was described to stderr/logcat and cleared
    #[error("Java exception occurred. check stderr/logcat")]
    JavaException,

    /// A Java exception, reported by its `toString()` text
    #[error("{0}")]
    JavaMessage(String),

    /// A Java exception converted into a structured value
    #[error(transparent)]
    Throwable(Box<ThrowableError>),

    /// Building the structured exception value failed
    #[error("failed to convert Java exception: {0}")]
    ThrowableConversion(String),

    /// A call signalled failure but the VM has no pending exception
    #[error("no current exception")]
    NoPendingException,

    /// The caller broke the calling protocol (nil target, unbalanced frame pop)
    #[error("protocol misuse: {0}")]
    ProtocolMisuse(String),

    /// A returned value was requested as the wrong host type
    #[error("unexpected type: expected {expected}, found {found}")]
    UnexpectedType {
        /// Requested host type
        expected: &'static str,
        /// Kind of the value actually returned
        found: &'static str,
    },

    /// Configuration could not be parsed
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl BridgeError {
    /// The structured exception, when the Structured strategy produced this error
    pub fn as_throwable(&self) -> Option<&ThrowableError> {
        match self {
            BridgeError::Throwable(t) => Some(t),
            _ => None,
        }
    }
}

impl From<ThrowableError> for BridgeError {
    fn from(t: ThrowableError) -> Self {
        BridgeError::Throwable(Box::new(t))
    }
}

/// One frame of a Java stack trace
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StackTraceElement {
    pub class_name: String,
    pub file_name: String,
    pub line_number: i32,
    pub method_name: String,
    pub is_native_method: bool,
    pub as_string: String,
}

impl fmt::Display for StackTraceElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string)
    }
}

/// A Java `Throwable` copied into host memory, cause chain included.
///
/// Displays as the throwable's `toString()` text.
#[derive(Debug, Clone, PartialEq, Eq, Default, thiserror::Error)]
#[error("{as_string}")]
pub struct ThrowableError {
    /// Dotted runtime class name, e.g. `java.lang.NoClassDefFoundError`
    pub class_name: String,
    pub localized_message: String,
    pub message: String,
    pub stack_trace: Vec<StackTraceElement>,
    /// `toString()` of the throwable
    pub as_string: String,
    #[source]
    pub cause: Option<Box<ThrowableError>>,
}

impl ThrowableError {
    /// Iterate over this throwable and its causes, outermost first
    pub fn chain(&self) -> impl Iterator<Item = &ThrowableError> {
        std::iter::successors(Some(self), |t| t.cause.as_deref())
    }
}
