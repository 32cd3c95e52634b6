use thiserror::Error;

/// Errors arising from capture-frame parsing and encoding.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("malformed length for {context}: need {need} bytes, got {got}{}", format_raw_suffix(raw))]
    MalformedLength {
        context: &'static str,
        need: usize,
        got: usize,
        /// Raw segment bytes for debug context.
        raw: Vec<u8>,
    },

    #[error("no decoder for {segment} segment version {version}")]
    UnknownSegmentVersion { segment: String, version: u16 },

    #[error("segment name mismatch (expected {expected}, got {got:?})")]
    NameMismatch { expected: &'static str, got: String },

    #[error("{context} decode consumed {consumed} bytes, expected {expected}{}", format_raw_suffix(raw))]
    BufferUnderflow {
        context: &'static str,
        expected: usize,
        consumed: usize,
        /// Raw segment bytes for debug context.
        raw: Vec<u8>,
    },

    #[error("incompatible SignalMatrix format: {reason}")]
    IncompatibleSignalMatrix { reason: String },

    #[error("unsupported CSI device type 0x{device:04X}")]
    UnsupportedDevice { device: u16 },

    #[error("unsupported layout: {what}")]
    UnsupportedLayout { what: String },

    #[error("invalid segment name: {0}")]
    InvalidName(#[from] std::string::FromUtf8Error),

    #[error("signal matrix file I/O: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// Create a `MalformedLength` error (raw bytes filled in later via `with_raw`).
    pub(crate) fn malformed(context: &'static str, need: usize, got: usize) -> Self {
        Self::MalformedLength { context, need, got, raw: Vec::new() }
    }

    /// Create a `BufferUnderflow` error (raw bytes filled in later via `with_raw`).
    pub(crate) fn underflow(context: &'static str, expected: usize, consumed: usize) -> Self {
        Self::BufferUnderflow { context, expected, consumed, raw: Vec::new() }
    }

    pub(crate) fn signal_matrix(reason: impl Into<String>) -> Self {
        Self::IncompatibleSignalMatrix { reason: reason.into() }
    }

    pub(crate) fn unsupported(what: impl Into<String>) -> Self {
        Self::UnsupportedLayout { what: what.into() }
    }

    /// Attach raw segment bytes to decode-phase errors for diagnostics.
    pub fn with_raw(self, bytes: &[u8]) -> Self {
        match self {
            Self::MalformedLength { context, need, got, .. } => {
                Self::MalformedLength { context, need, got, raw: bytes.to_vec() }
            }
            Self::BufferUnderflow { context, expected, consumed, .. } => {
                Self::BufferUnderflow { context, expected, consumed, raw: bytes.to_vec() }
            }
            other => other,
        }
    }
}

/// Format raw bytes as a suffix like " | 9E 00 03 ..." (empty if no bytes).
fn format_raw_suffix(raw: &[u8]) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let limit = 16;
    let hex: String = raw.iter().take(limit).map(|b| format!("{b:02X}")).collect();
    let ellipsis = if raw.len() > limit { "..." } else { "" };
    format!(" | {hex}{ellipsis}")
}

pub type Result<T> = std::result::Result<T, FrameError>;
