//! Unified error types for flv-demux

use std::fmt;
use std::io;

/// Result type alias using the library's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for all demuxing operations
#[derive(Debug)]
pub enum Error {
    /// I/O error while reading from the byte source
    Io(io::Error),
    /// Stream or tag decoding error
    Demux(DemuxError),
    /// Read from the byte source timed out
    Timeout,
    /// Reader was stopped through its stop handle
    Stopped,
    /// Invalid configuration
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Demux(e) => write!(f, "Demux error: {}", e),
            Error::Timeout => write!(f, "Read timed out"),
            Error::Stopped => write!(f, "Reader stopped"),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Demux(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<DemuxError> for Error {
    fn from(err: DemuxError) -> Self {
        Error::Demux(err)
    }
}

/// Errors reported on the demuxer's `Error` channel.
///
/// `Format` is stream-level and halts the demuxer. Every other kind is scoped
/// to the tag that produced it; demuxing resumes with the next tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemuxError {
    /// Bad signature or unsupported file version
    Format(String),
    /// Codec id or sound format outside the supported set
    UnsupportedCodec(String),
    /// AVC or AAC packet type outside the known set
    UnknownPacketType(u8),
    /// Tag type byte that is not audio, video or script
    UnknownTagType(u8),
    /// Payload tag arrived before its configuration record
    MissingConfiguration(&'static str),
    /// A nested structure did not fit or did not fill its declared length
    TruncatedRecord(&'static str),
    /// NALU length prefix width outside {1, 3, 4}
    UnsupportedLengthSize(u8),
    /// ADTS frame length does not fit in 13 bits
    AdtsFrameTooLarge(usize),
    /// Failure reported by the byte source driving the demuxer
    Transport(String),
}

impl DemuxError {
    /// Whether the error invalidates the rest of the stream
    pub fn is_fatal(&self) -> bool {
        matches!(self, DemuxError::Format(_))
    }
}

impl fmt::Display for DemuxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemuxError::Format(msg) => write!(f, "Invalid FLV stream: {}", msg),
            DemuxError::UnsupportedCodec(c) => write!(f, "Unsupported codec: {}", c),
            DemuxError::UnknownPacketType(t) => write!(f, "Unknown packet type: {}", t),
            DemuxError::UnknownTagType(t) => write!(f, "Unknown tag type: {}", t),
            DemuxError::MissingConfiguration(what) => {
                write!(f, "Missing configuration: no {} received yet", what)
            }
            DemuxError::TruncatedRecord(what) => write!(f, "Truncated record: {}", what),
            DemuxError::UnsupportedLengthSize(n) => {
                write!(f, "Unsupported NALU length size: {} bytes", n)
            }
            DemuxError::AdtsFrameTooLarge(len) => {
                write!(f, "ADTS frame too large: {} bytes (max 8191)", len)
            }
            DemuxError::Transport(msg) => write!(f, "Transport error: {}", msg),
        }
    }
}

impl std::error::Error for DemuxError {}
