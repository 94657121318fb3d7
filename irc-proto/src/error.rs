//! IRC protocol errors.

use std::io::Error as IoError;
use thiserror::Error;

/// A `Result` type for IRC `ProtocolErrors`.
pub type Result<T> = ::std::result::Result<T, ProtocolError>;

/// An IRC protocol error.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// An internal I/O error.
    #[error("an io error occurred")]
    Io(#[from] IoError),

    /// Error for invalid messages.
    #[error("invalid message: {string}")]
    InvalidMessage {
        /// The string that failed to parse.
        string: String,
        /// The detailed message parsing error.
        #[source]
        cause: MessageParseError,
    },
}

/// Errors that occur when parsing messages.
#[derive(Debug, Error)]
pub enum MessageParseError {
    /// The message was empty.
    #[error("empty message")]
    EmptyMessage,

    /// The command was invalid (i.e. missing).
    #[error("invalid command")]
    InvalidCommand,

    /// The message was longer than [`crate::message::MAX_BYTES`].
    #[error("message exceeded the maximum allowed length")]
    MaxLengthExceeded,

    /// The message was missing its terminating CRLF.
    #[error("message was missing a terminating CRLF")]
    MissingCrLf,

    /// The message had no command after its prefix (or start of line).
    #[error("message was missing a command")]
    MissingCommand,

    /// The mode string was malformed.
    #[error("invalid mode string: {string}")]
    InvalidModeString {
        /// The invalid mode string.
        string: String,
        /// The detailed mode parsing error.
        #[source]
        cause: ModeParseError,
    },

    /// The subcommand used was invalid.
    #[error("invalid {cmd} subcommand: {sub}")]
    InvalidSubcommand {
        /// The command whose invalid subcommand was referenced.
        cmd: &'static str,
        /// The invalid subcommand.
        sub: String,
    },
}

/// Errors that occur while parsing mode strings.
#[derive(Debug, Error)]
pub enum ModeParseError {
    /// Invalid modifier used in a mode string (only + and - are valid).
    #[error("invalid mode modifier: {modifier}")]
    InvalidModeModifier {
        /// The invalid mode modifier.
        modifier: char,
    },

    /// Missing modifier used in a mode string.
    #[error("missing mode modifier")]
    MissingModeModifier,
}
