//! Errors for this library.

use std::io::Error as IoError;

use thiserror::Error;

/// A `Result` type for this crate.
pub type Result<T> = ::std::result::Result<T, Error>;

/// The main crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// An internal I/O error.
    #[error("an io error occurred")]
    Io(#[from] IoError),

    /// An error occurred while parsing or serializing a message.
    #[error("a protocol error occurred")]
    Protocol(#[from] irc_proto::error::ProtocolError),

    /// An error occurred while parsing a configuration file.
    #[error("failed to parse configuration")]
    InvalidConfig(#[from] ConfigError),

    /// A TLS error from the `native-tls`-backed connector.
    #[cfg(feature = "tls-native")]
    #[error("a TLS error occurred")]
    Tls(#[from] native_tls::Error),

    /// TLS was requested, but the crate was built without the `tls-native` feature.
    #[error("TLS support was not compiled in (enable the `tls-native` feature)")]
    TlsUnsupported,

    /// An unknown text encoding was requested.
    #[error("unknown codec {codec}")]
    UnknownCodec {
        /// The unrecognized WHATWG encoding label.
        codec: String,
    },

    /// Encoding or decoding text into/from the requested codec failed.
    #[error("failed to encode {data} as {codec}")]
    CodecFailed {
        /// The name of the encoding that failed.
        codec: &'static str,
        /// The data that failed to transcode.
        data: String,
    },

    /// The connection exceeded its ping timeout without receiving a PONG.
    #[error("connection timed out waiting on a PONG response")]
    PingTimeout,

    /// A mutex or rwlock used for the connection log was poisoned.
    #[error("the connection log was poisoned by an earlier panic")]
    PoisonedLog,

    /// The configuration specifies no server to connect to.
    #[error("configuration did not specify a server")]
    NoServerSpecified,

    /// No nickname was specified, and registration could not proceed.
    #[error("configuration did not specify a nickname")]
    NoNicknameSpecified,

    /// The registration handshake did not complete before the client gave up.
    #[error("registration did not complete: {0}")]
    RegistrationFailed(String),

    /// SASL authentication failed or was aborted by the server.
    #[error("SASL authentication failed: {0}")]
    SaslFailed(String),

    /// The outgoing message channel closed because the client was dropped.
    #[error("client is disconnected")]
    Disconnected,

    /// A channel or nickname was requested that the client does not know about.
    #[error("no such channel or user: {0}")]
    UnknownTarget(String),
}

/// Errors that occur while loading a `Config` from disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("could not read configuration file")]
    Io(#[from] IoError),

    /// The configuration file's extension did not match a compiled-in format.
    #[error("configuration file {path} has an unsupported extension")]
    UnknownFormat {
        /// The path whose extension could not be resolved to a format.
        path: String,
    },

    /// The JSON configuration could not be parsed.
    #[cfg(feature = "json_config")]
    #[error("failed to parse JSON configuration")]
    Json(#[from] serde_json::Error),

    /// The TOML configuration could not be parsed.
    #[cfg(feature = "toml_config")]
    #[error("failed to parse TOML configuration")]
    Toml(#[from] toml::de::Error),

    /// The YAML configuration could not be parsed.
    #[cfg(feature = "yaml_config")]
    #[error("failed to parse YAML configuration")]
    Yaml(#[from] serde_yaml::Error),
}
