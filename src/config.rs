//! Client configuration, loadable from JSON, TOML, or YAML depending on enabled features.
use std::collections::HashMap;
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error, Result};

/// Which address family to bind the outgoing connection to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AddressFamily {
    /// Let the resolver and OS pick.
    Unspecified,
    /// Force IPv4.
    V4,
    /// Force IPv6.
    V6,
}

impl Default for AddressFamily {
    fn default() -> AddressFamily {
        AddressFamily::Unspecified
    }
}

/// The SASL mechanism to use during authentication.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SaslMechanism {
    /// `AUTHENTICATE PLAIN`, using the configured nickname and password.
    Plain,
    /// `AUTHENTICATE EXTERNAL`, relying on a client TLS certificate.
    External,
}

/// What to do when the requested nickname is already in use at registration time.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NickConflictStrategy {
    /// Append an increasing numeric suffix and retry, truncating the base nick to fit NICKLEN
    /// (e.g. `testbot` -> `testbot1` -> `testbot2`, ...).
    AppendNumber,
    /// Give up and disconnect.
    Abort,
}

impl Default for NickConflictStrategy {
    fn default() -> NickConflictStrategy {
        NickConflictStrategy::AppendNumber
    }
}

/// The kind of proxy, if any, to connect through.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ProxyType {
    /// Connect directly.
    None,
    /// Connect through a SOCKS5 proxy.
    Socks5,
}

impl Default for ProxyType {
    fn default() -> ProxyType {
        ProxyType::None
    }
}

/// WEBIRC credentials, used by bouncers/gateways to forward a user's real connection info.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WebircConfig {
    /// The shared WEBIRC password.
    pub pass: String,
    /// The real client IP address being forwarded.
    pub ip: String,
    /// The username to forward.
    pub user: String,
    /// The real client hostname being forwarded, if known.
    #[cfg_attr(feature = "serde", serde(default))]
    pub host: Option<String>,
}

fn default_port() -> u16 {
    6667
}
fn default_username() -> String {
    "nodebot".to_owned()
}
fn default_real_name() -> String {
    "nodeJS IRC client".to_owned()
}
fn default_channel_prefixes() -> String {
    "&#".to_owned()
}
fn default_message_split() -> usize {
    512
}
fn default_encoding() -> String {
    "UTF-8".to_owned()
}
fn default_retry_count() -> u32 {
    3
}
fn default_retry_delay() -> u32 {
    2
}
fn default_flood_protection_delay() -> u32 {
    1000
}
fn default_connection_timeout() -> u32 {
    180
}
fn default_ping_interval() -> u32 {
    60
}

/// Configuration for connecting to and registering with an IRC server.
///
/// Every field documented in the connection-options table has a `#[serde(default = "...")]`,
/// so a `Config` can be built up incrementally from a partial document, or entirely in code
/// using [`Config::default`].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// The server to connect to.
    #[cfg_attr(feature = "serde", serde(default))]
    pub server: Option<String>,
    /// The port to connect on.
    #[cfg_attr(feature = "serde", serde(default = "default_port"))]
    pub port: u16,
    /// Which address family to bind to.
    #[cfg_attr(feature = "serde", serde(default))]
    pub family: AddressFamily,
    /// The local address to bind the outgoing socket to, if any.
    #[cfg_attr(feature = "serde", serde(default))]
    pub local_address: Option<String>,
    /// The local port to bind the outgoing socket to, if any.
    #[cfg_attr(feature = "serde", serde(default))]
    pub local_port: Option<u16>,

    /// Whether to connect using TLS.
    #[cfg_attr(feature = "serde", serde(default))]
    pub use_ssl: bool,
    /// Tolerate a self-signed server certificate.
    #[cfg_attr(feature = "serde", serde(default))]
    pub self_signed: bool,
    /// Tolerate an expired server certificate.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cert_expired: bool,
    /// A PEM/DER file containing an extra root certificate to trust.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cert_path: Option<String>,
    /// A PKCS#12 archive used for client-certificate (SASL EXTERNAL) authentication.
    #[cfg_attr(feature = "serde", serde(default))]
    pub client_cert_path: Option<String>,
    /// The password protecting `client_cert_path`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub client_cert_pass: Option<String>,

    /// Shuffle resolved DNS addresses to spread load across records (RFC 3484 bypass).
    #[cfg_attr(feature = "serde", serde(default))]
    pub bust_rfc3484: bool,

    /// The server password, sent via `PASS` before registration.
    #[cfg_attr(feature = "serde", serde(default))]
    pub password: String,
    /// The nickname to register with.
    #[cfg_attr(feature = "serde", serde(default))]
    pub nickname: Option<String>,
    /// The username (ident) to register with.
    #[cfg_attr(feature = "serde", serde(default = "default_username"))]
    pub username: String,
    /// The real name to register with.
    #[cfg_attr(feature = "serde", serde(default = "default_real_name"))]
    pub real_name: String,
    /// How to recover when the requested nickname is already in use.
    #[cfg_attr(feature = "serde", serde(default))]
    pub on_nick_conflict: NickConflictStrategy,

    /// Channels to join automatically once the MOTD has been received.
    #[cfg_attr(feature = "serde", serde(default))]
    pub channels: Vec<String>,
    /// Keys for the channels in `channels`, indexed by channel name.
    #[cfg_attr(feature = "serde", serde(default))]
    pub channel_keys: HashMap<String, String>,
    /// Rejoin a channel automatically after being kicked from it.
    #[cfg_attr(feature = "serde", serde(default))]
    pub auto_rejoin: bool,
    /// The channel-name prefix characters recognized absent an ISUPPORT `CHANTYPES`.
    #[cfg_attr(feature = "serde", serde(default = "default_channel_prefixes"))]
    pub channel_prefixes: String,

    /// Number of times to retry connecting before giving up.
    #[cfg_attr(feature = "serde", serde(default = "default_retry_count"))]
    pub retry_count: u32,
    /// Delay, in seconds, between reconnection attempts.
    #[cfg_attr(feature = "serde", serde(default = "default_retry_delay"))]
    pub retry_delay: u32,

    /// Enable flood protection (a fixed delay between queued outgoing messages).
    #[cfg_attr(feature = "serde", serde(default))]
    pub flood_protection: bool,
    /// The delay, in milliseconds, enforced between outgoing messages when flood protection is
    /// enabled.
    #[cfg_attr(feature = "serde", serde(default = "default_flood_protection_delay"))]
    pub flood_protection_delay: u32,

    /// Enable SASL authentication using the given mechanism.
    #[cfg_attr(feature = "serde", serde(default))]
    pub sasl: Option<SaslMechanism>,

    /// Strip IRC color/style control codes from incoming message text.
    #[cfg_attr(feature = "serde", serde(default))]
    pub strip_colors: bool,

    /// The maximum number of bytes, including overhead, allotted to an outgoing line before it
    /// is split.
    #[cfg_attr(feature = "serde", serde(default = "default_message_split"))]
    pub message_split: usize,

    /// The WHATWG encoding label used to transcode the wire protocol.
    #[cfg_attr(feature = "serde", serde(default = "default_encoding"))]
    pub encoding: String,
    /// A fallback encoding used when a line fails to decode as `encoding`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub encoding_fallback: Option<String>,

    /// WEBIRC credentials presented immediately upon connecting.
    #[cfg_attr(feature = "serde", serde(default))]
    pub webirc: Option<WebircConfig>,

    /// Seconds of inactivity from the server tolerated before the connection is considered
    /// dead.
    #[cfg_attr(feature = "serde", serde(default = "default_connection_timeout"))]
    pub connection_timeout: u32,
    /// Seconds of inactivity before a keepalive `PING` is proactively sent.
    #[cfg_attr(feature = "serde", serde(default = "default_ping_interval"))]
    pub ping_interval: u32,

    /// The kind of proxy to connect through.
    #[cfg_attr(feature = "serde", serde(default))]
    pub proxy_type: ProxyType,
    /// The proxy's address.
    #[cfg_attr(feature = "serde", serde(default))]
    pub proxy_server: String,
    /// The proxy's port.
    #[cfg_attr(feature = "serde", serde(default))]
    pub proxy_port: u16,
    /// The username to authenticate to the proxy with.
    #[cfg_attr(feature = "serde", serde(default))]
    pub proxy_username: String,
    /// The password to authenticate to the proxy with.
    #[cfg_attr(feature = "serde", serde(default))]
    pub proxy_password: String,

    /// The value returned by CTCP VERSION, when the `ctcp` feature is enabled.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ctcp_version: Option<String>,
    /// The value returned by CTCP SOURCE.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ctcp_source: Option<String>,
    /// The value returned by CTCP USERINFO.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ctcp_user_info: Option<String>,
    /// The value returned by CTCP FINGER.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ctcp_finger: Option<String>,

    /// Use an in-memory mock connection instead of a real socket. Used by tests.
    #[cfg_attr(feature = "serde", serde(skip, default))]
    pub use_mock_connection: bool,
    /// The bytes the mock connection should report as already received on construction.
    #[cfg_attr(feature = "serde", serde(skip, default))]
    pub mock_initial_value: String,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            server: None,
            port: default_port(),
            family: AddressFamily::default(),
            local_address: None,
            local_port: None,
            use_ssl: false,
            self_signed: false,
            cert_expired: false,
            cert_path: None,
            client_cert_path: None,
            client_cert_pass: None,
            bust_rfc3484: false,
            password: String::new(),
            nickname: None,
            username: default_username(),
            real_name: default_real_name(),
            on_nick_conflict: NickConflictStrategy::default(),
            channels: Vec::new(),
            channel_keys: HashMap::new(),
            auto_rejoin: false,
            channel_prefixes: default_channel_prefixes(),
            retry_count: default_retry_count(),
            retry_delay: default_retry_delay(),
            flood_protection: false,
            flood_protection_delay: default_flood_protection_delay(),
            sasl: None,
            strip_colors: false,
            message_split: default_message_split(),
            encoding: default_encoding(),
            encoding_fallback: None,
            webirc: None,
            connection_timeout: default_connection_timeout(),
            ping_interval: default_ping_interval(),
            proxy_type: ProxyType::default(),
            proxy_server: String::new(),
            proxy_port: 1080,
            proxy_username: String::new(),
            proxy_password: String::new(),
            ctcp_version: None,
            ctcp_source: None,
            ctcp_user_info: None,
            ctcp_finger: None,
            use_mock_connection: false,
            mock_initial_value: String::new(),
        }
    }
}

impl Config {
    /// Loads a `Config` from the given path, dispatching on its extension to whichever of the
    /// `json_config`, `toml_config`, or `yaml_config` features are compiled in.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            #[cfg(feature = "json_config")]
            Some("json") => Ok(serde_json::from_str(&data).map_err(ConfigError::Json)?),
            #[cfg(feature = "toml_config")]
            Some("toml") => Ok(toml::from_str(&data).map_err(ConfigError::Toml)?),
            #[cfg(feature = "yaml_config")]
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&data).map_err(ConfigError::Yaml)?),
            _ => Err(Error::InvalidConfig(ConfigError::UnknownFormat {
                path: path.display().to_string(),
            })),
        }
    }

    /// Returns the configured server, or an error if none was specified.
    pub fn server(&self) -> Result<&str> {
        self.server
            .as_deref()
            .ok_or(Error::NoServerSpecified)
    }

    /// Returns the configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the configured nickname, or an error if none was specified.
    pub fn nickname(&self) -> Result<&str> {
        self.nickname
            .as_deref()
            .ok_or(Error::NoNicknameSpecified)
    }

    /// Returns the configured username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the configured real name.
    pub fn real_name(&self) -> &str {
        &self.real_name
    }

    /// Returns the configured server password.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Returns whether TLS is enabled.
    pub fn use_ssl(&self) -> bool {
        self.use_ssl
    }

    /// Returns the extra trusted root certificate path, if any.
    pub fn cert_path(&self) -> Option<&str> {
        self.cert_path.as_deref()
    }

    /// Returns the client certificate archive path, if any.
    pub fn client_cert_path(&self) -> Option<&str> {
        self.client_cert_path.as_deref()
    }

    /// Returns the client certificate archive password.
    pub fn client_cert_pass(&self) -> &str {
        self.client_cert_pass.as_deref().unwrap_or("")
    }

    /// Returns the WHATWG encoding label to transcode the wire protocol with.
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Returns the configured proxy type.
    pub fn proxy_type(&self) -> &ProxyType {
        &self.proxy_type
    }

    /// Returns the proxy server address.
    pub fn proxy_server(&self) -> &str {
        &self.proxy_server
    }

    /// Returns the proxy server port.
    pub fn proxy_port(&self) -> u16 {
        self.proxy_port
    }

    /// Returns the proxy username, if authenticating.
    pub fn proxy_username(&self) -> &str {
        &self.proxy_username
    }

    /// Returns the proxy password, if authenticating.
    pub fn proxy_password(&self) -> &str {
        &self.proxy_password
    }

    /// Returns whether this config is set up to use an in-memory mock connection.
    pub fn use_mock_connection(&self) -> bool {
        self.use_mock_connection
    }

    /// Returns the initial bytes the mock connection should report as already received.
    pub fn mock_initial_value(&self) -> &str {
        &self.mock_initial_value
    }

    /// Builds a `Config` suitable for tests: a mock connection with a sensible nickname.
    #[cfg(test)]
    pub(crate) fn for_test() -> Config {
        Config {
            nickname: Some("test".to_owned()),
            server: Some("irc.example.com".to_owned()),
            use_mock_connection: true,
            ..Config::default()
        }
    }
}
