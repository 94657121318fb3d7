//! A usable, async IRC client library for Rust.
//!
//! Connect to a server, drive the registration handshake and IRCv3 capability negotiation, and
//! observe everything the server sends as a typed stream of [`client::Event`]s.
//!
//! ```no_run
//! use ircoxide::prelude::*;
//!
//! # async fn run() -> error::Result<()> {
//! let config = Config {
//!     nickname: Some("pickles".to_owned()),
//!     server: Some("irc.example.com".to_owned()),
//!     channels: vec!["#rust-spam".to_owned()],
//!     ..Config::default()
//! };
//!
//! let mut client = Client::new(config).await?;
//! let mut stream = client.stream().unwrap();
//!
//! use futures_util::StreamExt;
//! while let Some(event) = stream.next().await {
//!     if let Event::ChannelMessage { channel, text, .. } = event {
//!         if text.contains("pickles") {
//!             client.send_privmsg(&channel, "Hi!").await?;
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;

pub use irc_proto as proto;

/// Re-exports of the types most commonly needed by an embedder.
pub mod prelude {
    #[cfg(feature = "proxy")]
    pub use crate::config::ProxyType;

    pub use crate::client::{Client, ClientState, Event};
    pub use crate::config::Config;
    pub use crate::error::{self, Error};
    pub use irc_proto::{
        Capability, ChannelExt, ChannelMode, Command, Message, Mode, NegotiationVersion, Prefix,
        Response, UserMode,
    };
}
