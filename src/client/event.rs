//! The typed event bus: the strongly-typed stream of events a `Client` emits to its embedder.
use irc_proto::Message;

use crate::client::state::WhoisResponse;

/// A single IRC-level event surfaced to the embedder.
///
/// Per-channel variants are not modelled as distinct enum cases; instead the channel name (or
/// target) is carried as a field, and callers filter on it themselves. Where the original
/// channel name and its case-folded form differ, both `Message` (where applicable) and these
/// structured events always carry the server's original-case name.
#[derive(Clone, Debug)]
pub enum Event {
    /// `RPL_WELCOME` was received; registration is complete.
    Registered,
    /// The underlying socket connected (before registration completes).
    Connect,
    /// The connection was lost or could not be (re-)established; carries the retry attempt.
    Abort {
        /// How many reconnect attempts have been made so far.
        retry_count: u32,
    },
    /// A server-side protocol error numeric (4xx/5xx) was received.
    Error(Message),
    /// A transport-level I/O error occurred.
    NetError(String),

    /// A `NOTICE` was received.
    Notice {
        from: Option<String>,
        target: String,
        text: String,
    },
    /// A `PRIVMSG` to a channel.
    ChannelMessage {
        from: String,
        channel: String,
        text: String,
    },
    /// A `PRIVMSG` addressed directly to us.
    PrivateMessage { from: String, text: String },
    /// A CTCP ACTION (`/me`).
    Action {
        from: String,
        target: String,
        text: String,
    },
    /// Any CTCP query or reply, before kind-specific dispatch.
    Ctcp {
        from: String,
        target: String,
        kind: String,
        text: String,
    },
    /// A CTCP VERSION query specifically (also reported via `Ctcp`).
    CtcpVersion { from: String },
    /// A message we sent ourselves (loopback via `echo-message`, or a local echo).
    SelfMessage { target: String, text: String },

    /// A user joined a channel.
    Join { nickname: String, channel: String },
    /// A user left a channel.
    Part {
        nickname: String,
        channel: String,
        message: Option<String>,
    },
    /// A user was kicked from a channel.
    Kick {
        by: String,
        channel: String,
        nickname: String,
        comment: Option<String>,
    },
    /// A user was KILLed from the server.
    Kill {
        by: String,
        nickname: String,
        comment: Option<String>,
    },
    /// A user disconnected from the server.
    Quit {
        nickname: String,
        message: Option<String>,
    },
    /// A user changed their nickname.
    Nick { old_nick: String, new_nick: String },
    /// We were invited to a channel.
    Invite { by: String, channel: String },
    /// A channel's topic was reported or changed.
    Topic {
        channel: String,
        topic: Option<String>,
    },
    /// The full `NAMES` list for a channel has been received.
    Names {
        channel: String,
        names: Vec<String>,
    },

    /// A channel or user mode was set.
    PlusMode {
        target: String,
        by: Option<String>,
        mode: char,
        argument: Option<String>,
    },
    /// A channel or user mode was unset.
    MinusMode {
        target: String,
        by: Option<String>,
        mode: char,
        argument: Option<String>,
    },
    /// The full current mode string for a channel, in response to a `MODE` query.
    ModeIs { channel: String, mode: String },

    /// One line of the MOTD.
    Motd(String),

    /// The start of a `LIST` reply.
    ChannelListStart,
    /// A single channel entry in a `LIST` reply.
    ChannelListItem {
        channel: String,
        visible: u32,
        topic: String,
    },
    /// The end of a `LIST` reply.
    ChannelListEnd,

    /// A completed `WHOIS` accumulation.
    Whois(WhoisResponse),

    /// `RPL_ISUPPORT` was applied; emitted once per coalesced batch.
    Isupport,

    /// SASL authentication completed successfully.
    SaslLoggedIn { account: String },
    /// SASL logged out (e.g. via services).
    SaslLoggedOut,
    /// SASL authentication failed.
    SaslError(String),

    /// A `PING` was received from the server (and answered automatically).
    Ping(String),
    /// A `PONG` was received in response to our own keepalive `PING`.
    Pong(String),

    /// Every parsed inbound line, before any higher-level dispatch.
    Raw(Message),
}
