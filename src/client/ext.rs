//! Convenience methods for sending common commands.
//!
//! These are inherent methods on [`Client`] rather than a trait: unlike the blocking client this
//! library is descended from (which let multiple client implementations share one trait), a
//! single async [`Client`] type is the only thing that ever needs them. Every method here queues
//! a [`Command`] through [`Client::send`], so ordinary flood protection applies.
//!
//! # Examples
//!
//! ```no_run
//! # use ircoxide::client::Client;
//! # use ircoxide::config::Config;
//! # use ircoxide::error::Result;
//! # async fn run() -> Result<()> {
//! let mut client = Client::new(Config::default()).await?;
//! client.send_cap_req(&[]).await?;
//! client.send_privmsg("#example", "Hello, world!").await?;
//! # Ok(())
//! # }
//! ```
use irc_proto::command::CapSubCommand::{ACK, END, LS, REQ};
use irc_proto::{Capability, Command, Mode, ModeType, NegotiationVersion};

use crate::client::Client;
use crate::error;

impl Client {
    /// Sends a request for a list of server capabilities for a specific IRCv3 version.
    pub async fn send_cap_ls(&mut self, version: NegotiationVersion) -> error::Result<()> {
        self.send(Command::CAP(
            None,
            LS,
            match version {
                NegotiationVersion::V301 => None,
                NegotiationVersion::V302 => Some("302".to_owned()),
            },
            None,
        ))
        .await
    }

    /// Sends an IRCv3 capabilities request for the specified extensions.
    pub async fn send_cap_req(&mut self, extensions: &[Capability]) -> error::Result<()> {
        let exts = extensions
            .iter()
            .map(|c| c.as_ref())
            .collect::<Vec<_>>()
            .join(" ");
        self.send(Command::CAP(None, REQ, None, Some(exts))).await
    }

    /// Acknowledges a set of capabilities on behalf of the server. Rarely needed by a client;
    /// exposed for completeness against bouncers that expect it echoed back.
    pub async fn send_cap_ack(&mut self, extensions: &[Capability]) -> error::Result<()> {
        let exts = extensions
            .iter()
            .map(|c| c.as_ref())
            .collect::<Vec<_>>()
            .join(" ");
        self.send(Command::CAP(None, ACK, None, Some(exts))).await
    }

    /// Sends a `CAP END`, closing capability negotiation.
    pub async fn send_cap_end(&mut self) -> error::Result<()> {
        self.send(Command::CAP(None, END, None, None)).await
    }

    /// Sends a SASL `AUTHENTICATE` message with the specified data.
    pub async fn send_sasl(&mut self, data: &str) -> error::Result<()> {
        self.send(Command::AUTHENTICATE(data.to_owned())).await
    }

    /// Sends a SASL `AUTHENTICATE` request to abort authentication.
    pub async fn send_sasl_abort(&mut self) -> error::Result<()> {
        self.send_sasl("*").await
    }

    /// Sends a `PONG` with the specified message.
    pub async fn send_pong(&mut self, msg: &str) -> error::Result<()> {
        self.send(Command::PONG(msg.to_owned(), None)).await
    }

    /// Joins the specified channel or chanlist.
    pub async fn send_join(&mut self, chanlist: &str) -> error::Result<()> {
        self.send(Command::JOIN(chanlist.to_owned(), None, None)).await
    }

    /// Joins the specified channel or chanlist using the specified key or keylist.
    pub async fn send_join_with_keys(&mut self, chanlist: &str, keylist: &str) -> error::Result<()> {
        self.send(Command::JOIN(chanlist.to_owned(), Some(keylist.to_owned()), None)).await
    }

    /// Parts the specified channel or chanlist.
    pub async fn send_part(&mut self, chanlist: &str) -> error::Result<()> {
        self.send(Command::PART(chanlist.to_owned(), None)).await
    }

    /// Parts the specified channel or chanlist with a message.
    pub async fn send_part_with_message(&mut self, chanlist: &str, message: &str) -> error::Result<()> {
        self.send(Command::PART(chanlist.to_owned(), Some(message.to_owned()))).await
    }

    /// Attempts to oper up using the specified username and password.
    pub async fn send_oper(&mut self, username: &str, password: &str) -> error::Result<()> {
        self.send(Command::OPER(username.to_owned(), password.to_owned())).await
    }

    /// Sends a message to the specified target, splitting it across multiple lines per the
    /// configured `message_split` budget.
    pub async fn send_privmsg(&mut self, target: &str, message: &str) -> error::Result<()> {
        for line in self.split_for_target(target, message) {
            self.send(Command::PRIVMSG(target.to_owned(), line)).await?;
        }
        Ok(())
    }

    /// Sends a notice to the specified target, splitting it across multiple lines per the
    /// configured `message_split` budget.
    pub async fn send_notice(&mut self, target: &str, message: &str) -> error::Result<()> {
        for line in self.split_for_target(target, message) {
            self.send(Command::NOTICE(target.to_owned(), line)).await?;
        }
        Ok(())
    }

    fn split_for_target(&self, target: &str, message: &str) -> Vec<String> {
        let state = self.state();
        let state = state.read();
        let budget = crate::client::send::effective_budget(
            self.config().message_split,
            &state.current_nick,
            state.host_mask.as_deref().unwrap_or(""),
            target,
        );
        crate::client::send::split_message(message, budget)
    }

    /// Sets the topic of a channel, or requests the current one if `topic` is empty.
    pub async fn send_topic(&mut self, channel: &str, topic: &str) -> error::Result<()> {
        self.send(Command::TOPIC(
            channel.to_owned(),
            if topic.is_empty() { None } else { Some(topic.to_owned()) },
        ))
        .await
    }

    /// Kills the target with the provided message.
    pub async fn send_kill(&mut self, target: &str, message: &str) -> error::Result<()> {
        self.send(Command::KILL(target.to_owned(), message.to_owned())).await
    }

    /// Kicks the listed nicknames from the listed channels with a comment. If `message` is
    /// empty, it is omitted.
    pub async fn send_kick(&mut self, chanlist: &str, nicklist: &str, message: &str) -> error::Result<()> {
        self.send(Command::KICK(
            chanlist.to_owned(),
            nicklist.to_owned(),
            if message.is_empty() { None } else { Some(message.to_owned()) },
        ))
        .await
    }

    /// Changes the modes for the specified target.
    pub async fn send_mode<T>(&mut self, target: &str, modes: &[Mode<T>]) -> error::Result<()>
    where
        T: ModeType,
    {
        self.send(T::mode(target, modes)).await
    }

    /// Changes the mode of the target by force. If `modeparams` is empty, it is omitted.
    pub async fn send_samode(&mut self, target: &str, mode: &str, modeparams: &str) -> error::Result<()> {
        self.send(Command::SAMODE(
            target.to_owned(),
            mode.to_owned(),
            if modeparams.is_empty() { None } else { Some(modeparams.to_owned()) },
        ))
        .await
    }

    /// Forces a user to change from the old nickname to the new nickname.
    pub async fn send_sanick(&mut self, old_nick: &str, new_nick: &str) -> error::Result<()> {
        self.send(Command::SANICK(old_nick.to_owned(), new_nick.to_owned())).await
    }

    /// Invites a user to the specified channel.
    pub async fn send_invite(&mut self, nick: &str, chan: &str) -> error::Result<()> {
        self.send(Command::INVITE(nick.to_owned(), chan.to_owned())).await
    }

    /// Quits the server with a message. Defaults to `Leaving` if none is specified.
    pub async fn send_quit(&mut self, msg: &str) -> error::Result<()> {
        self.send(Command::QUIT(Some(if msg.is_empty() {
            "Leaving".to_owned()
        } else {
            msg.to_owned()
        })))
        .await
    }

    /// Sends a CTCP-escaped message to the specified target. Requires the `ctcp` feature.
    #[cfg(feature = "ctcp")]
    pub async fn send_ctcp(&mut self, target: &str, msg: &str) -> error::Result<()> {
        self.send_privmsg(target, &format!("\u{001}{}\u{001}", msg)).await
    }

    /// Sends an action (`/me`) to the specified target. Requires the `ctcp` feature.
    #[cfg(feature = "ctcp")]
    pub async fn send_action(&mut self, target: &str, msg: &str) -> error::Result<()> {
        self.send_ctcp(target, &format!("ACTION {}", msg)).await
    }

    /// Sends a FINGER request to the specified target. Requires the `ctcp` feature.
    #[cfg(feature = "ctcp")]
    pub async fn send_finger(&mut self, target: &str) -> error::Result<()> {
        self.send_ctcp(target, "FINGER").await
    }

    /// Sends a VERSION request to the specified target. Requires the `ctcp` feature.
    #[cfg(feature = "ctcp")]
    pub async fn send_version(&mut self, target: &str) -> error::Result<()> {
        self.send_ctcp(target, "VERSION").await
    }

    /// Sends a SOURCE request to the specified target. Requires the `ctcp` feature.
    #[cfg(feature = "ctcp")]
    pub async fn send_source(&mut self, target: &str) -> error::Result<()> {
        self.send_ctcp(target, "SOURCE").await
    }

    /// Sends a USERINFO request to the specified target. Requires the `ctcp` feature.
    #[cfg(feature = "ctcp")]
    pub async fn send_user_info(&mut self, target: &str) -> error::Result<()> {
        self.send_ctcp(target, "USERINFO").await
    }

    /// Sends a TIME request to the specified target. Requires the `ctcp` feature.
    #[cfg(feature = "ctcp")]
    pub async fn send_time(&mut self, target: &str) -> error::Result<()> {
        self.send_ctcp(target, "TIME").await
    }
}

#[cfg(test)]
mod test {
    use irc_proto::{ChannelMode, Mode};

    use crate::client::Client;
    use crate::config::Config;

    async fn test_client() -> Client {
        Client::new(Config::for_test()).await.unwrap()
    }

    #[tokio::test]
    async fn send_privmsg() {
        let mut client = test_client().await;
        client.send_privmsg("#test", "Hi, everybody!").await.unwrap();
    }

    #[tokio::test]
    async fn send_join() {
        let mut client = test_client().await;
        client.send_join("#test,#test2,#test3").await.unwrap();
    }

    #[tokio::test]
    async fn send_mode() {
        let mut client = test_client().await;
        client
            .send_mode("#test", &[Mode::Plus(ChannelMode::InviteOnly, None)])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn send_quit_defaults_message() {
        let mut client = test_client().await;
        client.send_quit("").await.unwrap();
    }
}
