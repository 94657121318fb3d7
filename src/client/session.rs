//! The session engine: registration, capability negotiation, SASL, nick-collision recovery, and
//! per-message dispatch into state mutations and embedder-facing events.
use irc_proto::{ChannelExt, CommandType, FormattedStringExt, Message};

use crate::client::caps::SaslState;
use crate::client::event::Event;
use crate::client::send::SendPipeline;
use crate::client::state::{ClientState, WhoisResponse};
use crate::config::{Config, NickConflictStrategy, SaslMechanism, WebircConfig};
use crate::error;

/// Drives registration, capability negotiation, SASL, and per-message IRC semantics on top of a
/// [`ClientState`] and a [`SendPipeline`].
pub struct Session {
    state: ClientState,
    strip_colors: bool,
    on_nick_conflict: NickConflictStrategy,
    auto_rejoin: bool,
    base_nick: String,
    requested_nick: String,
    username: String,
    real_name: String,
    password: String,
    channels: Vec<(String, Option<String>)>,
    sasl: Option<SaslMechanism>,
    sasl_username: String,
    sasl_password: String,
    webirc: Option<WebircConfig>,
    ctcp_version: Option<String>,
    ctcp_source: Option<String>,
    ctcp_user_info: Option<String>,
    ctcp_finger: Option<String>,
}

impl Session {
    /// Builds a new session engine from the given configuration.
    pub fn new(config: &Config) -> error::Result<Session> {
        let nickname = config.nickname()?.to_owned();
        let channels = config
            .channels
            .iter()
            .map(|c| (c.clone(), config.channel_keys.get(c).cloned()))
            .collect();

        Ok(Session {
            state: ClientState::new(&nickname),
            strip_colors: config.strip_colors,
            on_nick_conflict: config.on_nick_conflict.clone(),
            auto_rejoin: config.auto_rejoin,
            base_nick: nickname.clone(),
            requested_nick: nickname,
            username: config.username().to_owned(),
            real_name: config.real_name().to_owned(),
            password: config.password().to_owned(),
            channels,
            sasl: config.sasl,
            sasl_username: config.username().to_owned(),
            sasl_password: config.password().to_owned(),
            webirc: config.webirc.clone(),
            ctcp_version: config.ctcp_version.clone(),
            ctcp_source: config.ctcp_source.clone(),
            ctcp_user_info: config.ctcp_user_info.clone(),
            ctcp_finger: config.ctcp_finger.clone(),
        })
    }

    /// A read-only view of the current session state.
    pub fn state(&self) -> &ClientState {
        &self.state
    }

    /// Sends the initial registration burst: an optional `WEBIRC`, an optional `CAP LS`/`PASS`,
    /// then `NICK`/`USER`.
    pub async fn register(&mut self, send: &mut SendPipeline) -> error::Result<()> {
        if let Some(webirc) = self.webirc.clone() {
            // Wire order is password, gateway, hostname, ip; fall back to the ip itself when no
            // real hostname is known.
            let hostname = webirc.host.clone().unwrap_or_else(|| webirc.ip.clone());
            send.send_parts("WEBIRC", &[&webirc.pass, &webirc.user, &hostname, &webirc.ip]).await?;
        }

        if self.sasl.is_some() {
            self.state.capabilities.begin_negotiation();
            send.send_parts("CAP", &["LS", "302"]).await?;
        }

        if !self.password.is_empty() {
            send.send_parts("PASS", &[&self.password]).await?;
        }

        send.send_parts("NICK", &[&self.requested_nick]).await?;
        send.send_parts("USER", &[&self.username, "0", "*", &self.real_name]).await?;

        Ok(())
    }

    /// Processes one inbound `Message`, mutating session state and the send pipeline as needed,
    /// and returns the embedder-facing events it produced.
    pub async fn handle_message(&mut self, msg: &Message, send: &mut SendPipeline) -> error::Result<Vec<Event>> {
        let mut events = vec![Event::Raw(msg.clone())];
        let was_registered = self.state.registered;

        self.state.handle_message(msg);

        let canonical = msg.canonical_command().into_owned();
        let from = msg.prefix_parts().map(|p| p.nick.to_owned());

        match canonical.as_str() {
            "rpl_welcome" => {
                events.push(Event::Registered);
                let nick = self.state.current_nick.clone();
                send.send_parts("WHOIS", &[&nick]).await?;
                self.join_configured_channels(send).await?;
            }
            "rpl_isupport" => events.push(Event::Isupport),
            "CAP" => {
                self.handle_cap(msg, send).await?;
            }
            "AUTHENTICATE" => {
                self.handle_authenticate_challenge(msg, send).await?;
            }
            "rpl_loggedin" => {
                let account = msg.params().nth(2).unwrap_or("").to_owned();
                events.push(Event::SaslLoggedIn { account });
            }
            "rpl_loggedout" => events.push(Event::SaslLoggedOut),
            "rpl_saslsuccess" => {
                self.state.capabilities.clear_sasl();
                send.send_command(irc_proto::Command::CAP(
                    None,
                    irc_proto::CapSubCommand::END,
                    None,
                    None,
                ))
                .await?;
            }
            "err_saslfail" | "err_sasltoolong" | "err_saslabort" | "err_saslalready" => {
                self.state.capabilities.clear_sasl();
                events.push(Event::SaslError(canonical));
                send.send_command(irc_proto::Command::CAP(
                    None,
                    irc_proto::CapSubCommand::END,
                    None,
                    None,
                ))
                .await?;
            }
            "err_nicknameinuse" | "err_erroneusnickname" | "err_unavailresource" if !was_registered => {
                self.handle_nick_collision(send).await?;
            }
            "PING" => {
                let data = msg.params().next().unwrap_or("").to_owned();
                events.push(Event::Ping(data));
            }
            "PONG" => {
                let data = msg.params().next_back().unwrap_or("").to_owned();
                events.push(Event::Pong(data));
            }
            "JOIN" => {
                if let (Some(nick), Some(chan)) = (&from, msg.params().next()) {
                    events.push(Event::Join {
                        nickname: nick.clone(),
                        channel: chan.to_owned(),
                    });
                }
            }
            "PART" => {
                if let (Some(nick), Some(chan)) = (&from, msg.params().next()) {
                    events.push(Event::Part {
                        nickname: nick.clone(),
                        channel: chan.to_owned(),
                        message: msg.params().nth(1).map(str::to_owned),
                    });
                }
            }
            "KICK" => {
                let mut params = msg.params();
                if let (Some(by), Some(chan), Some(nick)) = (from.clone(), params.next(), params.next()) {
                    let comment = params.next().map(str::to_owned);
                    let rejoin = self.auto_rejoin && nick.eq_ignore_ascii_case(&self.state.current_nick);
                    events.push(Event::Kick {
                        by,
                        channel: chan.to_owned(),
                        nickname: nick.to_owned(),
                        comment,
                    });
                    if rejoin {
                        send.send_parts("JOIN", &[chan]).await?;
                    }
                }
            }
            "QUIT" => {
                if let Some(nick) = &from {
                    events.push(Event::Quit {
                        nickname: nick.clone(),
                        message: msg.params().next().map(str::to_owned),
                    });
                }
            }
            "NICK" => {
                if let (Some(old), Some(new)) = (&from, msg.params().next()) {
                    events.push(Event::Nick {
                        old_nick: old.clone(),
                        new_nick: new.to_owned(),
                    });
                }
            }
            "INVITE" => {
                let mut params = msg.params();
                if let (Some(by), Some(chan)) = (from.clone(), params.nth(1)) {
                    events.push(Event::Invite { by, channel: chan.to_owned() });
                }
            }
            "rpl_topic" | "TOPIC" => {
                let mut params = msg.params();
                if let Some(chan) = params.next() {
                    events.push(Event::Topic {
                        channel: chan.to_owned(),
                        topic: params.next().map(str::to_owned),
                    });
                }
            }
            "rpl_namreply" => {}
            "rpl_endofnames" => {
                if let Some(chan) = msg.params().nth(1) {
                    let key = self.state.case_fold(chan);
                    if let Some(data) = self.state.chans.get(&key) {
                        let mut names: Vec<String> = data
                            .users
                            .iter()
                            .map(|(nick, prefix)| format!("{}{}", prefix, nick))
                            .collect();
                        names.sort();
                        events.push(Event::Names {
                            channel: chan.to_owned(),
                            names,
                        });
                    }
                }
            }
            "rpl_motd" => {
                if let Some(line) = msg.params().next_back() {
                    events.push(Event::Motd(line.to_owned()));
                }
            }
            "rpl_liststart" => events.push(Event::ChannelListStart),
            "rpl_list" => {
                let mut params = msg.params();
                if let Some(chan) = params.next() {
                    let visible = params.next().and_then(|s| s.parse().ok()).unwrap_or(0);
                    let topic = params.next().unwrap_or("").to_owned();
                    events.push(Event::ChannelListItem {
                        channel: chan.to_owned(),
                        visible,
                        topic,
                    });
                }
            }
            "rpl_listend" => events.push(Event::ChannelListEnd),
            "rpl_endofwhois" => {
                if let Some(nick) = msg.params().nth(1) {
                    if let Some(response) = self.take_whois(nick) {
                        events.push(Event::Whois(response));
                    }
                }
            }
            "PRIVMSG" => {
                events.extend(self.handle_privmsg(msg, from.as_deref(), send).await?);
            }
            "NOTICE" => {
                let mut params = msg.params();
                if let (Some(target), Some(text)) = (params.next(), params.next()) {
                    events.push(Event::Notice {
                        from,
                        target: target.to_owned(),
                        text: self.maybe_strip_colors(text),
                    });
                }
            }
            "MODE" => {
                events.extend(self.mode_events(msg, from.as_deref()));
            }
            _ if msg.command_type() == CommandType::Error => {
                events.push(Event::Error(msg.clone()));
            }
            _ => {}
        }

        self.collect_whois(&canonical, msg);

        Ok(events)
    }

    async fn join_configured_channels(&mut self, send: &mut SendPipeline) -> error::Result<()> {
        for (chan, key) in self.channels.clone() {
            match key {
                Some(k) => send.send_parts("JOIN", &[&chan, &k]).await?,
                None => send.send_parts("JOIN", &[&chan]).await?,
            }
        }
        Ok(())
    }

    async fn handle_cap(&mut self, msg: &Message, send: &mut SendPipeline) -> error::Result<()> {
        let mut params = msg.params();
        let _target = params.next();
        let sub = params.next().unwrap_or("");
        let rest: Vec<&str> = params.collect();

        match sub {
            "LS" => {
                let (is_final, caps_line) = match rest.as_slice() {
                    [marker, caps] if *marker == "*" => (false, *caps),
                    [caps] => (true, *caps),
                    _ => (true, ""),
                };
                self.state.capabilities.record_ls(caps_line, is_final);

                if is_final {
                    if self.state.capabilities.supports_sasl() && self.sasl.is_some() {
                        send.send_parts("CAP", &["REQ", "sasl"]).await?;
                    } else {
                        self.state.capabilities.end_negotiation();
                        send.send_command(irc_proto::Command::CAP(
                            None,
                            irc_proto::CapSubCommand::END,
                            None,
                            None,
                        ))
                        .await?;
                    }
                }
            }
            "ACK" => {
                let caps_line = rest.first().copied().unwrap_or("");
                self.state.capabilities.record_ack(caps_line, true);

                if caps_line.split_whitespace().any(|c| c == "sasl") {
                    self.begin_sasl(send).await?;
                }
            }
            "NAK" => {
                let caps_line = rest.first().copied().unwrap_or("");
                self.state.capabilities.record_nak(caps_line);
                self.state.capabilities.end_negotiation();
                send.send_command(irc_proto::Command::CAP(None, irc_proto::CapSubCommand::END, None, None))
                    .await?;
            }
            _ => {}
        }

        Ok(())
    }

    async fn begin_sasl(&mut self, send: &mut SendPipeline) -> error::Result<()> {
        match self.sasl {
            Some(SaslMechanism::Plain) => {
                self.state.capabilities.begin_sasl(SaslState::Plain);
                send.send_parts("AUTHENTICATE", &["PLAIN"]).await
            }
            Some(SaslMechanism::External) => {
                self.state.capabilities.begin_sasl(SaslState::External);
                send.send_parts("AUTHENTICATE", &["EXTERNAL"]).await
            }
            None => Ok(()),
        }
    }

    async fn handle_authenticate_challenge(&mut self, _msg: &Message, send: &mut SendPipeline) -> error::Result<()> {
        match self.state.capabilities.sasl_state() {
            SaslState::Plain => {
                let payload = format!(
                    "{user}\0{user}\0{pass}",
                    user = self.sasl_username,
                    pass = self.sasl_password
                );
                let encoded = base64_encode(payload.as_bytes());
                send.send_parts("AUTHENTICATE", &[&encoded]).await
            }
            SaslState::External => send.send_parts("AUTHENTICATE", &["+"]).await,
            SaslState::Inactive => Ok(()),
        }
    }

    async fn handle_nick_collision(&mut self, send: &mut SendPipeline) -> error::Result<()> {
        match &self.on_nick_conflict {
            NickConflictStrategy::Abort => Err(error::Error::RegistrationFailed(format!(
                "nickname {} is unavailable",
                self.requested_nick
            ))),
            NickConflictStrategy::AppendNumber => {
                self.state.nick_mod += 1;
                self.requested_nick =
                    numbered_nick(&self.base_nick, self.state.nick_mod, self.state.supported.nick_length);
                send.send_parts("NICK", &[&self.requested_nick]).await
            }
        }
    }

    async fn handle_privmsg(
        &mut self,
        msg: &Message,
        from: Option<&str>,
        send: &mut SendPipeline,
    ) -> error::Result<Vec<Event>> {
        let mut params = msg.params();
        let (target, text) = match (params.next(), params.next()) {
            (Some(t), Some(m)) => (t.to_owned(), m),
            _ => return Ok(Vec::new()),
        };
        let from = from.unwrap_or("").to_owned();

        if let Some(ctcp) = parse_ctcp(text) {
            let ctcp = ctcp.to_owned();
            return self.ctcp_events(&from, &target, &ctcp, send).await;
        }

        let text = self.maybe_strip_colors(text);
        Ok(if target.eq_ignore_ascii_case(&self.state.current_nick) {
            vec![Event::PrivateMessage { from, text }]
        } else {
            vec![Event::ChannelMessage {
                from,
                channel: target,
                text,
            }]
        })
    }

    async fn ctcp_events(
        &mut self,
        from: &str,
        target: &str,
        body: &str,
        send: &mut SendPipeline,
    ) -> error::Result<Vec<Event>> {
        let mut parts = body.splitn(2, ' ');
        let kind = parts.next().unwrap_or("").to_owned();
        let text = parts.next().unwrap_or("").to_owned();

        if kind.eq_ignore_ascii_case("ACTION") {
            return Ok(vec![Event::Action {
                from: from.to_owned(),
                target: target.to_owned(),
                text,
            }]);
        }

        #[cfg(feature = "ctcp")]
        self.send_ctcp_reply(from, &kind, &text, send).await?;
        #[cfg(not(feature = "ctcp"))]
        let _ = send;

        let mut events = vec![Event::Ctcp {
            from: from.to_owned(),
            target: target.to_owned(),
            kind: kind.clone(),
            text,
        }];

        if kind.eq_ignore_ascii_case("VERSION") {
            events.push(Event::CtcpVersion { from: from.to_owned() });
        }

        Ok(events)
    }

    /// Replies in-kind to a CTCP query we recognize: `PING` echoes the received payload back
    /// verbatim, the rest answer from the configured identity strings when set.
    #[cfg(feature = "ctcp")]
    async fn send_ctcp_reply(
        &mut self,
        from: &str,
        kind: &str,
        text: &str,
        send: &mut SendPipeline,
    ) -> error::Result<()> {
        let reply = if kind.eq_ignore_ascii_case("PING") {
            Some(format!("PING {}", text))
        } else if kind.eq_ignore_ascii_case("VERSION") {
            self.ctcp_version.clone().map(|v| format!("VERSION {}", v))
        } else if kind.eq_ignore_ascii_case("SOURCE") {
            self.ctcp_source.clone().map(|v| format!("SOURCE {}", v))
        } else if kind.eq_ignore_ascii_case("USERINFO") {
            self.ctcp_user_info.clone().map(|v| format!("USERINFO {}", v))
        } else if kind.eq_ignore_ascii_case("FINGER") {
            self.ctcp_finger.clone().map(|v| format!("FINGER {}", v))
        } else if kind.eq_ignore_ascii_case("TIME") {
            Some(format!("TIME {}", chrono::Local::now().to_rfc2822()))
        } else {
            None
        };

        if let Some(reply) = reply {
            let body = format!("\x01{}\x01", reply);
            send.send_parts("NOTICE", &[from, &body]).await?;
        }

        Ok(())
    }

    fn mode_events(&self, msg: &Message, from: Option<&str>) -> Vec<Event> {
        let mut params = msg.params();
        let target = match params.next() {
            Some(t) => t.to_owned(),
            None => return Vec::new(),
        };

        if !target.eq_ignore_ascii_case(&self.state.current_nick) && !target.is_channel_name() {
            return Vec::new();
        }

        let mode_str = match params.next() {
            Some(m) => m.to_owned(),
            None => {
                return vec![Event::ModeIs {
                    channel: target,
                    mode: String::new(),
                }]
            }
        };

        let args: Vec<&str> = params.collect();
        let mut arg_iter = args.into_iter();
        let mut adding = true;
        let mut events = Vec::new();

        for ch in mode_str.chars() {
            match ch {
                '+' => adding = true,
                '-' => adding = false,
                _ => {
                    let argument = if self.mode_takes_argument(ch) {
                        arg_iter.next().map(str::to_owned)
                    } else {
                        None
                    };
                    let event = if adding {
                        Event::PlusMode {
                            target: target.clone(),
                            by: from.map(str::to_owned),
                            mode: ch,
                            argument,
                        }
                    } else {
                        Event::MinusMode {
                            target: target.clone(),
                            by: from.map(str::to_owned),
                            mode: ch,
                            argument,
                        }
                    };
                    events.push(event);
                }
            }
        }

        events
    }

    fn mode_takes_argument(&self, mode_char: char) -> bool {
        self.state.prefix_for_mode.contains_key(&mode_char)
            || self.state.supported.channel_modes.a.contains(mode_char)
            || self.state.supported.channel_modes.b.contains(mode_char)
    }

    fn collect_whois(&mut self, canonical: &str, msg: &Message) {
        let mut params = msg.params();
        let _me = params.next();
        let nick = match params.next() {
            Some(n) => n.to_owned(),
            None => return,
        };

        match canonical {
            "rpl_whoisuser" => {
                let user = params.next().map(str::to_owned);
                let host = params.next().map(str::to_owned);
                let _star = params.next();
                let real_name = params.next_back().map(str::to_owned);
                let entry = self.state.whois_data.entry(nick.clone()).or_insert_with(|| WhoisResponse {
                    nickname: nick,
                    ..WhoisResponse::default()
                });
                entry.user = user;
                entry.host = host;
                entry.real_name = real_name;
            }
            "rpl_whoisserver" => {
                let server = params.next().map(str::to_owned);
                let entry = self.state.whois_data.entry(nick.clone()).or_insert_with(|| WhoisResponse {
                    nickname: nick,
                    ..WhoisResponse::default()
                });
                entry.server = server;
            }
            "rpl_whoisoperator" => {
                let entry = self.state.whois_data.entry(nick.clone()).or_insert_with(|| WhoisResponse {
                    nickname: nick,
                    ..WhoisResponse::default()
                });
                entry.is_operator = true;
            }
            "rpl_whoisidle" => {
                let idle = params.next().and_then(|s| s.parse().ok());
                let entry = self.state.whois_data.entry(nick.clone()).or_insert_with(|| WhoisResponse {
                    nickname: nick,
                    ..WhoisResponse::default()
                });
                entry.idle_seconds = idle;
            }
            "rpl_whoischannels" => {
                let chans = params.next().unwrap_or("").split_whitespace().map(str::to_owned).collect();
                let entry = self.state.whois_data.entry(nick.clone()).or_insert_with(|| WhoisResponse {
                    nickname: nick,
                    ..WhoisResponse::default()
                });
                entry.channels = chans;
            }
            _ => {}
        }
    }

    /// Takes and clears the accumulated `WHOIS` response for `nick`, if one completed.
    pub fn take_whois(&mut self, nick: &str) -> Option<WhoisResponse> {
        self.state.whois_data.remove(nick)
    }

    fn maybe_strip_colors(&self, text: &str) -> String {
        if self.strip_colors {
            text.strip_formatting()
        } else {
            text.to_owned()
        }
    }
}

/// Builds the `n`th nick-collision retry for `base`: an increasing numeric suffix, truncating
/// the base so the result never exceeds `nicklen` (e.g. `testbot`, 1, 9 -> `testbot1`).
fn numbered_nick(base: &str, n: u32, nicklen: u32) -> String {
    let suffix = n.to_string();
    let budget = (nicklen as usize).saturating_sub(suffix.len());
    let truncated: String = base.chars().take(budget).collect();
    format!("{}{}", truncated, suffix)
}

/// CTCP messages are `PRIVMSG`/`NOTICE` bodies wrapped in `\x01`; returns the inner body.
fn parse_ctcp(text: &str) -> Option<&str> {
    let rest = text.strip_prefix('\x01')?;
    Some(rest.strip_suffix('\x01').unwrap_or(rest))
}

/// A small base64 encoder sized for SASL `AUTHENTICATE` payloads, avoiding a dependency on a
/// general-purpose base64 crate for this single call site.
fn base64_encode(data: &[u8]) -> String {
    const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::with_capacity((data.len() + 2) / 3 * 4);

    for chunk in data.chunks(3) {
        let b0 = chunk[0];
        let b1 = *chunk.get(1).unwrap_or(&0);
        let b2 = *chunk.get(2).unwrap_or(&0);

        out.push(ALPHABET[(b0 >> 2) as usize] as char);
        out.push(ALPHABET[(((b0 & 0x03) << 4) | (b1 >> 4)) as usize] as char);
        out.push(if chunk.len() > 1 {
            ALPHABET[(((b1 & 0x0f) << 2) | (b2 >> 6)) as usize] as char
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            ALPHABET[(b2 & 0x3f) as usize] as char
        } else {
            '='
        });
    }

    out
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_config() -> Config {
        Config::for_test()
    }

    #[tokio::test]
    async fn registration_sends_nick_and_user() {
        let config = test_config();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut send = SendPipeline::new(tx, false, 0);
        let mut session = Session::new(&config).unwrap();

        session.register(&mut send).await.unwrap();

        let nick = rx.recv().await.unwrap();
        assert_eq!(nick.command(), "NICK");
        let user = rx.recv().await.unwrap();
        assert_eq!(user.command(), "USER");
    }

    #[tokio::test]
    async fn nick_collision_appends_number() {
        let config = test_config();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut send = SendPipeline::new(tx, false, 0);
        let mut session = Session::new(&config).unwrap();

        let msg: Message = "433 * test :Nickname is already in use.\r\n".parse().unwrap();
        session.handle_message(&msg, &mut send).await.unwrap();

        let retry = rx.recv().await.unwrap();
        assert_eq!(retry.command(), "NICK");
        assert_eq!(retry.params().next(), Some("test1"));

        let msg: Message = "433 * test1 :Nickname is already in use.\r\n".parse().unwrap();
        session.handle_message(&msg, &mut send).await.unwrap();

        let retry = rx.recv().await.unwrap();
        assert_eq!(retry.params().next(), Some("test2"));
    }

    #[test]
    fn numbered_nick_truncates_to_nicklen() {
        assert_eq!(numbered_nick("testbot", 1, 9), "testbot1");
        assert_eq!(numbered_nick("testbot", 1, 4), "tes1");
    }

    #[test]
    fn base64_round_trip_shape() {
        assert_eq!(base64_encode(b"\0user\0pass"[1..].as_ref()), base64_encode(b"user\0pass"));
    }

    #[tokio::test]
    async fn welcome_sets_host_mask_and_issues_self_whois() {
        let config = test_config();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut send = SendPipeline::new(tx, false, 0);
        let mut session = Session::new(&config).unwrap();

        let msg: Message = ":localhost 001 testbot1 :Welcome to the network testbot\r\n".parse().unwrap();
        let events = session.handle_message(&msg, &mut send).await.unwrap();

        assert!(events.iter().any(|e| matches!(e, Event::Registered)));
        assert_eq!(session.state().host_mask.as_deref(), Some("testbot"));

        let whois = rx.recv().await.unwrap();
        assert_eq!(whois.command(), "WHOIS");
    }

    #[tokio::test]
    async fn endofwhois_emits_and_clears_whois_event() {
        let config = test_config();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let mut send = SendPipeline::new(tx, false, 0);
        let mut session = Session::new(&config).unwrap();

        let whoisuser: Message = ":localhost 311 me nick ~user host * :Real Name\r\n".parse().unwrap();
        session.handle_message(&whoisuser, &mut send).await.unwrap();

        let endofwhois: Message = ":localhost 318 me nick :End of /WHOIS list.\r\n".parse().unwrap();
        let events = session.handle_message(&endofwhois, &mut send).await.unwrap();

        let whois_event = events.iter().find_map(|e| match e {
            Event::Whois(response) => Some(response),
            _ => None,
        });
        let response = whois_event.expect("expected a Whois event");
        assert_eq!(response.nickname, "nick");
        assert_eq!(response.user.as_deref(), Some("~user"));

        assert!(session.take_whois("nick").is_none());
    }

    #[tokio::test]
    async fn ctcp_ping_is_echoed_back() {
        let config = test_config();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut send = SendPipeline::new(tx, false, 0);
        let mut session = Session::new(&config).unwrap();

        let msg: Message = ":friend PRIVMSG test :\x01PING 12345\x01\r\n".parse().unwrap();
        session.handle_message(&msg, &mut send).await.unwrap();

        let reply = rx.recv().await.unwrap();
        assert_eq!(reply.command(), "NOTICE");
        let mut params = reply.params();
        assert_eq!(params.next(), Some("friend"));
        assert_eq!(params.next(), Some("\x01PING 12345\x01"));
    }

    #[tokio::test]
    async fn register_sends_webirc_before_cap_and_nick() {
        let mut config = test_config();
        config.webirc = Some(WebircConfig {
            pass: "secret".to_owned(),
            ip: "1.2.3.4".to_owned(),
            user: "gateway".to_owned(),
            host: Some("gateway.example.com".to_owned()),
        });
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut send = SendPipeline::new(tx, false, 0);
        let mut session = Session::new(&config).unwrap();

        session.register(&mut send).await.unwrap();

        let webirc = rx.recv().await.unwrap();
        assert_eq!(webirc.command(), "WEBIRC");
        let mut params = webirc.params();
        assert_eq!(params.next(), Some("secret"));
        assert_eq!(params.next(), Some("gateway"));
        assert_eq!(params.next(), Some("gateway.example.com"));
        assert_eq!(params.next(), Some("1.2.3.4"));

        let nick = rx.recv().await.unwrap();
        assert_eq!(nick.command(), "NICK");
    }
}
