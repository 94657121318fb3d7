//! Typed representation of IRC commands, distinct from the raw wire [`Message`](crate::Message).
use std::str::FromStr;

use crate::chan::ChannelExt;
use crate::error::MessageParseError;
use crate::response::Response;

/// A list of IRC commands as typed structures. This is useful for constructing outgoing messages
/// without manually composing a [`Message`](crate::Message), and for matching on the kind of an
/// incoming one after it has been decoded from a [`Message`](crate::Message) via
/// [`Command::new`].
///
/// Only the subcommands actually needed by a modern client (registration, channel membership,
/// mode changes, CTCP-bearing messages, capability negotiation and SASL) are modelled; anything
/// else round-trips through [`Command::Raw`] or [`Command::Response`] without losing information.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    // 3.1 Connection registration
    /// PASS password
    PASS(String),
    /// NICK nickname
    NICK(String),
    /// USER username mode realname
    USER(String, String, String),
    /// OPER name password
    OPER(String, String),
    /// MODE nickname modes
    UserMODE(String, Vec<String>),
    /// QUIT [message]
    QUIT(Option<String>),

    // 3.2 Channel operations
    /// JOIN chanlist [keylist]
    JOIN(String, Option<String>, Option<String>),
    /// PART chanlist [message]
    PART(String, Option<String>),
    /// MODE channel modes
    ChannelMODE(String, Vec<String>),
    /// MODE channel (request current modes)
    ChannelMODEGet(String),
    /// TOPIC channel [topic]
    TOPIC(String, Option<String>),
    /// NAMES [chanlist]
    NAMES(Option<String>),
    /// INVITE nickname channel
    INVITE(String, String),
    /// KICK chanlist nicklist [comment]
    KICK(String, String, Option<String>),

    // 3.3 Sending messages
    /// PRIVMSG target message
    PRIVMSG(String, String),
    /// NOTICE target message
    NOTICE(String, String),

    // 3.4 / 3.7 Server queries and misc
    /// MOTD [target]
    MOTD(Option<String>),
    /// WHO mask
    WHO(Option<String>),
    /// WHOIS [target] nickmasks
    WHOIS(Option<String>, String),
    /// KILL nickname comment
    KILL(String, String),
    /// PING server1 [server2]
    PING(String, Option<String>),
    /// PONG server1 [server2]
    PONG(String, Option<String>),
    /// ERROR message
    ERROR(String),
    /// AWAY [message]
    AWAY(Option<String>),
    /// WALLOPS message
    WALLOPS(String),

    // Services-operator conveniences (InspIRCd/UnrealIRCd, commonly supported)
    /// SAMODE target mode [modeparams]
    SAMODE(String, String, Option<String>),
    /// SANICK old new
    SANICK(String, String),

    // IRCv3
    /// CAP [key] subcommand [capabilities] [param]
    CAP(Option<String>, CapSubCommand, Option<String>, Option<String>),
    /// AUTHENTICATE data
    AUTHENTICATE(String),
    /// WEBIRC password gateway hostname ip
    WEBIRC(String, String, String, String),

    /// A server numeric response along with the associated arguments and optional suffix.
    Response(Response, Vec<String>, Option<String>),

    /// A raw IRC command unknown to the above variants, with arguments and optional suffix.
    Raw(String, Vec<String>, Option<String>),
}

fn stringify(cmd: &str, args: &[&str], suffix: Option<&str>) -> String {
    let mut line = String::from(cmd);
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    if let Some(suffix) = suffix {
        line.push_str(" :");
        line.push_str(suffix);
    }
    line
}

impl<'a> From<&'a Command> for String {
    fn from(cmd: &'a Command) -> String {
        match *cmd {
            Command::PASS(ref p) => stringify("PASS", &[], Some(p)),
            Command::NICK(ref n) => stringify("NICK", &[], Some(n)),
            Command::USER(ref u, ref m, ref r) => stringify("USER", &[u, m, "*"], Some(r)),
            Command::OPER(ref u, ref p) => stringify("OPER", &[u], Some(p)),
            Command::UserMODE(ref u, ref m) => {
                let modes = m.iter().map(|s| &s[..]).collect::<Vec<_>>();
                stringify("MODE", &std::iter::once(&u[..]).chain(modes).collect::<Vec<_>>(), None)
            }
            Command::QUIT(Some(ref m)) => stringify("QUIT", &[], Some(m)),
            Command::QUIT(None) => stringify("QUIT", &[], None),

            Command::JOIN(ref c, Some(ref k), Some(ref n)) => stringify("JOIN", &[c, k], Some(n)),
            Command::JOIN(ref c, Some(ref k), None) => stringify("JOIN", &[c, k], None),
            Command::JOIN(ref c, None, Some(ref n)) => stringify("JOIN", &[c], Some(n)),
            Command::JOIN(ref c, None, None) => stringify("JOIN", &[c], None),
            Command::PART(ref c, Some(ref m)) => stringify("PART", &[c], Some(m)),
            Command::PART(ref c, None) => stringify("PART", &[c], None),
            Command::ChannelMODE(ref c, ref m) => {
                let modes = m.iter().map(|s| &s[..]).collect::<Vec<_>>();
                stringify("MODE", &std::iter::once(&c[..]).chain(modes).collect::<Vec<_>>(), None)
            }
            Command::ChannelMODEGet(ref c) => stringify("MODE", &[c], None),
            Command::TOPIC(ref c, Some(ref t)) => stringify("TOPIC", &[c], Some(t)),
            Command::TOPIC(ref c, None) => stringify("TOPIC", &[c], None),
            Command::NAMES(Some(ref c)) => stringify("NAMES", &[c], None),
            Command::NAMES(None) => stringify("NAMES", &[], None),
            Command::INVITE(ref n, ref c) => stringify("INVITE", &[n, c], None),
            Command::KICK(ref c, ref n, Some(ref r)) => stringify("KICK", &[c, n], Some(r)),
            Command::KICK(ref c, ref n, None) => stringify("KICK", &[c, n], None),

            Command::PRIVMSG(ref t, ref m) => stringify("PRIVMSG", &[t], Some(m)),
            Command::NOTICE(ref t, ref m) => stringify("NOTICE", &[t], Some(m)),

            Command::MOTD(Some(ref t)) => stringify("MOTD", &[], Some(t)),
            Command::MOTD(None) => stringify("MOTD", &[], None),
            Command::WHO(Some(ref s)) => stringify("WHO", &[s], None),
            Command::WHO(None) => stringify("WHO", &[], None),
            Command::WHOIS(Some(ref t), ref m) => stringify("WHOIS", &[t, m], None),
            Command::WHOIS(None, ref m) => stringify("WHOIS", &[m], None),
            Command::KILL(ref n, ref c) => stringify("KILL", &[n], Some(c)),
            Command::PING(ref s, Some(ref t)) => stringify("PING", &[s], Some(t)),
            Command::PING(ref s, None) => stringify("PING", &[], Some(s)),
            Command::PONG(ref s, Some(ref t)) => stringify("PONG", &[s], Some(t)),
            Command::PONG(ref s, None) => stringify("PONG", &[], Some(s)),
            Command::ERROR(ref m) => stringify("ERROR", &[], Some(m)),
            Command::AWAY(Some(ref m)) => stringify("AWAY", &[], Some(m)),
            Command::AWAY(None) => stringify("AWAY", &[], None),
            Command::WALLOPS(ref t) => stringify("WALLOPS", &[], Some(t)),

            Command::SAMODE(ref t, ref m, Some(ref p)) => stringify("SAMODE", &[t, m, p], None),
            Command::SAMODE(ref t, ref m, None) => stringify("SAMODE", &[t, m], None),
            Command::SANICK(ref o, ref n) => stringify("SANICK", &[o, n], None),

            Command::CAP(None, ref s, None, Some(ref p)) => stringify("CAP", &[s.to_str()], Some(p)),
            Command::CAP(None, ref s, None, None) => stringify("CAP", &[s.to_str()], None),
            Command::CAP(Some(ref k), ref s, None, Some(ref p)) => {
                stringify("CAP", &[k, s.to_str()], Some(p))
            }
            Command::CAP(Some(ref k), ref s, None, None) => stringify("CAP", &[k, s.to_str()], None),
            Command::CAP(None, ref s, Some(ref c), Some(ref p)) => {
                stringify("CAP", &[s.to_str(), c], Some(p))
            }
            Command::CAP(None, ref s, Some(ref c), None) => stringify("CAP", &[s.to_str(), c], None),
            Command::CAP(Some(ref k), ref s, Some(ref c), Some(ref p)) => {
                stringify("CAP", &[k, s.to_str(), c], Some(p))
            }
            Command::CAP(Some(ref k), ref s, Some(ref c), None) => {
                stringify("CAP", &[k, s.to_str(), c], None)
            }

            Command::AUTHENTICATE(ref d) => stringify("AUTHENTICATE", &[d], None),
            Command::WEBIRC(ref p, ref g, ref h, ref i) => stringify("WEBIRC", &[p, g, h, i], None),

            Command::Response(ref resp, ref a, Some(ref s)) => stringify(
                &format!("{:03}", *resp as u16),
                &a.iter().map(|s| &s[..]).collect::<Vec<_>>(),
                Some(s),
            ),
            Command::Response(ref resp, ref a, None) => stringify(
                &format!("{:03}", *resp as u16),
                &a.iter().map(|s| &s[..]).collect::<Vec<_>>(),
                None,
            ),
            Command::Raw(ref c, ref a, Some(ref s)) => {
                stringify(c, &a.iter().map(|s| &s[..]).collect::<Vec<_>>(), Some(s))
            }
            Command::Raw(ref c, ref a, None) => {
                stringify(c, &a.iter().map(|s| &s[..]).collect::<Vec<_>>(), None)
            }
        }
    }
}

impl Command {
    /// Constructs a [`Command`] from a command token, its positional arguments, and its trailing
    /// (`:`-prefixed) parameter, as produced by the line parser.
    pub fn new(cmd: &str, args: Vec<&str>, suffix: Option<&str>) -> Result<Command, MessageParseError> {
        let args_owned = || args.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Ok(if let Ok(resp) = Response::from_str(cmd) {
            Command::Response(resp, args_owned(), suffix.map(|s| s.to_owned()))
        } else if cmd.eq_ignore_ascii_case("PASS") {
            Command::PASS(suffix.or_else(|| args.first().copied()).unwrap_or("").to_owned())
        } else if cmd.eq_ignore_ascii_case("NICK") {
            Command::NICK(suffix.or_else(|| args.first().copied()).unwrap_or("").to_owned())
        } else if cmd.eq_ignore_ascii_case("USER") {
            if args.len() >= 2 {
                Command::USER(args[0].to_owned(), args[1].to_owned(), suffix.unwrap_or("").to_owned())
            } else {
                return Err(MessageParseError::InvalidCommand);
            }
        } else if cmd.eq_ignore_ascii_case("OPER") {
            if args.len() >= 1 {
                Command::OPER(args[0].to_owned(), suffix.unwrap_or("").to_owned())
            } else {
                return Err(MessageParseError::InvalidCommand);
            }
        } else if cmd.eq_ignore_ascii_case("QUIT") {
            Command::QUIT(suffix.map(|s| s.to_owned()))
        } else if cmd.eq_ignore_ascii_case("JOIN") {
            if args.is_empty() {
                return Err(MessageParseError::InvalidCommand);
            }
            Command::JOIN(args[0].to_owned(), args.get(1).map(|s| s.to_string()), None)
        } else if cmd.eq_ignore_ascii_case("PART") {
            if args.is_empty() {
                return Err(MessageParseError::InvalidCommand);
            }
            Command::PART(args[0].to_owned(), suffix.map(|s| s.to_owned()))
        } else if cmd.eq_ignore_ascii_case("MODE") {
            if args.is_empty() {
                return Err(MessageParseError::InvalidCommand);
            }
            let target = args[0].to_owned();
            let mut rest: Vec<String> = args[1..].iter().map(|s| s.to_string()).collect();
            if let Some(s) = suffix {
                rest.push(s.to_owned());
            }
            if rest.is_empty() {
                Command::ChannelMODEGet(target)
            } else if (&target[..]).is_channel_name() {
                Command::ChannelMODE(target, rest)
            } else {
                Command::UserMODE(target, rest)
            }
        } else if cmd.eq_ignore_ascii_case("TOPIC") {
            if args.is_empty() {
                return Err(MessageParseError::InvalidCommand);
            }
            Command::TOPIC(args[0].to_owned(), suffix.map(|s| s.to_owned()))
        } else if cmd.eq_ignore_ascii_case("NAMES") {
            Command::NAMES(args.first().map(|s| s.to_string()))
        } else if cmd.eq_ignore_ascii_case("INVITE") {
            if args.len() >= 2 {
                Command::INVITE(args[0].to_owned(), args[1].to_owned())
            } else {
                return Err(MessageParseError::InvalidCommand);
            }
        } else if cmd.eq_ignore_ascii_case("KICK") {
            if args.len() >= 2 {
                Command::KICK(args[0].to_owned(), args[1].to_owned(), suffix.map(|s| s.to_owned()))
            } else {
                return Err(MessageParseError::InvalidCommand);
            }
        } else if cmd.eq_ignore_ascii_case("PRIVMSG") {
            if args.is_empty() {
                return Err(MessageParseError::InvalidCommand);
            }
            Command::PRIVMSG(args[0].to_owned(), suffix.unwrap_or("").to_owned())
        } else if cmd.eq_ignore_ascii_case("NOTICE") {
            if args.is_empty() {
                return Err(MessageParseError::InvalidCommand);
            }
            Command::NOTICE(args[0].to_owned(), suffix.unwrap_or("").to_owned())
        } else if cmd.eq_ignore_ascii_case("MOTD") {
            Command::MOTD(args.first().map(|s| s.to_string()))
        } else if cmd.eq_ignore_ascii_case("WHO") {
            Command::WHO(args.first().map(|s| s.to_string()))
        } else if cmd.eq_ignore_ascii_case("WHOIS") {
            if args.len() >= 2 {
                Command::WHOIS(Some(args[0].to_owned()), args[1].to_owned())
            } else if let Some(mask) = args.first() {
                Command::WHOIS(None, mask.to_string())
            } else {
                return Err(MessageParseError::InvalidCommand);
            }
        } else if cmd.eq_ignore_ascii_case("KILL") {
            if args.len() >= 1 {
                Command::KILL(args[0].to_owned(), suffix.unwrap_or("").to_owned())
            } else {
                return Err(MessageParseError::InvalidCommand);
            }
        } else if cmd.eq_ignore_ascii_case("PING") {
            if let Some(server) = args.first() {
                Command::PING(server.to_string(), args.get(1).map(|s| s.to_string()))
            } else if let Some(s) = suffix {
                Command::PING(s.to_owned(), None)
            } else {
                return Err(MessageParseError::InvalidCommand);
            }
        } else if cmd.eq_ignore_ascii_case("PONG") {
            if let Some(server) = args.first() {
                Command::PONG(server.to_string(), suffix.map(|s| s.to_owned()))
            } else if let Some(s) = suffix {
                Command::PONG(s.to_owned(), None)
            } else {
                return Err(MessageParseError::InvalidCommand);
            }
        } else if cmd.eq_ignore_ascii_case("ERROR") {
            Command::ERROR(suffix.unwrap_or("").to_owned())
        } else if cmd.eq_ignore_ascii_case("AWAY") {
            Command::AWAY(suffix.map(|s| s.to_owned()))
        } else if cmd.eq_ignore_ascii_case("WALLOPS") {
            Command::WALLOPS(suffix.unwrap_or("").to_owned())
        } else if cmd.eq_ignore_ascii_case("SAMODE") {
            if args.len() >= 2 {
                Command::SAMODE(args[0].to_owned(), args[1].to_owned(), args.get(2).map(|s| s.to_string()))
            } else {
                return Err(MessageParseError::InvalidCommand);
            }
        } else if cmd.eq_ignore_ascii_case("SANICK") {
            if args.len() >= 2 {
                Command::SANICK(args[0].to_owned(), args[1].to_owned())
            } else {
                return Err(MessageParseError::InvalidCommand);
            }
        } else if cmd.eq_ignore_ascii_case("CAP") {
            return Command::new_cap(args, suffix);
        } else if cmd.eq_ignore_ascii_case("AUTHENTICATE") {
            Command::AUTHENTICATE(suffix.or_else(|| args.first().copied()).unwrap_or("").to_owned())
        } else if cmd.eq_ignore_ascii_case("WEBIRC") {
            if args.len() >= 3 {
                Command::WEBIRC(
                    args[0].to_owned(),
                    args[1].to_owned(),
                    args[2].to_owned(),
                    suffix.or_else(|| args.get(3).copied()).unwrap_or("").to_owned(),
                )
            } else {
                return Err(MessageParseError::InvalidCommand);
            }
        } else {
            Command::Raw(cmd.to_owned(), args_owned(), suffix.map(|s| s.to_owned()))
        })
    }

    fn new_cap(args: Vec<&str>, suffix: Option<&str>) -> Result<Command, MessageParseError> {
        // CAP [key] subcommand [capabilities...] [:trailing]
        let (key, rest): (Option<String>, &[&str]) = if args.len() >= 2
            && CapSubCommand::from_str(args[0]).is_err()
            && CapSubCommand::from_str(args[1]).is_ok()
        {
            (Some(args[0].to_owned()), &args[1..])
        } else {
            (None, &args[..])
        };

        if rest.is_empty() {
            return Err(MessageParseError::InvalidSubcommand {
                cmd: "CAP",
                sub: String::new(),
            });
        }

        let sub = CapSubCommand::from_str(rest[0]).map_err(|_| MessageParseError::InvalidSubcommand {
            cmd: "CAP",
            sub: rest[0].to_owned(),
        })?;

        let capstr = rest.get(1).map(|s| s.to_string());
        Ok(Command::CAP(key, sub, capstr, suffix.map(|s| s.to_owned())))
    }
}

/// A sub-command of the IRCv3 `CAP` extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CapSubCommand {
    /// Requests a list of the server's capabilities.
    LS,
    /// Requests a list of the server's capabilities enabled for this connection.
    LIST,
    /// Requests that the server enable specific capabilities.
    REQ,
    /// Acknowledges capabilities.
    ACK,
    /// Non-acknowledges capabilities.
    NAK,
    /// Ends the capability negotiation before registration.
    END,
}

impl CapSubCommand {
    /// Retrieves the string representation of the sub-command.
    pub fn to_str(&self) -> &'static str {
        match *self {
            CapSubCommand::LS => "LS",
            CapSubCommand::LIST => "LIST",
            CapSubCommand::REQ => "REQ",
            CapSubCommand::ACK => "ACK",
            CapSubCommand::NAK => "NAK",
            CapSubCommand::END => "END",
        }
    }
}

impl FromStr for CapSubCommand {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<CapSubCommand, &'static str> {
        match s {
            "LS" => Ok(CapSubCommand::LS),
            "LIST" => Ok(CapSubCommand::LIST),
            "REQ" => Ok(CapSubCommand::REQ),
            "ACK" => Ok(CapSubCommand::ACK),
            "NAK" => Ok(CapSubCommand::NAK),
            "END" => Ok(CapSubCommand::END),
            _ => Err("Failed to parse CAP subcommand."),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn format_privmsg() {
        let cmd = Command::PRIVMSG("#test".to_owned(), "Hi there".to_owned());
        assert_eq!(String::from(&cmd), "PRIVMSG #test :Hi there");
    }

    #[test]
    fn format_user_mode() {
        let cmd = Command::UserMODE("test".to_owned(), vec!["+i".to_owned()]);
        assert_eq!(String::from(&cmd), "MODE test +i");
    }

    #[test]
    fn parse_privmsg() {
        let cmd = Command::new("PRIVMSG", vec!["#test"], Some("Hi there")).unwrap();
        assert_eq!(cmd, Command::PRIVMSG("#test".to_owned(), "Hi there".to_owned()));
    }

    #[test]
    fn parse_mode_channel_vs_user() {
        let cmd = Command::new("MODE", vec!["#test", "+o", "nick"], None).unwrap();
        assert_eq!(
            cmd,
            Command::ChannelMODE("#test".to_owned(), vec!["+o".to_owned(), "nick".to_owned()])
        );
        let cmd = Command::new("MODE", vec!["nick", "+i"], None).unwrap();
        assert_eq!(cmd, Command::UserMODE("nick".to_owned(), vec!["+i".to_owned()]));
    }

    #[test]
    fn parse_cap_ls() {
        let cmd = Command::new("CAP", vec!["LS"], Some("302")).unwrap();
        assert_eq!(cmd, Command::CAP(None, CapSubCommand::LS, None, Some("302".to_owned())));
    }

    #[test]
    fn parse_cap_req_with_key() {
        let cmd = Command::new("CAP", vec!["REQ"], Some("sasl multi-prefix")).unwrap();
        assert_eq!(
            cmd,
            Command::CAP(None, CapSubCommand::REQ, None, Some("sasl multi-prefix".to_owned()))
        );
    }

    #[test]
    fn parse_unknown_is_raw() {
        let cmd = Command::new("FOOBAR", vec!["a", "b"], Some("c")).unwrap();
        assert_eq!(
            cmd,
            Command::Raw("FOOBAR".to_owned(), vec!["a".to_owned(), "b".to_owned()], Some("c".to_owned()))
        );
    }
}
