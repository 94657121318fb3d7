//! Session state: channel/user tracking and the ISUPPORT applier.
use std::collections::HashMap;

use irc_proto::{ChannelExt, Command, Message, Response};

use crate::client::caps::Capabilities;

/// The `CASEMAPPING` ISUPPORT token, controlling how nicknames and channel names are folded for
/// comparison purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaseMapping {
    /// `[]\^` map to `{}|~`.
    Rfc1459,
    /// `[]\` map to `{}|`.
    StrictRfc1459,
    /// Plain ASCII case folding only.
    Ascii,
}

impl CaseMapping {
    fn from_token(token: &str) -> CaseMapping {
        match token {
            "rfc1459" => CaseMapping::Rfc1459,
            "strict-rfc1459" => CaseMapping::StrictRfc1459,
            _ => CaseMapping::Ascii,
        }
    }

    /// Folds a single character according to this case mapping.
    pub fn fold_char(&self, c: char) -> char {
        let c = c.to_ascii_lowercase();
        match (self, c) {
            (CaseMapping::Rfc1459, '[') => '{',
            (CaseMapping::Rfc1459, ']') => '}',
            (CaseMapping::Rfc1459, '\\') => '|',
            (CaseMapping::Rfc1459, '^') => '~',
            (CaseMapping::StrictRfc1459, '[') => '{',
            (CaseMapping::StrictRfc1459, ']') => '}',
            (CaseMapping::StrictRfc1459, '\\') => '|',
            _ => c,
        }
    }

    /// Folds an entire string according to this case mapping.
    pub fn fold(&self, s: &str) -> String {
        s.chars().map(|c| self.fold_char(c)).collect()
    }
}

impl Default for CaseMapping {
    fn default() -> CaseMapping {
        CaseMapping::Rfc1459
    }
}

/// The four ISUPPORT `CHANMODES` parameter classes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChanModeClasses {
    /// Type A: always takes a parameter, and adds/removes to a list (e.g. ban masks).
    pub a: String,
    /// Type B: always takes a parameter.
    pub b: String,
    /// Type C: takes a parameter only when set.
    pub c: String,
    /// Type D: never takes a parameter.
    pub d: String,
}

fn merge_unique(existing: &mut String, additional: &str) {
    for c in additional.chars() {
        if !existing.contains(c) {
            existing.push(c);
        }
    }
}

/// Server capabilities and limits negotiated via `RPL_ISUPPORT` (numeric 005).
#[derive(Clone, Debug)]
pub struct IrcSupported {
    /// Allowed channel-name prefix characters (`CHANTYPES`).
    pub channel_types: String,
    /// Maximum channel name length (`CHANNELLEN`).
    pub channel_length: Option<u32>,
    /// `CHANLIMIT`: channel-type prefix to a maximum number of joined channels of that type.
    pub channel_limit: HashMap<char, u32>,
    /// `IDCHAN`: channel-type prefix to the length of the unique id portion of the name.
    pub channel_idlength: HashMap<char, u32>,
    /// `CHANMODES` split into its four parameter classes.
    pub channel_modes: ChanModeClasses,
    /// Maximum kick message length (`KICKLEN`).
    pub kick_length: Option<u32>,
    /// `MAXLIST`: mode char to the maximum number of entries on that list mode.
    pub max_list: HashMap<char, u32>,
    /// `TARGMAX`: command name to the maximum number of targets it accepts (`None` = unlimited).
    pub max_targets: HashMap<String, Option<u32>>,
    /// Maximum number of mode changes accepted in a single `MODE` command (`MODES`).
    pub modes: u32,
    /// Maximum nickname length (`NICKLEN`).
    pub nick_length: u32,
    /// Maximum topic length (`TOPICLEN`).
    pub topic_length: Option<u32>,
    /// Channel user-prefix mode characters the server supports, in power order (`PREFIX`).
    pub user_modes: String,
    /// User-prefix mode characters in order of precedence, most powerful first.
    pub user_mode_priority: String,
    /// How the server folds case for nickname/channel comparisons.
    pub casemapping: CaseMapping,
    /// Unrecognized ISUPPORT tokens, preserved verbatim and de-duplicated.
    pub extra: Vec<String>,
}

impl Default for IrcSupported {
    fn default() -> IrcSupported {
        IrcSupported {
            channel_types: "&#".to_owned(),
            channel_length: None,
            channel_limit: HashMap::new(),
            channel_idlength: HashMap::new(),
            channel_modes: ChanModeClasses::default(),
            kick_length: None,
            max_list: HashMap::new(),
            max_targets: HashMap::new(),
            modes: 3,
            nick_length: 9,
            topic_length: None,
            user_modes: String::new(),
            user_mode_priority: String::new(),
            casemapping: CaseMapping::default(),
            extra: Vec::new(),
        }
    }
}

impl IrcSupported {
    /// Applies one `RPL_ISUPPORT` token (`KEY` or `KEY=VALUE`) to this state, along with the
    /// state's `modeForPrefix`/`prefixForMode` maps since `PREFIX=` mutates both.
    fn apply_token(&mut self, token: &str, mode_for_prefix: &mut HashMap<char, char>, prefix_for_mode: &mut HashMap<char, char>) {
        let (key, value) = match token.split_once('=') {
            Some((k, v)) => (k, Some(v)),
            None => (token, None),
        };

        match key {
            "CASEMAPPING" => {
                if let Some(v) = value {
                    self.casemapping = CaseMapping::from_token(v);
                }
            }
            "CHANLIMIT" => {
                if let Some(v) = value {
                    parse_prefix_csv(v, &mut self.channel_limit);
                }
            }
            "MAXLIST" => {
                if let Some(v) = value {
                    parse_prefix_csv(v, &mut self.max_list);
                }
            }
            "TARGMAX" => {
                if let Some(v) = value {
                    for entry in v.split(',') {
                        if let Some((name, n)) = entry.split_once(':') {
                            self.max_targets
                                .insert(name.to_owned(), n.parse::<u32>().ok());
                        }
                    }
                }
            }
            "CHANMODES" => {
                if let Some(v) = value {
                    let classes: Vec<&str> = v.split(',').collect();
                    if let Some(a) = classes.get(0) {
                        merge_unique(&mut self.channel_modes.a, a);
                    }
                    if let Some(b) = classes.get(1) {
                        merge_unique(&mut self.channel_modes.b, b);
                    }
                    if let Some(c) = classes.get(2) {
                        merge_unique(&mut self.channel_modes.c, c);
                    }
                    if let Some(d) = classes.get(3) {
                        merge_unique(&mut self.channel_modes.d, d);
                    }
                }
            }
            "CHANTYPES" => {
                if let Some(v) = value {
                    self.channel_types = v.to_owned();
                }
            }
            "CHANNELLEN" => {
                if let Some(v) = value {
                    self.channel_length = v.parse().ok();
                }
            }
            "NICKLEN" => {
                if let Some(v) = value {
                    if let Ok(n) = v.parse() {
                        self.nick_length = n;
                    }
                }
            }
            "TOPICLEN" => {
                if let Some(v) = value {
                    self.topic_length = v.parse().ok();
                }
            }
            "KICKLEN" => {
                if let Some(v) = value {
                    self.kick_length = v.parse().ok();
                }
            }
            "MODES" => {
                if let Some(v) = value {
                    if let Ok(n) = v.parse() {
                        self.modes = n;
                    }
                }
            }
            "IDCHAN" => {
                if let Some(v) = value {
                    parse_prefix_csv(v, &mut self.channel_idlength);
                }
            }
            "PREFIX" => {
                if let Some(v) = value {
                    if let Some(rest) = v.strip_prefix('(') {
                        if let Some((modes, prefixes)) = rest.split_once(')') {
                            mode_for_prefix.clear();
                            prefix_for_mode.clear();
                            for (m, p) in modes.chars().zip(prefixes.chars()) {
                                mode_for_prefix.insert(p, m);
                                prefix_for_mode.insert(m, p);
                            }
                            merge_unique(&mut self.channel_modes.b, modes);
                            self.user_modes = prefixes.to_owned();
                            self.user_mode_priority = modes.to_owned();
                        }
                    }
                }
            }
            // Preserved but intentionally dropped: STATUSMSG targets a prefix-filtered subset
            // of channel members and has no bearing on session state.
            "STATUSMSG" => {}
            _ => {
                let full = token.to_owned();
                if !self.extra.contains(&full) {
                    self.extra.push(full);
                }
            }
        }
    }
}

fn parse_prefix_csv(value: &str, into: &mut HashMap<char, u32>) {
    for entry in value.split(',') {
        if let Some((prefixes, n)) = entry.split_once(':') {
            if let Ok(n) = n.parse::<u32>() {
                for p in prefixes.chars() {
                    into.insert(p, n);
                }
            }
        }
    }
}

/// Per-channel membership and mode state.
#[derive(Clone, Debug)]
pub struct ChanData {
    /// Case-folded lookup key for this channel.
    pub key: String,
    /// The channel name exactly as the server presented it.
    pub server_name: String,
    /// Member nick to their current prefix-mode characters (e.g. `"@+"`).
    pub users: HashMap<String, String>,
    /// The plain channel mode string currently known to be set (no parameters).
    pub mode: String,
    /// Parameterized (class A/B/C) mode characters to their ordered parameter lists.
    pub mode_params: HashMap<char, Vec<String>>,
    /// The current topic, if known.
    pub topic: Option<String>,
    /// Who set the current topic, if known.
    pub topic_by: Option<String>,
    /// When the channel was created, as reported by `RPL_CREATIONTIME`.
    pub created: Option<i64>,
}

impl ChanData {
    fn new(key: String, server_name: String) -> ChanData {
        ChanData {
            key,
            server_name,
            users: HashMap::new(),
            mode: String::new(),
            mode_params: HashMap::new(),
            topic: None,
            topic_by: None,
            created: None,
        }
    }
}

/// A single accumulated `WHOIS` reply, built up across its constituent numerics.
#[derive(Clone, Debug, Default)]
pub struct WhoisResponse {
    /// The target nickname.
    pub nickname: String,
    /// `user@host`, if reported.
    pub user: Option<String>,
    pub host: Option<String>,
    /// The real name field.
    pub real_name: Option<String>,
    /// The server the target is connected to.
    pub server: Option<String>,
    /// Whether the target is an IRC operator.
    pub is_operator: bool,
    /// Idle time in seconds, if reported.
    pub idle_seconds: Option<u64>,
    /// Channels the target is a member of, as reported.
    pub channels: Vec<String>,
}

/// Persistable session state: everything the State Tracker maintains about the connection.
#[derive(Clone, Debug)]
pub struct ClientState {
    /// Whether `RPL_WELCOME` has been received.
    pub registered: bool,
    /// Whether SASL (or another post-registration login step) has completed successfully.
    pub logged_in: bool,
    /// The nickname most recently confirmed by the server (not necessarily the one requested).
    pub current_nick: String,
    /// Accumulating `WHOIS` responses, keyed by target nickname.
    pub whois_data: HashMap<String, WhoisResponse>,
    /// How many times `_` has been appended while recovering from a nick collision.
    pub nick_mod: u32,
    /// Prefix character to mode character (e.g. `'@' -> 'o'`).
    pub mode_for_prefix: HashMap<char, char>,
    /// Mode character to prefix character (e.g. `'o' -> '@'`), the inverse of `mode_for_prefix`.
    pub prefix_for_mode: HashMap<char, char>,
    /// IRCv3 capability negotiation state.
    pub capabilities: Capabilities,
    /// Server features and limits from `RPL_ISUPPORT`.
    pub supported: IrcSupported,
    /// The client's own hostmask, once known (from its own prefix on an echoed message).
    pub host_mask: Option<String>,
    /// Joined channels, keyed by case-folded name.
    pub chans: HashMap<String, ChanData>,
}

impl Default for ClientState {
    fn default() -> ClientState {
        ClientState {
            registered: false,
            logged_in: false,
            current_nick: String::new(),
            whois_data: HashMap::new(),
            nick_mod: 0,
            mode_for_prefix: HashMap::new(),
            prefix_for_mode: HashMap::new(),
            capabilities: Capabilities::new(),
            supported: IrcSupported::default(),
            host_mask: None,
            chans: HashMap::new(),
        }
    }
}

impl ClientState {
    /// Creates a fresh, unregistered session state for the given starting nickname.
    pub fn new(nickname: &str) -> ClientState {
        ClientState {
            current_nick: nickname.to_owned(),
            ..ClientState::default()
        }
    }

    /// Folds a channel or nick name under the current casemapping to produce a lookup key.
    pub fn case_fold(&self, s: &str) -> String {
        self.supported.casemapping.fold(s)
    }

    fn chan_mut(&mut self, name: &str) -> Option<&mut ChanData> {
        let key = self.case_fold(name);
        self.chans.get_mut(&key)
    }

    fn ensure_chan(&mut self, name: &str) -> &mut ChanData {
        let key = self.case_fold(name);
        self.chans
            .entry(key.clone())
            .or_insert_with(|| ChanData::new(key, name.to_owned()))
    }

    /// Applies one `RPL_ISUPPORT` line's space-separated tokens.
    pub fn apply_isupport(&mut self, tokens: &[&str]) {
        for token in tokens {
            self.supported
                .apply_token(token, &mut self.mode_for_prefix, &mut self.prefix_for_mode);
        }
    }

    /// Whether `name` looks like one of our joined channels (case-fold aware).
    pub fn is_our_channel(&self, name: &str) -> bool {
        self.chans.contains_key(&self.case_fold(name))
    }

    fn nick_is_ours(&self, nick: &str) -> bool {
        nick.eq_ignore_ascii_case(&self.current_nick)
    }

    fn apply_prefix_mode(&mut self, chan: &str, user: &str, mode_char: char, adding: bool) {
        let prefix_for_mode = self.prefix_for_mode.clone();
        if let Some(prefix) = prefix_for_mode.get(&mode_char).copied() {
            if let Some(data) = self.chan_mut(chan) {
                let entry = data.users.entry(user.to_owned()).or_default();
                if adding {
                    if !entry.contains(prefix) {
                        entry.push(prefix);
                    }
                } else {
                    entry.retain(|c| c != prefix);
                }
            }
        }
    }

    /// Updates state from a single inbound `Message`; mirrors the state mutations a real IRC
    /// client library performs as a side effect of dispatching events.
    pub fn handle_message(&mut self, msg: &Message) {
        let command = msg.canonical_command();
        let prefix_nick = msg.prefix_parts().map(|p| p.nick.to_owned());

        match &*command {
            "rpl_welcome" => {
                self.registered = true;
                if let Some(nick) = msg.params().next() {
                    self.current_nick = nick.to_owned();
                }
                if let Some(trailing) = msg.params().next_back() {
                    if let Some(last) = trailing.split_whitespace().next_back() {
                        self.host_mask = Some(last.to_owned());
                    }
                }
            }
            "rpl_isupport" => {
                let tokens: Vec<&str> = msg.params().skip(1).collect();
                self.apply_isupport(&tokens);
            }
            "JOIN" => {
                if let Some(chan) = msg.params().next() {
                    if let Some(nick) = &prefix_nick {
                        if self.nick_is_ours(nick) {
                            self.ensure_chan(chan);
                        } else {
                            let data = self.ensure_chan(chan);
                            data.users.entry(nick.clone()).or_default();
                        }
                    }
                }
            }
            "PART" => {
                if let Some(chan) = msg.params().next() {
                    if let Some(nick) = &prefix_nick {
                        if self.nick_is_ours(nick) {
                            let key = self.case_fold(chan);
                            self.chans.remove(&key);
                        } else if let Some(data) = self.chan_mut(chan) {
                            data.users.remove(nick);
                        }
                    }
                }
            }
            "KICK" => {
                let mut params = msg.params();
                if let (Some(chan), Some(kicked)) = (params.next(), params.next()) {
                    if self.nick_is_ours(kicked) {
                        let key = self.case_fold(chan);
                        self.chans.remove(&key);
                    } else if let Some(data) = self.chan_mut(chan) {
                        data.users.remove(kicked);
                    }
                }
            }
            "QUIT" => {
                if let Some(nick) = &prefix_nick {
                    for data in self.chans.values_mut() {
                        data.users.remove(nick);
                    }
                }
            }
            "NICK" => {
                if let (Some(old), Some(new)) = (prefix_nick.as_deref(), msg.params().next()) {
                    if self.nick_is_ours(old) {
                        self.current_nick = new.to_owned();
                    }
                    for data in self.chans.values_mut() {
                        if let Some(prefix) = data.users.remove(old) {
                            data.users.insert(new.to_owned(), prefix);
                        }
                    }
                }
            }
            "rpl_topic" => {
                let mut params = msg.params();
                if let Some(chan) = params.next() {
                    let topic = params.next().map(str::to_owned);
                    self.ensure_chan(chan).topic = topic;
                }
            }
            "TOPIC" => {
                let mut params = msg.params();
                if let Some(chan) = params.next() {
                    let topic = params.next().map(str::to_owned);
                    let setter = prefix_nick.clone();
                    let data = self.ensure_chan(chan);
                    data.topic = topic;
                    data.topic_by = setter;
                }
            }
            "rpl_topicwhotime" => {
                let mut params = msg.params();
                if let (Some(chan), Some(who)) = (params.next(), params.next()) {
                    self.ensure_chan(chan).topic_by = Some(who.to_owned());
                }
            }
            "rpl_namreply" => {
                let mut params = msg.params();
                let _symbol = params.next();
                if let Some(chan) = params.next() {
                    if let Some(names) = params.next() {
                        let mode_for_prefix = self.mode_for_prefix.clone();
                        let data = self.ensure_chan(chan);
                        for token in names.split_whitespace() {
                            let mut prefix = String::new();
                            let mut rest = token;
                            while let Some(c) = rest.chars().next() {
                                if mode_for_prefix.contains_key(&c) {
                                    prefix.push(c);
                                    rest = &rest[c.len_utf8()..];
                                } else {
                                    break;
                                }
                            }
                            data.users.insert(rest.to_owned(), prefix);
                        }
                    }
                }
            }
            "MODE" => {
                let mut params = msg.params();
                if let Some(target) = params.next() {
                    if target.is_channel_name() {
                        let mode_str = params.next().unwrap_or("").to_owned();
                        let mode_args: Vec<String> = params.map(str::to_owned).collect();
                        self.apply_channel_mode(target, &mode_str, &mode_args);
                    }
                }
            }
            _ => {}
        }
    }

    fn apply_channel_mode(&mut self, chan: &str, mode_str: &str, args: &[String]) {
        let a = self.supported.channel_modes.a.clone();
        let b = self.supported.channel_modes.b.clone();
        let c = self.supported.channel_modes.c.clone();
        let prefix_for_mode = self.prefix_for_mode.clone();

        let mut adding = true;
        let mut arg_iter = args.iter();

        for ch in mode_str.chars() {
            match ch {
                '+' => adding = true,
                '-' => adding = false,
                _ => {
                    if prefix_for_mode.contains_key(&ch) {
                        if let Some(user) = arg_iter.next() {
                            self.apply_prefix_mode(chan, user, ch, adding);
                        }
                    } else if a.contains(ch) {
                        if let Some(param) = arg_iter.next() {
                            if let Some(data) = self.chan_mut(chan) {
                                let list = data.mode_params.entry(ch).or_default();
                                if adding {
                                    if !list.contains(param) {
                                        list.push(param.clone());
                                    }
                                } else {
                                    // Preserves the observed behavior of filtering by the mode
                                    // character rather than the parameter value.
                                    let mode_as_param = ch.to_string();
                                    list.retain(|item| item != &mode_as_param);
                                }
                            }
                        }
                    } else if b.contains(ch) {
                        if let Some(param) = arg_iter.next() {
                            if let Some(data) = self.chan_mut(chan) {
                                data.mode_params.insert(ch, vec![param.clone()]);
                            }
                        }
                        record_plain_mode(self, chan, ch, adding);
                    } else if c.contains(ch) {
                        if adding {
                            if let Some(param) = arg_iter.next() {
                                if let Some(data) = self.chan_mut(chan) {
                                    data.mode_params.insert(ch, vec![param.clone()]);
                                }
                            }
                        } else if let Some(data) = self.chan_mut(chan) {
                            data.mode_params.remove(&ch);
                        }
                        record_plain_mode(self, chan, ch, adding);
                    } else {
                        record_plain_mode(self, chan, ch, adding);
                    }
                }
            }
        }
    }
}

fn record_plain_mode(state: &mut ClientState, chan: &str, mode_char: char, adding: bool) {
    if let Some(data) = state.chan_mut(chan) {
        if adding {
            if !data.mode.contains(mode_char) {
                data.mode.push(mode_char);
            }
        } else {
            data.mode.retain(|c| c != mode_char);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use irc_proto::Message;

    fn msg(s: &str) -> Message {
        format!("{}\r\n", s).parse().unwrap()
    }

    #[test]
    fn applies_casemapping_and_prefix_isupport() {
        let mut state = ClientState::new("nick");
        state.apply_isupport(&["CASEMAPPING=ascii", "PREFIX=(ov)@+", "CHANTYPES=#"]);
        assert_eq!(state.supported.casemapping, CaseMapping::Ascii);
        assert_eq!(state.mode_for_prefix.get(&'@'), Some(&'o'));
        assert_eq!(state.prefix_for_mode.get(&'o'), Some(&'@'));
        assert!(state.supported.channel_modes.b.contains('o'));
    }

    #[test]
    fn join_and_part_track_membership() {
        let mut state = ClientState::new("nick");
        state.handle_message(&msg(":nick!u@h JOIN #chan"));
        assert!(state.is_our_channel("#chan"));
        state.handle_message(&msg(":other!u@h JOIN #chan"));
        assert!(state.chans.get("#chan").unwrap().users.contains_key("other"));
        state.handle_message(&msg(":other!u@h PART #chan"));
        assert!(!state.chans.get("#chan").unwrap().users.contains_key("other"));
    }

    #[test]
    fn nick_change_preserves_prefix() {
        let mut state = ClientState::new("nick");
        state.apply_isupport(&["PREFIX=(ov)@+"]);
        state.handle_message(&msg(":nick!u@h JOIN #chan"));
        state.handle_message(&msg(":ChanServ MODE #chan +o other"));
        state.handle_message(&msg(":other!u@h JOIN #chan"));
        state
            .chans
            .get_mut("#chan")
            .unwrap()
            .users
            .insert("other".to_owned(), "@".to_owned());
        state.handle_message(&msg(":other!u@h NICK newother"));
        let data = state.chans.get("#chan").unwrap();
        assert_eq!(data.users.get("newother").map(String::as_str), Some("@"));
        assert!(!data.users.contains_key("other"));
    }

    #[test]
    fn prefix_mode_change_updates_users_map() {
        let mut state = ClientState::new("nick");
        state.apply_isupport(&["PREFIX=(ov)@+"]);
        state.handle_message(&msg(":nick!u@h JOIN #auditorium"));
        state.handle_message(&msg(":user!u@h JOIN #auditorium"));
        state.handle_message(&msg(":ChanServ MODE #auditorium +o user"));
        assert_eq!(
            state
                .chans
                .get("#auditorium")
                .unwrap()
                .users
                .get("user")
                .map(String::as_str),
            Some("@")
        );
        state.handle_message(&msg(":ChanServ MODE #auditorium -o user"));
        assert_eq!(
            state
                .chans
                .get("#auditorium")
                .unwrap()
                .users
                .get("user")
                .map(String::as_str),
            Some("")
        );
    }

    #[test]
    fn casefolds_channel_lookup() {
        let mut state = ClientState::new("nick");
        state.apply_isupport(&["CASEMAPPING=rfc1459"]);
        state.handle_message(&msg(":nick!u@h JOIN #Chan[]"));
        assert!(state.is_our_channel("#chan{}"));
    }
}
