//! Tracking for IRCv3 capability negotiation (`CAP LS`/`REQ`/`ACK`/`NAK`/`END`).
use std::collections::HashSet;

use irc_proto::Capability;

/// The SASL mechanism currently being negotiated or in use, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaslState {
    /// No SASL negotiation is in progress.
    Inactive,
    /// `AUTHENTICATE PLAIN` was requested and is awaiting a `+` continuation.
    Plain,
    /// `AUTHENTICATE EXTERNAL` was requested and is awaiting a `+` continuation.
    External,
}

/// Tracks the state of IRCv3 capability negotiation for a single connection.
///
/// `CAP LS` and `CAP ACK` responses may arrive split across multiple lines (indicated by a
/// `*` multi-line marker as the second-to-last parameter); this accumulates those fragments
/// until the server signals the list is complete.
#[derive(Clone, Debug, Default)]
pub struct Capabilities {
    /// Capabilities the server has advertised via `CAP LS`.
    available: HashSet<String>,
    /// Capabilities the server has acknowledged via `CAP ACK`.
    enabled: HashSet<String>,
    /// Accumulator for a `CAP LS`/`CAP ACK` reply split across multiple lines.
    pending_ls: Vec<String>,
    sasl: SaslState,
    negotiating: bool,
}

impl Capabilities {
    /// Creates an empty capability tracker.
    pub fn new() -> Capabilities {
        Capabilities::default()
    }

    /// Whether capability negotiation has been started (a `CAP LS` has been sent) and not yet
    /// ended (via `CAP END`).
    pub fn negotiating(&self) -> bool {
        self.negotiating
    }

    /// Marks negotiation as started.
    pub fn begin_negotiation(&mut self) {
        self.negotiating = true;
    }

    /// Marks negotiation as finished, e.g. after sending `CAP END`.
    pub fn end_negotiation(&mut self) {
        self.negotiating = false;
    }

    /// Records a line of capabilities from a `CAP LS` reply. `is_final` should be `false` when
    /// the reply's second-to-last parameter is `*`, indicating more lines follow.
    pub fn record_ls(&mut self, caps_line: &str, is_final: bool) {
        self.pending_ls.extend(caps_line.split_whitespace().map(strip_value).map(str::to_owned));
        if is_final {
            self.available.extend(self.pending_ls.drain(..));
        }
    }

    /// Records a line of capabilities from a `CAP ACK` reply, enabling each one.
    pub fn record_ack(&mut self, caps_line: &str, is_final: bool) {
        self.pending_ls.extend(caps_line.split_whitespace().map(strip_value).map(str::to_owned));
        if is_final {
            for cap in self.pending_ls.drain(..) {
                self.available.insert(cap.clone());
                self.enabled.insert(cap);
            }
        }
    }

    /// Records that the server rejected a `CAP REQ` (`CAP NAK`); none of the listed
    /// capabilities are enabled.
    pub fn record_nak(&mut self, _caps_line: &str) {
        // Rejected capabilities never become part of `enabled`; nothing else to track.
    }

    /// Returns true if the server advertised the given capability in `CAP LS`.
    pub fn is_available(&self, cap: &Capability) -> bool {
        self.available.contains(cap.as_ref())
    }

    /// Returns true if the given capability has been acknowledged (`CAP ACK`).
    pub fn is_enabled(&self, cap: &Capability) -> bool {
        self.enabled.contains(cap.as_ref())
    }

    /// Returns true if the server advertised `sasl` in `CAP LS`.
    pub fn supports_sasl(&self) -> bool {
        self.available.contains("sasl")
    }

    /// Begins tracking a SASL mechanism negotiation.
    pub fn begin_sasl(&mut self, state: SaslState) {
        self.sasl = state;
    }

    /// Returns the SASL mechanism currently in progress, if any.
    pub fn sasl_state(&self) -> SaslState {
        self.sasl
    }

    /// Clears any in-progress SASL negotiation.
    pub fn clear_sasl(&mut self) {
        self.sasl = SaslState::Inactive;
    }
}

impl Default for SaslState {
    fn default() -> SaslState {
        SaslState::Inactive
    }
}

/// `CAP LS`/`CAP ACK` lines may tag a capability with a value (`sasl=PLAIN,EXTERNAL`); strip
/// it off since only the capability name itself is tracked here.
fn strip_value(token: &str) -> &str {
    token.split('=').next().unwrap_or(token)
}

#[cfg(test)]
mod test {
    use super::{Capabilities, SaslState};
    use irc_proto::Capability;

    #[test]
    fn accumulates_multiline_ls() {
        let mut caps = Capabilities::new();
        caps.record_ls("multi-prefix sasl=PLAIN,EXTERNAL", false);
        assert!(!caps.is_available(&Capability::Sasl));
        caps.record_ls("away-notify", true);
        assert!(caps.is_available(&Capability::MultiPrefix));
        assert!(caps.is_available(&Capability::Sasl));
        assert!(caps.is_available(&Capability::AwayNotify));
        assert!(caps.supports_sasl());
    }

    #[test]
    fn ack_enables_capabilities() {
        let mut caps = Capabilities::new();
        caps.record_ack("multi-prefix away-notify", true);
        assert!(caps.is_enabled(&Capability::MultiPrefix));
        assert!(caps.is_enabled(&Capability::AwayNotify));
        assert!(!caps.is_enabled(&Capability::Sasl));
    }

    #[test]
    fn sasl_state_round_trips() {
        let mut caps = Capabilities::new();
        assert_eq!(caps.sasl_state(), SaslState::Inactive);
        caps.begin_sasl(SaslState::Plain);
        assert_eq!(caps.sasl_state(), SaslState::Plain);
        caps.clear_sasl();
        assert_eq!(caps.sasl_state(), SaslState::Inactive);
    }
}
