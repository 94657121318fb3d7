//! The line splitter and outgoing send pipeline: flood protection, serialization discipline, and
//! grapheme-safe message splitting.
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{sleep_until, Instant};
use unicode_segmentation::UnicodeSegmentation;

use irc_proto::{Command, Message};

use crate::error;

/// The minimum practical delay between two flood-protected sends.
const MIN_FLOOD_DELAY: Duration = Duration::from_millis(33);

/// Splits `text` into chunks of at most `budget` bytes, preferring to break at the last space
/// within a chunk (the space itself is consumed, not emitted). Extended grapheme clusters (so
/// multi-codepoint emoji and combining marks) are never split mid-sequence; the budget is
/// measured in the UTF-8 byte length of each grapheme, matching the server's byte-oriented line
/// limit.
///
/// Returns an empty `Vec` for empty input. Re-splitting an already-split list at the same
/// budget is idempotent, since every returned chunk already satisfies the budget.
pub fn split_line(text: &str, budget: usize) -> Vec<String> {
    if text.is_empty() || budget == 0 {
        return Vec::new();
    }

    let graphemes: Vec<&str> = text.graphemes(true).collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < graphemes.len() {
        let mut end = start;
        let mut len = 0usize;
        let mut last_space = None;

        while end < graphemes.len() {
            let glen = graphemes[end].len();
            if len + glen > budget && end > start {
                break;
            }
            if graphemes[end] == " " {
                last_space = Some(end);
            }
            len += glen;
            end += 1;
        }

        if end < graphemes.len() {
            if let Some(space_idx) = last_space {
                if space_idx + 1 == end {
                    chunks.push(graphemes[start..space_idx].concat());
                    start = space_idx + 1;
                    continue;
                }
            }
        }

        chunks.push(graphemes[start..end].concat());
        start = end;
    }

    chunks
}

/// Splits `text` on `\r`, `\n`, or `\r\n` into individual lines, then runs each through
/// [`split_line`] with the given budget.
pub fn split_message(text: &str, budget: usize) -> Vec<String> {
    text.split(|c| c == '\r' || c == '\n')
        .filter(|line| !line.is_empty())
        .flat_map(|line| split_line(line, budget))
        .collect()
}

/// Computes the effective per-line budget for a message sent to `target`, per the documented
/// formula: `min(message_split, 497 - len(current_nick) - len(host_mask) - len(target))`.
pub fn effective_budget(message_split: usize, current_nick: &str, host_mask: &str, target: &str) -> usize {
    let overhead = current_nick.len() + host_mask.len() + target.len();
    let server_budget = 497usize.saturating_sub(overhead);
    message_split.min(server_budget).max(1)
}

/// Serializes a single "part" per the trailing-parameter rule: if it contains whitespace,
/// begins with `:`, or is empty, the wire form must carry it as the trailing parameter.
fn needs_trailing(part: &str) -> bool {
    part.is_empty() || part.starts_with(':') || part.contains(' ')
}

/// The outgoing send pipeline. Owns the channel through which every outbound `Command` is
/// funneled so that writes are serialized in caller order and (optionally) flood-protected.
pub struct SendPipeline {
    outgoing: UnboundedSender<Message>,
    flood_protection: bool,
    flood_protection_delay: Duration,
    last_send: Instant,
    disconnect_requested: bool,
}

impl SendPipeline {
    /// Creates a new pipeline writing onto `outgoing`.
    pub fn new(outgoing: UnboundedSender<Message>, flood_protection: bool, flood_protection_delay_ms: u32) -> SendPipeline {
        SendPipeline {
            outgoing,
            flood_protection,
            flood_protection_delay: Duration::from_millis(u64::from(flood_protection_delay_ms)).max(MIN_FLOOD_DELAY),
            last_send: Instant::now() - Duration::from_secs(3600),
            disconnect_requested: false,
        }
    }

    /// Marks the pipeline as disconnected; all subsequent sends are silently dropped.
    pub fn request_disconnect(&mut self) {
        self.disconnect_requested = true;
    }

    /// Sends a single already-constructed `Command`, applying flood protection if enabled.
    /// Returns immediately (without waiting out the flood delay) if disconnect was requested.
    pub async fn send_command(&mut self, command: Command) -> error::Result<()> {
        if self.disconnect_requested {
            return Ok(());
        }

        if self.flood_protection {
            let earliest = self.last_send + self.flood_protection_delay;
            sleep_until(earliest).await;
        }

        self.outgoing
            .send(Message::from(command))
            .map_err(|_| error::Error::Disconnected)?;
        self.last_send = Instant::now();

        Ok(())
    }

    /// Builds and sends a raw command from its trailing-parameter-aware parts, mirroring the
    /// documented `send(...parts)` API: the final part is serialized as the trailing parameter
    /// if it contains whitespace, starts with `:`, or is empty.
    pub async fn send_parts(&mut self, cmd: &str, parts: &[&str]) -> error::Result<()> {
        let (args, suffix) = match parts.split_last() {
            Some((last, rest)) if needs_trailing(last) => (rest.to_vec(), Some(*last)),
            Some(_) => (parts.to_vec(), None),
            None => (Vec::new(), None),
        };

        self.send_command(Command::Raw(
            cmd.to_owned(),
            args.into_iter().map(str::to_owned).collect(),
            suffix.map(str::to_owned),
        ))
        .await
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn splits_at_spaces_within_budget() {
        assert_eq!(
            split_line("abcdefg 😸😹😺😻 😸😹a😺😻", 9),
            vec!["abcdefg", "😸😹", "😺😻", "😸😹a", "😺😻"]
        );
    }

    #[test]
    fn empty_input_is_empty_list() {
        assert!(split_line("", 10).is_empty());
    }

    #[test]
    fn splitting_is_idempotent() {
        let once = split_message("one two three four five six seven eight", 10);
        let joined = once.join("\r\n");
        let twice = split_message(&joined, 10);
        assert_eq!(once, twice);
    }

    #[test]
    fn hard_cut_when_no_space_available() {
        assert_eq!(split_line("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn trailing_rule_applies_to_empty_or_prefixed_or_spaced_final_part() {
        assert!(needs_trailing(""));
        assert!(needs_trailing(":already"));
        assert!(needs_trailing("has space"));
        assert!(!needs_trailing("plain"));
    }
}
