//! Message framing
//!
//! A producer sends one line per pipe: `<name> <pid>: <message>`, or
//! `<pid>: <message>` when the process name is unknown. The whole line is
//! capped at [`MAX_MESSAGE_BYTES`](crate::MAX_MESSAGE_BYTES); the message
//! part is cut at the last character boundary that fits.

use crate::{FrameError, FrameResult, MAX_MESSAGE_BYTES};

/// Build the line a producer writes into its pipe.
///
/// Fails only if the `<name> <pid>: ` prefix alone leaves no room.
pub fn frame_message(name: Option<&str>, pid: u32, message: &str) -> FrameResult<String> {
    let mut line = match name {
        Some(name) => format!("{} {}: ", name, pid),
        None => format!("{}: ", pid),
    };

    if line.len() >= MAX_MESSAGE_BYTES {
        return Err(FrameError::PrefixTooLong { len: line.len() });
    }

    let room = MAX_MESSAGE_BYTES - line.len();
    line.push_str(truncate_at_boundary(message, room));
    Ok(line)
}

/// Longest prefix of `s` that is at most `max_bytes` long and ends on a
/// character boundary.
pub fn truncate_at_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Turn the bytes a worker read into the text that gets logged.
///
/// Invalid UTF-8 is replaced, and trailing newlines and NUL padding are
/// dropped because the log writer terminates every line itself.
pub fn decode_payload(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.trim_end_matches(['\n', '\r', '\0']).to_string()
}
