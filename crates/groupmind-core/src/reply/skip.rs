//! The "no reply" sentinel the model can return.

use groupmind_types::message::ReplyOutcome;

/// Shown when the model returns nothing but whitespace.
pub const SILENT_REPLY: &str = "(model stayed silent)";

/// Interpret final model text against the skip sentinel.
///
/// - exactly the marker (after trimming): `NoReply`
/// - marker as a prefix of longer text: the marker is stripped
/// - empty text: [`SILENT_REPLY`]
pub fn interpret_final_text(text: &str, marker: &str) -> ReplyOutcome {
    let trimmed = text.trim();
    if marker.is_empty() {
        return reply_or_silent(trimmed);
    }
    if trimmed == marker {
        return ReplyOutcome::NoReply;
    }
    match trimmed.strip_prefix(marker) {
        Some(rest) => reply_or_silent(rest.trim_start()),
        None => reply_or_silent(trimmed),
    }
}

fn reply_or_silent(text: &str) -> ReplyOutcome {
    if text.is_empty() {
        ReplyOutcome::Reply(SILENT_REPLY.to_string())
    } else {
        ReplyOutcome::Reply(text.to_string())
    }
}
