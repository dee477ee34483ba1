use once_cell::sync::Lazy;
use regex::Regex;

use super::types::GrabOutcome;

// Failure reason the portal embeds in its JSON-ish reply
static FAILURE_MSG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""选课失败：(.+)""#).expect("failure pattern is valid")
});

/// Interpret the body of an enrollment reply.
///
/// The first matching marker wins: `true`, then `冲突`, then
/// `当前教学班已选择！`, then `null`. `None` means nothing terminal was
/// recognised and the request should be sent again.
pub fn classify_response(text: &str) -> Option<GrabOutcome> {
    if text.contains("true") {
        return Some(GrabOutcome::Success);
    }

    if text.contains("冲突") {
        let msg = failure_message(text).unwrap_or_else(|| "课程冲突".to_string());
        return Some(GrabOutcome::Conflict(msg));
    }

    if text.contains("当前教学班已选择！") {
        let msg = failure_message(text).unwrap_or_else(|| "当前教学班已选择".to_string());
        return Some(GrabOutcome::AlreadySelected(msg));
    }

    if text.contains("null") {
        return Some(GrabOutcome::NotFound);
    }

    None
}

fn failure_message(text: &str) -> Option<String> {
    FAILURE_MSG_RE
        .captures(text)
        .map(|cap| cap[1].to_string())
}
