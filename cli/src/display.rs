//! One-line text rendering of run events and approvals for `warden watch`.

use warden::{Approval, EventKind, RunEvent};

/// Max chars of payload text shown per event line.
pub const DEFAULT_MAX_LEN: usize = 120;

/// Truncates `s` to at most `max` chars; appends "..." when truncated. UTF-8 safe.
pub fn truncate_display(s: &str, max: usize) -> String {
    const SUFFIX: &str = "...";
    let suffix_len = 3;
    if max <= suffix_len {
        return s.chars().take(max).collect();
    }
    if s.chars().count() <= max {
        return s.to_string();
    }
    format!(
        "{}{}",
        s.chars().take(max - suffix_len).collect::<String>(),
        SUFFIX
    )
}

/// `HH:MM:SS kind: detail` with the payload summarized.
pub fn format_event(event: &RunEvent, max: usize) -> String {
    let detail = match event.kind {
        EventKind::ApprovalRequired => String::new(),
        _ => match event.thought_text() {
            Some(text) => text.to_string(),
            None if event.payload.is_null() => String::new(),
            None => event.payload.to_string(),
        },
    };
    let time = event.timestamp.format("%H:%M:%S");
    if detail.is_empty() {
        format!("{} {}", time, event.kind)
    } else {
        format!("{} {}: {}", time, event.kind, truncate_display(&detail, max))
    }
}

pub fn format_approval(approval: &Approval, max: usize) -> String {
    format!(
        "approval {} [{} risk, {}] {} (expires {})",
        approval.id,
        approval.risk,
        approval.capability,
        truncate_display(&approval.action.command, max),
        approval.expires_at.format("%H:%M:%S"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn event(kind: EventKind, payload: serde_json::Value) -> RunEvent {
        RunEvent::new("e1", "r1", kind, Utc.with_ymd_and_hms(2026, 1, 1, 9, 30, 5).unwrap())
            .with_payload(payload)
    }

    #[test]
    fn truncate_display_keeps_total_length() {
        assert_eq!(truncate_display("hello", 10), "hello");
        let got = truncate_display(&"é".repeat(50), 10);
        assert_eq!(got.chars().count(), 10);
        assert!(got.ends_with("..."));
    }

    #[test]
    fn thought_shows_text_and_done_shows_kind_only() {
        assert_eq!(
            format_event(&event(EventKind::Thought, json!("plan")), 80),
            "09:30:05 thought: plan"
        );
        assert_eq!(format_event(&event(EventKind::Done, json!(null)), 80), "09:30:05 done");
        assert_eq!(
            format_event(&event(EventKind::ToolCall, json!({"tool": "ls"})), 80),
            r#"09:30:05 tool_call: {"tool":"ls"}"#
        );
    }
}
