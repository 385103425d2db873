use chrono::{Local, TimeZone};
use looka_llm::ChatMessage;
use std::fmt::Display;

pub const TRANSCRIPT_FILE_NAME: &str = "looka-chat.txt";

/// Plain-text transcript in local time
pub fn export(messages: &[ChatMessage]) -> String {
    export_in(messages, &Local)
}

/// `[HH:MM] You|Looka: content`, one entry per message, blank-line separated
pub fn export_in<Tz>(messages: &[ChatMessage], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    messages
        .iter()
        .map(|m| {
            format!(
                "[{}] {}: {}",
                m.timestamp.with_timezone(tz).format("%H:%M"),
                m.role.display_name(),
                m.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
