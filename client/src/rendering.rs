//! Terminal rendering of server responses

use shared::Response;

pub const RESET: &str = "\x1b[0m";

/// ANSI escape for a colour name, falling back to reset for unknown names
pub fn color_code(name: &str) -> &'static str {
    match name.to_ascii_lowercase().as_str() {
        "red" => "\x1b[91m",
        "green" => "\x1b[92m",
        "yellow" => "\x1b[93m",
        "blue" => "\x1b[94m",
        "purple" => "\x1b[95m",
        "cyan" => "\x1b[96m",
        _ => RESET,
    }
}

/// Colour names offered to the user
pub const COLOR_NAMES: [&str; 7] = ["red", "green", "yellow", "blue", "purple", "cyan", "reset"];

pub fn colorize(text: &str, color: &str) -> String {
    format!("{}{}{}", color_code(color), text, RESET)
}

/// Formats a response for display
///
/// Chat replies and announcements are shown in their colour, history is
/// printed verbatim, errors are prefixed, and anything else is pretty JSON.
pub fn format_response(response: &Response) -> String {
    if !response.is_ok() {
        return format!("Error: {}", response.error.as_deref().unwrap_or("unknown error"));
    }

    if let Some(reply) = response.data_str("reply") {
        let color = response.data_str("color").unwrap_or("reset");
        return colorize(reply, color);
    }

    if let Some(history) = response.data_str("history") {
        return if history.is_empty() {
            "(no chat history yet)".to_string()
        } else {
            history.trim_end().to_string()
        };
    }

    match &response.data {
        Some(data) => serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string()),
        None => "(empty response)".to_string(),
    }
}
