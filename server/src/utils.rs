use chrono::{DateTime, Local, TimeZone};

/// Human-readable timestamp layout, e.g. `Monday, October 19, 2026 at 02:05 PM`
pub const TIMESTAMP_FORMAT: &str = "%A, %B %d, %Y at %I:%M %p";

// Current local wall-clock time in the friendly format
pub fn friendly_now() -> String {
    format_timestamp(&Local::now())
}

pub fn format_timestamp<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format(TIMESTAMP_FORMAT).to_string()
}

// Collapse line breaks so one value always fits on one log line
pub fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_format_timestamp() {
        let time = Utc.with_ymd_and_hms(2026, 10, 19, 14, 5, 0).unwrap();
        assert_eq!(format_timestamp(&time), "Monday, October 19, 2026 at 02:05 PM");
    }

    #[test]
    fn test_friendly_now_shape() {
        let now = friendly_now();
        assert!(now.contains(" at "));
        assert!(now.ends_with("AM") || now.ends_with("PM"));
    }

    #[test]
    fn test_single_line() {
        assert_eq!(single_line("a\nb\r\nc"), "a b  c");
        assert_eq!(single_line("plain"), "plain");
    }
}
