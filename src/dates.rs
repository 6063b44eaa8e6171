use chrono::{Duration, NaiveDate, NaiveDateTime};
use regex::Regex;

const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ABSOLUTE_FORMATS: [&str; 4] = ["%b %d, %Y", "%B %d, %Y", "%Y-%m-%d", "%d %b %Y"];

/// Normalizes a free-text "posted" label into `YYYY-MM-DD HH:MM:SS`.
///
/// Handles relative durations ("3 days ago", "45 mins", "1w"), the literals
/// "today" and "yesterday", and a fixed list of absolute formats, all
/// measured against `reference`. Text that matches nothing comes back
/// trimmed but otherwise unchanged; callers must treat a non-canonical
/// string as unparsed-but-preserved. Blank input yields `None`.
pub fn normalize_posted_date(text: &str, reference: NaiveDateTime) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let prefix = Regex::new(r"(?i)^posted[:\s]*").unwrap();
    let label = prefix.replace(trimmed, "");
    let label = label.trim();
    if label.is_empty() {
        return None;
    }

    if let Some(instant) = parse_relative(label, reference) {
        return Some(canonical(instant));
    }

    let yesterday = Regex::new(r"(?i)\byesterday\b").unwrap();
    if yesterday.is_match(label) {
        return Some(canonical(reference - Duration::days(1)));
    }

    let today = Regex::new(r"(?i)\btoday\b").unwrap();
    if today.is_match(label) {
        return Some(canonical(reference));
    }

    if let Some(instant) = parse_absolute(label) {
        return Some(canonical(instant));
    }

    Some(trimmed.to_string())
}

fn canonical(instant: NaiveDateTime) -> String {
    instant.format(CANONICAL_FORMAT).to_string()
}

fn parse_relative(label: &str, reference: NaiveDateTime) -> Option<NaiveDateTime> {
    let pattern =
        Regex::new(r"(?i)^(\d+)\s*(minutes?|mins?|m|hours?|hrs?|h|days?|d|weeks?|w)\b").unwrap();
    let captures = pattern.captures(label)?;

    let amount: i64 = captures[1].parse().ok()?;
    let unit = captures[2].to_lowercase();

    let delta = if unit.starts_with('m') {
        Duration::minutes(amount)
    } else if unit.starts_with('h') {
        Duration::hours(amount)
    } else if unit.starts_with('d') {
        Duration::days(amount)
    } else {
        Duration::weeks(amount)
    };

    Some(reference - delta)
}

fn parse_absolute(label: &str) -> Option<NaiveDateTime> {
    for format in ABSOLUTE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(label, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap()
    }

    #[test]
    fn relative_durations_subtract_from_the_reference() {
        let cases = [
            ("Posted 3 days ago", "2025-03-07 12:30:00"),
            ("Posted 45 mins ago", "2025-03-10 11:45:00"),
            ("2 hours ago", "2025-03-10 10:30:00"),
            ("1w", "2025-03-03 12:30:00"),
            ("5m", "2025-03-10 12:25:00"),
            ("posted 1 hr ago", "2025-03-10 11:30:00"),
        ];
        for (input, expected) in cases {
            assert_eq!(
                normalize_posted_date(input, reference()).as_deref(),
                Some(expected),
                "input: {input}"
            );
        }
    }

    #[test]
    fn today_and_yesterday_literals() {
        assert_eq!(
            normalize_posted_date("Posted today", reference()).as_deref(),
            Some("2025-03-10 12:30:00")
        );
        assert_eq!(
            normalize_posted_date("Posted yesterday", reference()).as_deref(),
            Some("2025-03-09 12:30:00")
        );
    }

    #[test]
    fn absolute_formats_render_at_midnight() {
        let cases = [
            "Jan 5, 2025",
            "January 5, 2025",
            "2025-01-05",
            "05 Jan 2025",
        ];
        for input in cases {
            assert_eq!(
                normalize_posted_date(input, reference()).as_deref(),
                Some("2025-01-05 00:00:00"),
                "input: {input}"
            );
        }
    }

    #[test]
    fn unparseable_text_is_preserved_trimmed() {
        assert_eq!(
            normalize_posted_date("  Who knows  ", reference()).as_deref(),
            Some("Who knows")
        );
    }

    #[test]
    fn blank_and_label_only_inputs_yield_nothing() {
        assert_eq!(normalize_posted_date("", reference()), None);
        assert_eq!(normalize_posted_date("   ", reference()), None);
        assert_eq!(normalize_posted_date("Posted:", reference()), None);
    }

    #[test]
    fn colon_after_the_posted_label_is_accepted() {
        assert_eq!(
            normalize_posted_date("Posted: 10m ago", reference()).as_deref(),
            Some("2025-03-10 12:20:00")
        );
    }
}
