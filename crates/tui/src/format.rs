//! Text helpers for list rows: relative ages and truncation

use chrono::{DateTime, TimeDelta, Utc};

/// Relative age with suffix, worded like "3 minutes ago".
/// Future timestamps (clock skew) count as "now".
pub fn format_age(elapsed: TimeDelta) -> String {
    let seconds = elapsed.num_seconds().max(0) as f64;
    let minutes = (seconds / 60.0).round() as i64;

    let distance = if minutes < 1 {
        "less than a minute".to_string()
    } else if minutes == 1 {
        "1 minute".to_string()
    } else if minutes < 45 {
        format!("{} minutes", minutes)
    } else if minutes < 90 {
        "about 1 hour".to_string()
    } else if minutes < 1440 {
        format!("about {} hours", (minutes as f64 / 60.0).round() as i64)
    } else if minutes < 2520 {
        "1 day".to_string()
    } else if minutes < 43200 {
        format!("{} days", (minutes as f64 / 1440.0).round() as i64)
    } else {
        let months = (minutes as f64 / 43200.0).round() as i64;
        if minutes < 86400 {
            plural("about ", months, "month")
        } else if months < 12 {
            format!("{} months", months)
        } else {
            plural("about ", months / 12, "year")
        }
    };

    format!("{} ago", distance)
}

fn plural(prefix: &str, n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{}1 {}", prefix, unit)
    } else {
        format!("{}{} {}s", prefix, n, unit)
    }
}

/// Age of `timestamp` relative to `now`
pub fn age_since(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    format_age(now.signed_duration_since(timestamp))
}

/// Shortens `text` to at most `max` characters, ending in "…" when cut
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn age(seconds: i64) -> String {
        format_age(TimeDelta::seconds(seconds))
    }

    #[test]
    fn test_format_age_wording() {
        assert_eq!(age(0), "less than a minute ago");
        assert_eq!(age(29), "less than a minute ago");
        assert_eq!(age(30), "1 minute ago");
        assert_eq!(age(60), "1 minute ago");
        assert_eq!(age(5 * 60), "5 minutes ago");
        assert_eq!(age(50 * 60), "about 1 hour ago");
        assert_eq!(age(3 * 3600), "about 3 hours ago");
        assert_eq!(age(30 * 3600), "1 day ago");
        assert_eq!(age(5 * 86400), "5 days ago");
        assert_eq!(age(40 * 86400), "about 1 month ago");
        assert_eq!(age(100 * 86400), "3 months ago");
        assert_eq!(age(400 * 86400), "about 1 year ago");
        assert_eq!(age(800 * 86400), "about 2 years ago");
    }

    #[test]
    fn test_future_timestamp_is_now() {
        let now = Utc::now();
        let later = now + TimeDelta::minutes(5);
        assert_eq!(age_since(later, now), "less than a minute ago");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("/webhook", 20), "/webhook");
        assert_eq!(truncate("/webhook", 8), "/webhook");
        assert_eq!(truncate("/webhook/payments", 8), "/webhoo…");
        assert_eq!(truncate("ünïcödé-päth", 5), "ünïc…");
        assert_eq!(truncate("abc", 0), "");
    }
}
