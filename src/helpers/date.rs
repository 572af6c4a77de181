//! Date helper functions

use chrono::NaiveDate;

/// Format a date for display (like "January 5, 2024")
pub fn long_date(date: &NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Format a date as `YYYY-MM-DD`
pub fn iso_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format a date as an RFC 3339 timestamp at midnight UTC, for feeds
pub fn date_rfc3339(date: &NaiveDate) -> String {
    format!("{}T00:00:00Z", iso_date(date))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(long_date(&date), "January 5, 2024");
    }

    #[test]
    fn test_feed_dates() {
        let date = NaiveDate::from_ymd_opt(2023, 11, 30).unwrap();
        assert_eq!(iso_date(&date), "2023-11-30");
        assert_eq!(date_rfc3339(&date), "2023-11-30T00:00:00Z");
    }
}
