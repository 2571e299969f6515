use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert a millisecond timestamp into a UTC datetime
pub fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// Day after `from`, rolled forward past the weekend
///
/// Friday → Saturday rolls to Monday; Saturday → Sunday rolls to Monday.
pub fn next_business_day(from: NaiveDate) -> NaiveDate {
    let tomorrow = from + Duration::days(1);
    match tomorrow.weekday() {
        Weekday::Sat => tomorrow + Duration::days(2),
        Weekday::Sun => tomorrow + Duration::days(1),
        _ => tomorrow,
    }
}

/// Start of the UTC day containing `millis`, in milliseconds
pub fn start_of_day_millis(millis: i64) -> i64 {
    const DAY_MS: i64 = 86_400_000;
    millis - millis.rem_euclid(DAY_MS)
}
