use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};

/// Days shown in the rolling checklist.
pub const CHECKLIST_DAYS: usize = 11;
/// Trailing days covered by the heat-map.
pub const HEATMAP_DAYS: usize = 365;
/// Columns in the heat-map grid.
pub const HEATMAP_WEEKS: usize = 52;

const DAYS_PER_WEEK: usize = 7;

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// `n` consecutive days ending today, oldest first.
pub fn last_n_days(n: usize) -> Vec<NaiveDate> {
    last_n_days_from(today(), n)
}

/// Every element is derived from the single `today` reference, so the window
/// cannot straddle midnight.
pub fn last_n_days_from(today: NaiveDate, n: usize) -> Vec<NaiveDate> {
    (0..n)
        .rev()
        .map(|offset| today - Duration::days(offset as i64))
        .collect()
}

pub fn last_n_days_as_weeks(days: usize, weeks_out: usize) -> Vec<Vec<NaiveDate>> {
    last_n_days_as_weeks_from(today(), days, weeks_out)
}

/// Lays the trailing `days` out as `weeks_out` columns of seven days.
///
/// The grid only holds whole weeks: with the defaults (365 days, 52 weeks) the
/// oldest day falls off and the grid covers the trailing 364 days.
pub fn last_n_days_as_weeks_from(
    today: NaiveDate,
    days: usize,
    weeks_out: usize,
) -> Vec<Vec<NaiveDate>> {
    let weeks = weeks_out.min(days / DAYS_PER_WEEK);
    last_n_days_from(today, weeks * DAYS_PER_WEEK)
        .chunks(DAYS_PER_WEEK)
        .map(<[NaiveDate]>::to_vec)
        .collect()
}

/// Truncates an instant to the server's local calendar day.
pub fn day_key<Tz: TimeZone>(instant: &DateTime<Tz>) -> NaiveDate {
    instant.with_timezone(&Local).date_naive()
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|instant| day_key(&instant))
}
