use chrono::{Days, Local, NaiveDate, NaiveTime};
use log::debug;
use std::cmp::Ordering;
use std::str::FromStr;

/// Excel's day zero for serial dates (the 1900 leap-year bug is baked in).
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0; // 31/12/9999

/// Parse a fixture date: `DD/MM/YYYY`, `YYYY-MM-DD`, or an Excel serial day number.
pub fn parse_match_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = if raw.contains('/') {
        NaiveDate::parse_from_str(raw, "%d/%m/%Y").ok()
    } else if raw.contains('-') {
        let day_part = raw.split(['T', ' ']).next().unwrap_or(raw);
        NaiveDate::parse_from_str(day_part, "%Y-%m-%d").ok()
    } else {
        parse_excel_serial(raw)
    };

    if parsed.is_none() {
        debug!("unparseable match date {raw:?}");
    }
    parsed
}

fn parse_excel_serial(raw: &str) -> Option<NaiveDate> {
    let serial = raw.parse::<f64>().ok()?;
    if !serial.is_finite() || serial < 1.0 || serial > MAX_EXCEL_SERIAL {
        return None;
    }
    let (y, m, d) = EXCEL_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)?.checked_add_days(Days::new(serial.floor() as u64))
}

/// Parse a kickoff time: `HH:MM`, `HH:MM:SS`, or an Excel day fraction.
pub fn parse_match_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.contains(':') {
        return NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .ok();
    }
    let fraction = raw.parse::<f64>().ok()?;
    if !(0.0..1.0).contains(&fraction) {
        return None;
    }
    let seconds = (fraction * 86_400.0).round() as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds.min(86_399), 0)
}

/// Where rows without a date go when a list is sorted by date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingDatePolicy {
    /// After every dated row, whichever the direction.
    #[default]
    Last,
    /// Before every dated row.
    First,
    /// Pretend the row is dated today. Results depend on when the sort runs.
    Now,
}

impl FromStr for MissingDatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last" => Ok(MissingDatePolicy::Last),
            "first" => Ok(MissingDatePolicy::First),
            "now" => Ok(MissingDatePolicy::Now),
            other => Err(format!("unknown missing-date policy: {other}")),
        }
    }
}

/// Stable sort, most recent first.
pub fn sort_by_date_desc<T, F>(items: &mut [T], policy: MissingDatePolicy, date_of: F)
where
    F: Fn(&T) -> Option<NaiveDate>,
{
    sort_by_date_at(items, policy, true, Local::now().date_naive(), date_of);
}

/// Stable sort, oldest first.
pub fn sort_by_date_asc<T, F>(items: &mut [T], policy: MissingDatePolicy, date_of: F)
where
    F: Fn(&T) -> Option<NaiveDate>,
{
    sort_by_date_at(items, policy, false, Local::now().date_naive(), date_of);
}

/// Same as the public sorts with an explicit "today" for `MissingDatePolicy::Now`.
pub fn sort_by_date_at<T, F>(
    items: &mut [T],
    policy: MissingDatePolicy,
    descending: bool,
    today: NaiveDate,
    date_of: F,
) where
    F: Fn(&T) -> Option<NaiveDate>,
{
    let resolve = |item: &T| match (date_of(item), policy) {
        (None, MissingDatePolicy::Now) => Some(today),
        (date, _) => date,
    };
    items.sort_by(|a, b| compare_dates(resolve(a), resolve(b), descending, policy));
}

fn compare_dates(
    a: Option<NaiveDate>,
    b: Option<NaiveDate>,
    descending: bool,
    policy: MissingDatePolicy,
) -> Ordering {
    let undated = if policy == MissingDatePolicy::First {
        Ordering::Less
    } else {
        Ordering::Greater
    };
    match (a, b) {
        (Some(a), Some(b)) if descending => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => undated,
        (Some(_), None) => undated.reverse(),
    }
}
