//! Year/day bucketing for sticky-header gallery sections.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Local, NaiveTime, TimeZone, Utc};

use crate::domain::entities::DateSection;

/// Groups items by year then day, newest first, in the local time zone.
pub fn group_by_year_day<T, F>(items: &[T], get_date: F) -> Vec<DateSection<T>>
where
    T: Clone,
    F: Fn(&T) -> DateTime<Utc>,
{
    group_by_year_day_in(items, get_date, &Local)
}

/// Groups items by year then day, newest first, in `tz`.
///
/// Equal timestamps keep their input order.
pub fn group_by_year_day_in<T, F, Tz>(items: &[T], get_date: F, tz: &Tz) -> Vec<DateSection<T>>
where
    T: Clone,
    F: Fn(&T) -> DateTime<Utc>,
    Tz: TimeZone,
{
    let mut sorted: Vec<(DateTime<Utc>, &T)> = items.iter().map(|i| (get_date(i), i)).collect();
    sorted.sort_by(|a, b| b.0.cmp(&a.0));

    let mut years: BTreeMap<i32, BTreeMap<i64, Vec<T>>> = BTreeMap::new();
    for (date, item) in sorted {
        let local = date.with_timezone(tz);
        years
            .entry(local.year())
            .or_default()
            .entry(local_midnight_millis(&local))
            .or_default()
            .push(item.clone());
    }

    let mut sections = Vec::new();
    for (year, days) in years.into_iter().rev() {
        for (index, (day_ts, items)) in days.into_iter().rev().enumerate() {
            sections.push(DateSection {
                year: year.to_string(),
                day_ts,
                items,
                is_first_of_year: index == 0,
            });
        }
    }
    sections
}

/// Local midnight of the day containing `local`, in epoch milliseconds.
/// Falls back to the instant itself when midnight does not exist (DST gap).
fn local_midnight_millis<Tz: TimeZone>(local: &DateTime<Tz>) -> i64 {
    let midnight = local.date_naive().and_time(NaiveTime::MIN);
    local
        .timezone()
        .from_local_datetime(&midnight)
        .earliest()
        .map_or_else(|| local.timestamp_millis(), |dt| dt.timestamp_millis())
}
