//! Dashboard views over stored records.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{DateTime, Datelike, NaiveDate};
use regex::Regex;
use serde::Serialize;

use super::TestRecord;
use crate::error::ValidationError;

/// Label used by [`counts_by_date`] for records without a date.
pub const NO_DATE: &str = "Sin fecha";

fn iso_date() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("Invalid regex pattern")
    })
}

fn day_month_year() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{2})/(\d{2})/(\d{4})$").expect("Invalid regex pattern")
    })
}

/// Records registered on one day of a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayCount {
    /// Day of the month, starting at 1.
    pub day: u32,
    /// Number of records dated that day.
    pub count: usize,
}

/// Records whose id and field values, joined by spaces, contain `query`,
/// ignoring case.
///
/// A match may span neighbouring values. A blank query matches everything.
#[must_use]
pub fn search<'a>(records: &'a [TestRecord], query: &str) -> Vec<&'a TestRecord> {
    if query.trim().is_empty() {
        return records.iter().collect();
    }
    let needle = query.to_lowercase();

    records
        .iter()
        .filter(|record| searchable_text(record).contains(&needle))
        .collect()
}

fn searchable_text(record: &TestRecord) -> String {
    std::iter::once(record.id.to_string())
        .chain(record.fields.keys().filter_map(|name| record.field(name)))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Parse a record date in any of the accepted layouts.
///
/// Accepts `YYYY-MM-DD`, `DD/MM/YYYY`, and RFC 3339 timestamps.
#[must_use]
pub fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Some(caps) = iso_date().captures(raw) {
        return NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        );
    }

    if let Some(caps) = day_month_year().captures(raw) {
        return NaiveDate::from_ymd_opt(
            caps[3].parse().ok()?,
            caps[2].parse().ok()?,
            caps[1].parse().ok()?,
        );
    }

    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.date_naive())
}

/// Per-day record counts for every day of `year`-`month`.
///
/// Records with a missing or unrecognised date, or dated in another month,
/// are skipped.
///
/// # Errors
///
/// Returns an error on `month` if it is not a calendar month.
pub fn daily_counts(
    records: &[TestRecord],
    year: i32,
    month: u32,
) -> Result<Vec<DayCount>, ValidationError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ValidationError::new("month", format!("{year}-{month} is not a month")))?;
    let days = days_in_month(first);

    let mut counts: Vec<DayCount> = (1..=days).map(|day| DayCount { day, count: 0 }).collect();
    for date in records
        .iter()
        .filter_map(|r| r.date())
        .filter_map(|raw| parse_record_date(&raw))
        .filter(|d| d.year() == year && d.month() == month)
    {
        if let Some(slot) = usize::try_from(date.day0())
            .ok()
            .and_then(|i| counts.get_mut(i))
        {
            slot.count += 1;
        }
    }

    Ok(counts)
}

/// Record counts keyed by the raw date string, as entered.
///
/// Records without a date are counted under [`NO_DATE`].
#[must_use]
pub fn counts_by_date(records: &[TestRecord]) -> BTreeMap<String, usize> {
    records.iter().fold(BTreeMap::new(), |mut acc, record| {
        let key = record
            .date()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| NO_DATE.to_string());
        *acc.entry(key).or_insert(0) += 1;
        acc
    })
}

fn days_in_month(first: NaiveDate) -> u32 {
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    next.and_then(|n| n.pred_opt()).map_or(31, |last| last.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::Fields;

    fn record(id: u64, pairs: &[(&str, &str)]) -> TestRecord {
        let fields: Fields = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        TestRecord::new(id, &fields)
    }

    fn sample() -> Vec<TestRecord> {
        vec![
            record(1, &[("obra", "Torre B"), ("fecha", "2026-10-03")]),
            record(2, &[("obra", "Puente Río Verde"), ("fecha", "03/10/2026")]),
            record(3, &[("obra", "Torre B"), ("fecha", "2026-10-31T09:15:00-06:00")]),
            record(14, &[("obra", "Presa"), ("fecha", "2026-09-30")]),
            record(15, &[("obra", "Nave 2")]),
            record(16, &[("obra", "Nave 3"), ("fecha", "ayer")]),
        ]
    }

    #[test]
    fn test_search_blank_returns_all() {
        let records = sample();
        assert_eq!(search(&records, "").len(), records.len());
        assert_eq!(search(&records, "   ").len(), records.len());
    }

    #[test]
    fn test_search_ignores_case() {
        let records = sample();
        let hits: Vec<u64> = search(&records, "torre b").iter().map(|r| r.id).collect();
        assert_eq!(hits, vec![1, 3]);

        let hits: Vec<u64> = search(&records, "RÍO").iter().map(|r| r.id).collect();
        assert_eq!(hits, vec![2]);
    }

    #[test]
    fn test_search_matches_id_and_date() {
        let records = sample();
        let hits: Vec<u64> = search(&records, "14").iter().map(|r| r.id).collect();
        assert_eq!(hits, vec![14]);

        let hits: Vec<u64> = search(&records, "2026-09").iter().map(|r| r.id).collect();
        assert_eq!(hits, vec![14]);
    }

    #[test]
    fn test_search_spans_joined_values() {
        let records = vec![
            record(7, &[("fecha", "2026-10-03"), ("obra", "Nave 2")]),
            record(8, &[("fecha", "2026-10-04"), ("obra", "Nave 3")]),
        ];

        let hits: Vec<u64> = search(&records, "7 2026").iter().map(|r| r.id).collect();
        assert_eq!(hits, vec![7]);

        let hits: Vec<u64> = search(&records, "10-04 nave").iter().map(|r| r.id).collect();
        assert_eq!(hits, vec![8]);

        assert!(search(&records, "nave 4").is_empty());
    }

    #[test]
    fn test_parse_record_date_layouts() {
        let expected = NaiveDate::from_ymd_opt(2026, 10, 3);
        assert_eq!(parse_record_date("2026-10-03"), expected);
        assert_eq!(parse_record_date("03/10/2026"), expected);
        assert_eq!(parse_record_date("2026-10-03T23:00:00Z"), expected);
        assert_eq!(parse_record_date("3/10/2026"), None);
        assert_eq!(parse_record_date("2026-02-30"), None);
        assert_eq!(parse_record_date(""), None);
    }

    #[test]
    fn test_daily_counts_covers_whole_month() {
        let counts = daily_counts(&sample(), 2026, 10).unwrap();
        assert_eq!(counts.len(), 31);
        assert_eq!(counts[0], DayCount { day: 1, count: 0 });
        assert_eq!(counts[2], DayCount { day: 3, count: 2 });
        assert_eq!(counts[30], DayCount { day: 31, count: 1 });
        assert_eq!(counts.iter().map(|c| c.count).sum::<usize>(), 3);
    }

    #[test]
    fn test_daily_counts_other_month() {
        let counts = daily_counts(&sample(), 2026, 9).unwrap();
        assert_eq!(counts.len(), 30);
        assert_eq!(counts[29].count, 1);
    }

    #[test]
    fn test_daily_counts_february() {
        assert_eq!(daily_counts(&[], 2028, 2).unwrap().len(), 29);
        assert_eq!(daily_counts(&[], 2026, 2).unwrap().len(), 28);
        assert_eq!(daily_counts(&[], 2026, 12).unwrap().len(), 31);
    }

    #[test]
    fn test_daily_counts_rejects_bad_month() {
        let err = daily_counts(&[], 2026, 13).unwrap_err();
        assert_eq!(err.field, "month");
    }

    #[test]
    fn test_counts_by_date() {
        let mut records = sample();
        records.push(record(17, &[("obra", "X"), ("fecha", "2026-10-03")]));
        records.push(record(18, &[("obra", "Y"), ("fecha", "")]));

        let counts = counts_by_date(&records);
        assert_eq!(counts.get("2026-10-03"), Some(&2));
        assert_eq!(counts.get("03/10/2026"), Some(&1));
        assert_eq!(counts.get(NO_DATE), Some(&2));
        assert_eq!(counts.get("ayer"), Some(&1));
    }
}
