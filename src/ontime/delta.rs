use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::{day_slices, sorted, span_seconds, StatePoint};

/// Gaps are clipped to this before being booked; an outage between two
/// running samples would otherwise count in full.
const GAP_CAP_SECONDS: f64 = 15.0 * 60.0;

/// Backfilled rows have always been booked as capped seconds divided by
/// 1440, and consumers calibrated against those figures. Converting with
/// 3600 would rescale every stored metric, so the divisor stays.
const LEGACY_HOURS_DIVISOR: f64 = 1440.0;

/// Next-sample integration over one short fetch window: every running
/// sample contributes the gap to the sample after it, the final sample
/// contributes nothing.
pub fn next_sample_on_seconds(points: &[StatePoint]) -> f64 {
    let points = sorted(points);
    if points.len() <= 1 {
        return 0.0;
    }
    points
        .windows(2)
        .filter(|pair| pair[0].running)
        .map(|pair| span_seconds(pair[0].timestamp, pair[1].timestamp))
        .sum()
}

pub fn next_sample_on_minutes(points: &[StatePoint]) -> i64 {
    (next_sample_on_seconds(points) / 60.0).round() as i64
}

/// Per-day next-sample integration for backfills. Days never borrow from
/// each other: the last sample of a day diffs against itself. Every date
/// present in the input gets an entry, idle days included.
pub fn capped_daily_on_hours(points: &[StatePoint]) -> BTreeMap<NaiveDate, f64> {
    let points = sorted(points);
    let mut days = BTreeMap::new();
    for (date, day) in day_slices(&points) {
        let mut on_seconds = 0.0;
        for (i, point) in day.iter().enumerate() {
            if !point.running {
                continue;
            }
            let next_time = match day.get(i + 1) {
                Some(next) => next.timestamp,
                None => point.timestamp,
            };
            on_seconds += span_seconds(point.timestamp, next_time).min(GAP_CAP_SECONDS);
        }
        days.insert(date, on_seconds / LEGACY_HOURS_DIVISOR);
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(ts: &str, running: bool) -> StatePoint {
        StatePoint {
            timestamp: ts.parse().expect("test timestamp"),
            running,
        }
    }

    fn date(text: &str) -> NaiveDate {
        text.parse().expect("test date")
    }

    #[test]
    fn only_gaps_after_running_samples_count() {
        let points = vec![
            point("2025-03-01T10:00:00Z", true),
            point("2025-03-01T10:01:00Z", false),
            point("2025-03-01T10:02:00Z", true),
        ];
        assert_eq!(next_sample_on_seconds(&points), 60.0);
        assert_eq!(next_sample_on_minutes(&points), 1);
    }

    #[test]
    fn short_sequences_yield_zero() {
        assert_eq!(next_sample_on_seconds(&[]), 0.0);
        assert_eq!(
            next_sample_on_seconds(&[point("2025-03-01T10:00:00Z", true)]),
            0.0
        );
    }

    #[test]
    fn unsorted_input_is_sorted_before_integrating() {
        let points = vec![
            point("2025-03-01T10:02:00Z", true),
            point("2025-03-01T10:00:00Z", true),
            point("2025-03-01T10:01:00Z", false),
        ];
        // 10:00 -> 10:01 is the only gap after a running sample bar the
        // final one, which never contributes.
        assert_eq!(next_sample_on_seconds(&points), 60.0);
    }

    #[test]
    fn minutes_are_rounded_from_seconds() {
        let points = vec![
            point("2025-03-01T10:00:00Z", true),
            point("2025-03-01T10:01:40Z", true),
        ];
        // 100 s -> 1.67 min rounds to 2.
        assert_eq!(next_sample_on_minutes(&points), 2);
    }

    #[test]
    fn long_gaps_are_capped_per_day() {
        let points = vec![
            point("2025-03-01T10:00:00Z", true),
            point("2025-03-01T10:33:20Z", false),
        ];
        let days = capped_daily_on_hours(&points);
        // The 2000 s gap books as 900 s.
        assert_eq!(days.get(&date("2025-03-01")), Some(&(900.0 / 1440.0)));
    }

    #[test]
    fn last_sample_of_a_day_contributes_nothing() {
        let points = vec![point("2025-03-01T23:59:00Z", true)];
        let days = capped_daily_on_hours(&points);
        assert_eq!(days.get(&date("2025-03-01")), Some(&0.0));
    }

    #[test]
    fn days_never_borrow_across_midnight() {
        let points = vec![
            point("2025-03-01T23:55:00Z", true),
            point("2025-03-02T00:05:00Z", true),
            point("2025-03-02T00:10:00Z", false),
        ];
        let days = capped_daily_on_hours(&points);
        assert_eq!(days.get(&date("2025-03-01")), Some(&0.0));
        assert_eq!(days.get(&date("2025-03-02")), Some(&(300.0 / 1440.0)));
    }

    #[test]
    fn day_figures_use_the_legacy_divisor() {
        let points = vec![
            point("2025-03-01T10:00:00Z", true),
            point("2025-03-01T10:15:00Z", true),
            point("2025-03-01T10:30:00Z", true),
            point("2025-03-01T10:45:00Z", false),
        ];
        let days = capped_daily_on_hours(&points);
        // Three 900 s gaps: 2700 / 1440, not 2700 / 3600.
        assert_eq!(days.get(&date("2025-03-01")), Some(&1.875));
    }

    #[test]
    fn empty_input_yields_an_empty_map() {
        assert!(capped_daily_on_hours(&[]).is_empty());
    }
}
