use chrono::{Duration as ChronoDuration, NaiveDate};

use super::{day_slices, sorted, span_seconds, StatePoint};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// One day's running total from the burst walk. Off time books the remainder
/// of a fixed 24 h day even when sample coverage is partial; downstream
/// reports rely on the two figures summing to a full day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayRuntime {
    pub date: NaiveDate,
    pub on_seconds: f64,
}

impl DayRuntime {
    pub fn off_seconds(&self) -> f64 {
        SECONDS_PER_DAY - self.on_seconds
    }

    pub fn on_hhmm(&self) -> (i64, i64) {
        split_hhmm(self.on_seconds)
    }

    pub fn off_hhmm(&self) -> (i64, i64) {
        split_hhmm(self.off_seconds())
    }
}

fn split_hhmm(seconds: f64) -> (i64, i64) {
    let minutes = (seconds / 60.0).floor() as i64;
    (minutes / 60, minutes % 60)
}

/// Look-ahead burst integration, one result per UTC day present in the
/// input. A running sample opens a sub-window of `window` length; when more
/// than one sample lands inside it, the sub-window's span counts as running
/// time and the walk resumes past it, so overlapping bursts are never
/// counted twice. An idle sample advances the walk by one.
pub fn day_runtimes(points: &[StatePoint], window: ChronoDuration) -> Vec<DayRuntime> {
    let points = sorted(points);
    day_slices(&points)
        .into_iter()
        .map(|(date, day)| DayRuntime {
            date,
            on_seconds: burst_on_seconds(day, window),
        })
        .collect()
}

fn burst_on_seconds(day: &[StatePoint], window: ChronoDuration) -> f64 {
    let window_seconds = window.num_milliseconds() as f64 / 1000.0;
    let mut total = 0.0;
    let mut i = 0;
    while i < day.len() {
        if !day[i].running {
            i += 1;
            continue;
        }
        let opened_at = day[i].timestamp;
        let closes_at = opened_at + window;
        // Duplicates of the opening timestamp may sit just before i; the
        // sub-window covers them too.
        let mut first = i;
        while first > 0 && day[first - 1].timestamp == opened_at {
            first -= 1;
        }
        let mut next = i + 1;
        while next < day.len() && day[next].timestamp < closes_at {
            next += 1;
        }
        if next - first > 1 {
            let span = span_seconds(opened_at, day[next - 1].timestamp);
            total += span.min(window_seconds);
            i = next;
        } else {
            i += 1;
        }
    }
    total
}
