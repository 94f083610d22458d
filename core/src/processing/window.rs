use crate::dataset::{TimeSeries, WindowBounds};
use crate::math::stats::StatsHelper;
use crate::prelude::{PipelineError, PipelineResult};
use chrono::{DateTime, Duration, Utc};
use std::ops::Range;

/// Mean and spread of the valid samples of one window.
///
/// Both are `None` when the window holds no valid sample; the detector treats
/// that as "skip", never as zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    pub valid: usize,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
}

impl WindowStats {
    pub fn from_samples(samples: &[f64]) -> Self {
        Self {
            valid: StatsHelper::valid_count(samples),
            mean: StatsHelper::nan_mean(samples),
            std_dev: StatsHelper::nan_std(samples),
        }
    }

    pub fn is_defined(&self) -> bool {
        self.mean.is_some() && self.std_dev.is_some()
    }
}

/// One window of a partitioned time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    /// Position in chronological order, starting at zero.
    pub ordinal: usize,
    pub bounds: WindowBounds,
    /// Indices into the time axis covered by this window.
    pub indices: Range<usize>,
}

impl Window {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn timestamps<'a>(&self, times: &'a [DateTime<Utc>]) -> &'a [DateTime<Utc>] {
        &times[self.indices.clone()]
    }

    pub fn aggregate(&self, series: &TimeSeries) -> WindowStats {
        WindowStats::from_samples(series.values_in(self.indices.clone()))
    }
}

/// Splits a time axis into consecutive fixed-duration windows.
#[derive(Debug, Clone, Copy)]
pub struct WindowAggregator {
    duration: Duration,
}

impl WindowAggregator {
    pub fn new(duration: Duration) -> PipelineResult<Self> {
        if duration <= Duration::zero() {
            return Err(PipelineError::InvalidConfig(format!(
                "window duration must be positive, got {}",
                duration
            )));
        }
        Ok(Self { duration })
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Windows over `times`, which must be strictly increasing.
    ///
    /// Windows are `[start, start + duration)` beginning at the first
    /// timestamp; the last one is cut at the final timestamp and includes it,
    /// so each timestamp belongs to exactly one window.
    pub fn windows<'a>(&self, times: &'a [DateTime<Utc>]) -> Windows<'a> {
        Windows {
            times,
            duration: self.duration,
        }
    }
}

/// Lazy, restartable window sequence over a borrowed time axis.
#[derive(Debug, Clone, Copy)]
pub struct Windows<'a> {
    times: &'a [DateTime<Utc>],
    duration: Duration,
}

impl<'a> Windows<'a> {
    pub fn iter(&self) -> WindowIter<'a> {
        WindowIter {
            times: self.times,
            duration: self.duration,
            next_start: self.times.first().copied(),
            cursor: 0,
            ordinal: 0,
        }
    }
}

impl<'a> IntoIterator for Windows<'a> {
    type Item = Window;
    type IntoIter = WindowIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &Windows<'a> {
    type Item = Window;
    type IntoIter = WindowIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct WindowIter<'a> {
    times: &'a [DateTime<Utc>],
    duration: Duration,
    next_start: Option<DateTime<Utc>>,
    cursor: usize,
    ordinal: usize,
}

impl Iterator for WindowIter<'_> {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        let start = self.next_start?;
        let last = *self.times.last()?;

        let nominal_end = start.checked_add_signed(self.duration);
        let (end, stop, is_final) = match nominal_end {
            Some(end) if end < last => {
                let remaining = &self.times[self.cursor..];
                (end, self.cursor + remaining.partition_point(|t| *t < end), false)
            }
            _ => (last, self.times.len(), true),
        };

        let window = Window {
            ordinal: self.ordinal,
            bounds: WindowBounds::new(start, end),
            indices: self.cursor..stop,
        };

        self.cursor = stop;
        self.ordinal += 1;
        self.next_start = (!is_final).then_some(end);
        Some(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Quantity;
    use chrono::TimeZone;

    fn at_minutes(minutes: &[i64]) -> Vec<DateTime<Utc>> {
        minutes
            .iter()
            .map(|m| Utc.timestamp_opt(1_600_000_000 + 60 * m, 0).unwrap())
            .collect()
    }

    fn hourly() -> WindowAggregator {
        WindowAggregator::new(Duration::hours(1)).unwrap()
    }

    #[test]
    fn windows_partition_the_time_axis() {
        let times = at_minutes(&[0, 10, 59, 60, 61, 130, 200, 239, 240, 250]);
        let windows: Vec<Window> = hourly().windows(&times).iter().collect();

        let mut covered = Vec::new();
        for window in &windows {
            covered.extend(window.indices.clone());
        }
        assert_eq!(covered, (0..times.len()).collect::<Vec<_>>());

        for pair in windows.windows(2) {
            assert_eq!(pair[0].bounds.end, pair[1].bounds.start);
            assert!(pair[0].bounds.start < pair[1].bounds.start);
        }
        assert_eq!(windows[0].bounds.start, times[0]);
        assert_eq!(windows.last().unwrap().bounds.end, *times.last().unwrap());
    }

    #[test]
    fn boundary_timestamp_opens_the_next_window() {
        let times = at_minutes(&[0, 30, 60, 90]);
        let windows: Vec<Window> = hourly().windows(&times).iter().collect();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].indices, 0..2);
        assert_eq!(windows[1].indices, 2..4);
        assert_eq!(windows[1].bounds.end, times[3]);
    }

    #[test]
    fn last_timestamp_on_nominal_end_stays_in_final_window() {
        let times = at_minutes(&[0, 30, 60]);
        let windows: Vec<Window> = hourly().windows(&times).iter().collect();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].indices, 0..3);
    }

    #[test]
    fn data_gaps_produce_empty_windows() {
        let times = at_minutes(&[0, 200]);
        let windows: Vec<Window> = hourly().windows(&times).iter().collect();
        assert_eq!(windows.len(), 4);
        assert!(windows[1].is_empty());
        assert!(windows[2].is_empty());
        assert_eq!(windows[3].indices, 1..2);
    }

    #[test]
    fn single_sample_and_empty_axes() {
        let single = at_minutes(&[5]);
        let windows: Vec<Window> = hourly().windows(&single).iter().collect();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].bounds.start, windows[0].bounds.end);

        let empty: Vec<DateTime<Utc>> = Vec::new();
        assert_eq!(hourly().windows(&empty).iter().count(), 0);
    }

    #[test]
    fn window_sequence_is_restartable() {
        let times = at_minutes(&[0, 45, 90, 135, 180]);
        let windows = hourly().windows(&times);
        let first: Vec<Window> = windows.iter().collect();
        let second: Vec<Window> = windows.into_iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn all_missing_window_has_undefined_stats() {
        let times = at_minutes(&[0, 10, 70]);
        let series =
            TimeSeries::new(Quantity::IonTemperature, times.clone(), vec![f64::NAN, f64::NAN, 900.0])
                .unwrap();
        let windows: Vec<Window> = hourly().windows(&times).iter().collect();

        let first = windows[0].aggregate(&series);
        assert_eq!(first.valid, 0);
        assert!(!first.is_defined());

        let second = windows[1].aggregate(&series);
        assert_eq!(second.mean, Some(900.0));
        assert_eq!(second.std_dev, Some(0.0));
    }

    #[test]
    fn non_positive_duration_is_rejected() {
        assert!(WindowAggregator::new(Duration::zero()).is_err());
    }
}
