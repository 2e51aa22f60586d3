use crate::classify::MetricClass;
use crate::key::is_layout_shift;

/// Unit that time-class measurements are reported in. Samples arrive in ms.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TimeUnit {
    #[default]
    Ms,
    S,
}

impl TimeUnit {
    /// Factor applied to thresholds configured in seconds.
    pub fn seconds_factor(self) -> f64 {
        match self {
            TimeUnit::Ms => 1000.0,
            TimeUnit::S => 1.0,
        }
    }
}

/// One of the five summary statistics, addressable by name from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum StatField {
    Min,
    Max,
    Avg,
    Median,
    Stdev,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSummary {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub median: f64,
    pub stdev: f64,
}

impl StatsSummary {
    pub fn uniform(v: f64) -> Self {
        Self {
            min: v,
            max: v,
            avg: v,
            median: v,
            stdev: v,
        }
    }

    pub fn get(&self, field: StatField) -> f64 {
        match field {
            StatField::Min => self.min,
            StatField::Max => self.max,
            StatField::Avg => self.avg,
            StatField::Median => self.median,
            StatField::Stdev => self.stdev,
        }
    }

    fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            min: f(self.min),
            max: f(self.max),
            avg: f(self.avg),
            median: f(self.median),
            stdev: f(self.stdev),
        }
    }

    fn is_finite(&self) -> bool {
        [self.min, self.max, self.avg, self.median, self.stdev]
            .iter()
            .all(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum StatsIssue {
    #[strum(to_string = "no samples")]
    Empty,
    #[strum(to_string = "non-finite sample or result")]
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summarized {
    pub summary: StatsSummary,
    pub issue: Option<StatsIssue>,
}

/// Welford accumulator with min/max tracking; `stdev` is the population
/// standard deviation.
#[derive(Debug, Clone, Copy)]
pub struct RunningStats {
    n: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
    sum: f64,
}

impl Default for RunningStats {
    fn default() -> Self {
        Self {
            n: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sum: 0.0,
        }
    }
}

impl RunningStats {
    pub fn push(&mut self, x: f64) {
        self.n = self.n.saturating_add(1);
        let n_f = self.n as f64;

        let delta = x - self.mean;
        self.mean += delta / n_f;
        let delta2 = x - self.mean;
        self.m2 += delta * delta2;

        self.sum += x;
        if x < self.min {
            self.min = x;
        }
        if x > self.max {
            self.max = x;
        }
    }

    pub fn count(&self) -> u64 {
        self.n
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Mean, kept inside `[min, max]`.
    pub fn mean(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        self.mean.clamp(self.min, self.max)
    }

    pub fn stdev(&self) -> f64 {
        if self.n < 2 {
            return 0.0;
        }
        (self.m2 / self.n as f64).max(0.0).sqrt()
    }
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let n = values.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => values[n / 2],
        _ => {
            let lo = values[n / 2 - 1];
            let hi = values[n / 2];
            // Midpoint without overflowing on large magnitudes.
            lo + (hi - lo) / 2.0
        }
    }
}

pub fn round_to(v: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (v * scale).round() / scale
}

#[derive(Debug, Clone, Copy)]
pub struct StatsCalculator {
    fallback: f64,
}

impl Default for StatsCalculator {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl StatsCalculator {
    pub fn new(fallback: f64) -> Self {
        Self { fallback }
    }

    pub fn fallback(&self) -> StatsSummary {
        StatsSummary::uniform(self.fallback)
    }

    pub fn summarize(
        &self,
        key: &str,
        class: MetricClass,
        samples: &[f64],
        unit: TimeUnit,
    ) -> Summarized {
        if samples.is_empty() {
            return self.degraded(StatsIssue::Empty);
        }
        if samples.iter().any(|v| !v.is_finite()) {
            return self.degraded(StatsIssue::NonFinite);
        }

        let summary = if class == MetricClass::Counter {
            let total: f64 = samples.iter().sum();
            StatsSummary {
                stdev: 0.0,
                ..StatsSummary::uniform(total)
            }
        } else {
            let in_seconds = class == MetricClass::Time && unit == TimeUnit::S;
            let mut values: Vec<f64> = if in_seconds {
                samples.iter().map(|v| v / 1000.0).collect()
            } else {
                samples.to_vec()
            };

            let mut acc = RunningStats::default();
            for v in &values {
                acc.push(*v);
            }

            let raw = StatsSummary {
                min: acc.min(),
                max: acc.max(),
                avg: acc.mean(),
                median: median(&mut values),
                stdev: acc.stdev(),
            };

            if in_seconds {
                raw.map(|v| round_to(v, 2))
            } else if is_layout_shift(key) {
                raw.map(|v| round_to(v, 3))
            } else {
                raw
            }
        };

        if !summary.is_finite() {
            return self.degraded(StatsIssue::NonFinite);
        }

        Summarized {
            summary,
            issue: None,
        }
    }

    fn degraded(&self, issue: StatsIssue) -> Summarized {
        Summarized {
            summary: self.fallback(),
            issue: Some(issue),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn calc() -> StatsCalculator {
        StatsCalculator::new(0.0)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn seconds_conversion_rounds_to_two_places() {
        let out = calc().summarize(
            "builtin:synthetic.browser.actionDuration.load",
            MetricClass::Time,
            &[100.0, 200.0, 300.0, 400.0],
            TimeUnit::S,
        );
        assert_eq!(out.issue, None);
        assert_close(out.summary.min, 0.1);
        assert_close(out.summary.max, 0.4);
        assert_close(out.summary.avg, 0.25);
        assert_close(out.summary.median, 0.25);
        assert_close(out.summary.stdev, 0.11);
    }

    #[test]
    fn milliseconds_are_left_unrounded() {
        let out = calc().summarize("m", MetricClass::Time, &[1.0, 2.0, 4.0], TimeUnit::Ms);
        assert_close(out.summary.avg, 7.0 / 3.0);
        assert_close(out.summary.median, 2.0);
    }

    #[test]
    fn seconds_do_not_apply_to_non_time_metrics() {
        let out = calc().summarize("m", MetricClass::Other, &[1500.0], TimeUnit::S);
        assert_close(out.summary.avg, 1500.0);
    }

    #[test]
    fn counter_reports_sum_everywhere() {
        let out = calc().summarize(
            "builtin:synthetic.browser.success",
            MetricClass::Counter,
            &[1.0, 2.0, 3.0],
            TimeUnit::Ms,
        );
        assert_eq!(
            out.summary,
            StatsSummary {
                min: 6.0,
                max: 6.0,
                avg: 6.0,
                median: 6.0,
                stdev: 0.0,
            }
        );
    }

    #[test]
    fn layout_shift_rounds_to_three_places() {
        let out = calc().summarize(
            "builtin:synthetic.browser.cumulativeLayoutShift.load",
            MetricClass::Ratio,
            &[0.12345, 0.2],
            TimeUnit::Ms,
        );
        assert_close(out.summary.min, 0.123);
        assert_close(out.summary.max, 0.2);
    }

    #[test]
    fn empty_input_uses_fallback() {
        let out = StatsCalculator::new(-1.0).summarize("m", MetricClass::Time, &[], TimeUnit::Ms);
        assert_eq!(out.issue, Some(StatsIssue::Empty));
        assert_eq!(out.summary, StatsSummary::uniform(-1.0));
    }

    #[test]
    fn non_finite_input_uses_fallback() {
        let out = calc().summarize("m", MetricClass::Other, &[1.0, f64::NAN], TimeUnit::Ms);
        assert_eq!(out.issue, Some(StatsIssue::NonFinite));
        assert_eq!(out.summary, StatsSummary::uniform(0.0));
    }

    #[test]
    fn even_count_median_is_midpoint() {
        let mut v = vec![4.0, 1.0, 3.0, 2.0];
        assert_close(median(&mut v), 2.5);
    }

    #[test]
    fn stat_field_parses_config_names() {
        assert_eq!("avg".parse::<StatField>().ok(), Some(StatField::Avg));
        assert_eq!("median".parse::<StatField>().ok(), Some(StatField::Median));
        assert!("p99".parse::<StatField>().is_err());
        assert_eq!("S".parse::<TimeUnit>().ok(), Some(TimeUnit::S));
    }

    proptest! {
        #[test]
        fn summary_is_ordered(samples in prop::collection::vec(-1.0e6f64..1.0e6, 1..64)) {
            let out = calc().summarize("m", MetricClass::Other, &samples, TimeUnit::Ms);
            let s = out.summary;
            prop_assert!(out.issue.is_none());
            prop_assert!(s.min <= s.median && s.median <= s.max);
            prop_assert!(s.min <= s.avg && s.avg <= s.max);
            prop_assert!(s.stdev >= 0.0);
        }

        #[test]
        fn counter_has_zero_spread(samples in prop::collection::vec(0.0f64..1.0e4, 1..32)) {
            let out = calc().summarize("m", MetricClass::Counter, &samples, TimeUnit::S);
            let s = out.summary;
            prop_assert_eq!(s.stdev, 0.0);
            prop_assert_eq!(s.min, s.max);
            prop_assert_eq!(s.avg, s.median);
        }
    }
}
