use ahash::AHashMap;
use synrep_metrics::{MetricClass, StatField, TimeUnit, is_availability, normalize_metric_key};

/// Pass/fail verdict of one metric against its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum EvaluationOutcome {
    Pass,
    Fail,
    Undefined,
}

impl EvaluationOutcome {
    /// Table cell code: `1` pass, `0` fail, `-1` undefined.
    pub fn code(self) -> i64 {
        match self {
            EvaluationOutcome::Pass => 1,
            EvaluationOutcome::Fail => 0,
            EvaluationOutcome::Undefined => -1,
        }
    }
}

/// Named thresholds. Lookup is exact first, then by the longest entry name
/// contained in the metric key.
#[derive(Debug, Clone, Default)]
pub struct ThresholdTable {
    entries: Vec<(String, f64)>,
    exact: AHashMap<String, f64>,
}

impl ThresholdTable {
    pub fn new<K: Into<String>>(entries: impl IntoIterator<Item = (K, f64)>) -> Self {
        let mut out = Self::default();
        for (name, value) in entries {
            let name: String = name.into();
            if name.is_empty() || out.exact.contains_key(&name) {
                continue;
            }
            out.exact.insert(name.clone(), value);
            out.entries.push((name, value));
        }
        out
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.exact.get(name).copied()
    }

    pub fn lookup(&self, metric_key: &str) -> Option<f64> {
        let key = normalize_metric_key(metric_key);
        if let Some(v) = self.get(key) {
            return Some(v);
        }

        let mut best: Option<(&str, f64)> = None;
        for (name, value) in &self.entries {
            if !key.contains(name.as_str()) {
                continue;
            }
            if best.is_none_or(|(b, _)| name.len() > b.len()) {
                best = Some((name.as_str(), *value));
            }
        }
        best.map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct EvaluationCriteria {
    /// Statistic used as the representative value.
    pub value_field: StatField,
    /// Seconds.
    pub time_thresholds: ThresholdTable,
    pub ratio_thresholds: ThresholdTable,
}

impl Default for EvaluationCriteria {
    fn default() -> Self {
        Self {
            value_field: StatField::Avg,
            time_thresholds: ThresholdTable::default(),
            ratio_thresholds: ThresholdTable::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DualCriterion {
    pub threshold_key: String,
    pub display_suffix: String,
    pub description: String,
}

/// Metrics whose key contains `pattern` are evaluated once per criterion.
#[derive(Debug, Clone)]
pub struct DualCriteria {
    pub pattern: String,
    pub criteria: Vec<DualCriterion>,
}

impl Default for DualCriteria {
    fn default() -> Self {
        Self {
            pattern: "actionDuration".to_string(),
            criteria: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriterionOutcome<'a> {
    pub criterion: &'a DualCriterion,
    pub threshold: Option<f64>,
    pub outcome: EvaluationOutcome,
}

pub struct ThresholdEvaluator<'a> {
    criteria: &'a EvaluationCriteria,
    dual: &'a DualCriteria,
}

impl<'a> ThresholdEvaluator<'a> {
    pub fn new(criteria: &'a EvaluationCriteria, dual: &'a DualCriteria) -> Self {
        Self { criteria, dual }
    }

    /// Threshold in the reporting unit, if any applies to this metric.
    pub fn threshold_for(&self, key: &str, class: MetricClass, unit: TimeUnit) -> Option<f64> {
        match class {
            MetricClass::Ratio => self.criteria.ratio_thresholds.lookup(key),
            MetricClass::Time => self
                .criteria
                .time_thresholds
                .lookup(key)
                .map(|secs| secs * unit.seconds_factor()),
            MetricClass::Counter | MetricClass::Other => None,
        }
    }

    pub fn evaluate(
        &self,
        key: &str,
        class: MetricClass,
        value: f64,
        unit: TimeUnit,
    ) -> EvaluationOutcome {
        match self.threshold_for(key, class, unit) {
            Some(threshold) => compare(key, value, threshold),
            None => EvaluationOutcome::Undefined,
        }
    }

    pub fn is_dual(&self, key: &str) -> bool {
        !self.dual.pattern.is_empty()
            && !self.dual.criteria.is_empty()
            && key.contains(self.dual.pattern.as_str())
    }

    /// One outcome per configured criterion, in configuration order.
    pub fn evaluate_dual(
        &self,
        key: &str,
        value: f64,
        unit: TimeUnit,
    ) -> Vec<CriterionOutcome<'a>> {
        self.dual
            .criteria
            .iter()
            .map(|criterion| {
                let threshold = self
                    .criteria
                    .time_thresholds
                    .get(&criterion.threshold_key)
                    .map(|secs| secs * unit.seconds_factor());
                let outcome = match threshold {
                    Some(t) => compare(key, value, t),
                    None => EvaluationOutcome::Undefined,
                };
                CriterionOutcome {
                    criterion,
                    threshold,
                    outcome,
                }
            })
            .collect()
    }
}

fn compare(key: &str, value: f64, threshold: f64) -> EvaluationOutcome {
    let passed = if is_availability(key) {
        value >= threshold
    } else {
        value <= threshold
    };

    if passed {
        EvaluationOutcome::Pass
    } else {
        EvaluationOutcome::Fail
    }
}
