use std::sync::Arc;

use dashmap::DashMap;

use crate::catalog::MetricCatalog;
use crate::key::{MetricKey, contains_ignore_case, is_availability, is_layout_shift};

/// Keywords that mark a metric as time-valued when the configuration lists none.
pub const DEFAULT_TIME_KEYWORDS: &[&str] = &[
    "duration",
    "time",
    "byte",
    "paint",
    "complete",
    "interactive",
    "contribution",
    "response",
    "event",
    "index",
];

/// Key fragments that never denote a time measurement.
const NON_TIME_FRAGMENTS: &[&str] = &["total", "availability", "success", "failure"];

const MILLIS_MARKERS: &[&str] = &["(ms)", "（ms）"];
const PERCENT_MARKERS: &[&str] = &["(%)", "（%）"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MetricClass {
    Time,
    Counter,
    Ratio,
    Other,
}

/// Classifies metric keys against a catalog and keyword list.
///
/// The result is a pure function of the key, so every answer is cached.
#[derive(Debug)]
pub struct Classifier {
    catalog: Arc<MetricCatalog>,
    keywords: Vec<String>,
    cache: DashMap<MetricKey, MetricClass, ahash::RandomState>,
}

impl Classifier {
    pub fn new(catalog: Arc<MetricCatalog>, keywords: &[String]) -> Self {
        let keywords = if keywords.iter().all(|k| k.trim().is_empty()) {
            DEFAULT_TIME_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect()
        } else {
            keywords
                .iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect()
        };

        Self {
            catalog,
            keywords,
            cache: DashMap::with_hasher(ahash::RandomState::new()),
        }
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    pub fn classify(&self, key: &str) -> MetricClass {
        let key = MetricKey::new(key);
        if let Some(hit) = self.cache.get(&key) {
            return *hit;
        }

        let class = self.classify_uncached(key.as_str());
        self.cache.insert(key, class);
        class
    }

    fn classify_uncached(&self, key: &str) -> MetricClass {
        if self.catalog.is_counter(key) {
            return MetricClass::Counter;
        }

        let description = self
            .catalog
            .get(key)
            .map(|d| d.description.as_str())
            .unwrap_or_default();

        let time_excluded = NON_TIME_FRAGMENTS
            .iter()
            .any(|f| contains_ignore_case(key, f));

        if !time_excluded && self.looks_like_time(key, description) {
            return MetricClass::Time;
        }

        if PERCENT_MARKERS.iter().any(|m| description.contains(m))
            || is_availability(key)
            || is_layout_shift(key)
        {
            return MetricClass::Ratio;
        }

        MetricClass::Other
    }

    fn looks_like_time(&self, key: &str, description: &str) -> bool {
        if MILLIS_MARKERS.iter().any(|m| description.contains(m)) {
            return true;
        }
        self.keywords
            .iter()
            .any(|k| contains_ignore_case(key, k) || contains_ignore_case(description, k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AggregationKind, MetricDefinition};

    fn catalog() -> Arc<MetricCatalog> {
        let defs = [
            MetricDefinition {
                description: "アクション時間 (ms)".to_string(),
                ..MetricDefinition::new("builtin:synthetic.browser.actionDuration.load")
            },
            MetricDefinition {
                aggregation: AggregationKind::Counter,
                ..MetricDefinition::new("builtin:synthetic.browser.event.total")
            },
            MetricDefinition {
                description: "エラー率 (%)".to_string(),
                ..MetricDefinition::new("builtin:synthetic.browser.errorRate")
            },
            MetricDefinition {
                description: "size".to_string(),
                ..MetricDefinition::new("custom.loadedUnits")
            },
        ];
        Arc::new(MetricCatalog::from_definitions(defs).unwrap_or_else(|e| panic!("{e}")))
    }

    #[test]
    fn counter_aggregation_wins_over_keywords() {
        let c = Classifier::new(catalog(), &[]);
        assert_eq!(
            c.classify("builtin:synthetic.browser.event.total"),
            MetricClass::Counter
        );
    }

    #[test]
    fn time_keywords_and_ms_marker() {
        let c = Classifier::new(catalog(), &[]);
        assert_eq!(
            c.classify("builtin:synthetic.browser.actionDuration.load:avg"),
            MetricClass::Time
        );
        assert_eq!(
            c.classify("builtin:synthetic.browser.speedIndex.load"),
            MetricClass::Time
        );
    }

    #[test]
    fn exclusions_block_time() {
        let c = Classifier::new(catalog(), &[]);
        assert_eq!(
            c.classify("builtin:synthetic.browser.availability.location.total"),
            MetricClass::Ratio
        );
        assert_eq!(
            c.classify("builtin:synthetic.browser.failure.responseTime"),
            MetricClass::Other
        );
    }

    #[test]
    fn ratio_from_percent_marker_and_layout_shift() {
        let c = Classifier::new(catalog(), &[]);
        assert_eq!(
            c.classify("builtin:synthetic.browser.errorRate"),
            MetricClass::Ratio
        );
        assert_eq!(
            c.classify("builtin:synthetic.browser.cumulativeLayoutShift.load"),
            MetricClass::Ratio
        );
    }

    #[test]
    fn configured_keywords_replace_defaults() {
        let c = Classifier::new(catalog(), &["units".to_string()]);
        assert_eq!(c.classify("custom.loadedUnits"), MetricClass::Time);
        assert_eq!(
            c.classify("builtin:synthetic.browser.speedIndex.load"),
            MetricClass::Other
        );
    }

    #[test]
    fn classification_is_stable_across_calls() {
        let c = Classifier::new(catalog(), &[]);
        let first = c.classify("builtin:synthetic.browser.firstByte.load");
        for _ in 0..3 {
            assert_eq!(
                c.classify("builtin:synthetic.browser.firstByte.load"),
                first
            );
        }
        assert_eq!(first, MetricClass::Time);
    }
}
