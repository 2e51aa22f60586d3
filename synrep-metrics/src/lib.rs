pub mod catalog;
pub mod classify;
pub mod key;
pub mod stats;
pub mod tags;

pub use catalog::{AggregationKind, CatalogError, DEFAULT_CATEGORY, MetricCatalog, MetricDefinition};
pub use classify::{Classifier, DEFAULT_TIME_KEYWORDS, MetricClass};
pub use key::{MetricKey, is_availability, is_layout_shift, normalize_metric_key};
pub use stats::{
    RunningStats, StatField, StatsCalculator, StatsIssue, StatsSummary, Summarized, TimeUnit,
    round_to,
};
pub use tags::TagSet;
