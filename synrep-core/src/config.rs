use std::sync::Arc;

use ahash::AHashMap;
use synrep_metrics::{MetricCatalog, TimeUnit};

use crate::format::{ColumnSchema, ColumnSpec};
use crate::outputs::Encoding;
use crate::thresholds::{DualCriteria, EvaluationCriteria};

/// Rank given to anything missing from an ordering list; sorts last.
pub const UNRANKED: u32 = u32::MAX;

/// Requested output convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OutputMode {
    #[default]
    Raw,
    Evaluation,
}

/// Row shape chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum RowMode {
    Raw,
    Evaluation,
    EvaluationExcel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExcelLayout {
    #[default]
    Standard,
    Excel,
}

#[derive(Debug, Clone, Default)]
pub struct OutputColumns {
    pub raw: ColumnSchema,
    pub evaluation: ColumnSchema,
    pub evaluation_excel: ColumnSchema,
}

#[derive(Debug, Clone, Default)]
pub struct SortSettings {
    category_rank: AHashMap<String, u32>,
    metric_rank: AHashMap<String, AHashMap<String, u32>>,
}

impl SortSettings {
    /// `metric_order` lists metric keys (or display names) per category.
    pub fn new(
        category_order: impl IntoIterator<Item = String>,
        metric_order: impl IntoIterator<Item = (String, Vec<String>)>,
    ) -> Self {
        let mut category_rank = AHashMap::new();
        for (idx, cat) in category_order.into_iter().enumerate() {
            category_rank.entry(cat).or_insert(idx as u32);
        }

        let mut metric_rank = AHashMap::new();
        for (cat, metrics) in metric_order {
            let mut ranks = AHashMap::new();
            for (idx, metric) in metrics.into_iter().enumerate() {
                ranks.entry(metric).or_insert(idx as u32);
            }
            metric_rank.insert(cat, ranks);
        }

        Self {
            category_rank,
            metric_rank,
        }
    }

    pub fn category_rank(&self, category: &str) -> u32 {
        self.category_rank
            .get(category)
            .copied()
            .unwrap_or(UNRANKED)
    }

    pub fn metric_rank(&self, category: &str, key: &str, name: &str) -> u32 {
        self.metric_rank
            .get(category)
            .and_then(|m| m.get(key).or_else(|| m.get(name)))
            .copied()
            .unwrap_or(UNRANKED)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcelOrderRule {
    pub metric_pattern: String,
    pub order: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ExcelSettings {
    pub enabled: bool,
    pub layout: ExcelLayout,
    /// Canonical metric key -> spreadsheet column key.
    pub column_mapping: AHashMap<String, String>,
    pub metric_order: Vec<ExcelOrderRule>,
}

impl ExcelSettings {
    pub fn is_active(&self) -> bool {
        self.enabled && self.layout == ExcelLayout::Excel
    }

    /// First rule whose pattern occurs in `label`.
    pub fn rank(&self, label: &str) -> u32 {
        self.metric_order
            .iter()
            .find(|r| label.contains(r.metric_pattern.as_str()))
            .map(|r| r.order)
            .unwrap_or(UNRANKED)
    }
}

#[derive(Debug, Clone)]
pub struct MonitorDefaults {
    pub frequency_min: f64,
    pub location: String,
    pub device: String,
}

impl Default for MonitorDefaults {
    fn default() -> Self {
        Self {
            frequency_min: 15.0,
            location: "DEFAULT".to_string(),
            device: "Desktop".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputDefaults {
    pub time_unit: TimeUnit,
    pub encoding: Encoding,
}

#[derive(Debug, Clone, Default)]
pub struct Defaults {
    pub monitor: MonitorDefaults,
    pub output: OutputDefaults,
    /// Substituted for every statistic when a summary cannot be computed.
    pub fallback: f64,
}

/// Immutable, fully resolved report configuration.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub catalog: Arc<MetricCatalog>,
    pub time_keywords: Vec<String>,
    pub columns: OutputColumns,
    pub sort: SortSettings,
    pub evaluation: EvaluationCriteria,
    pub dual: DualCriteria,
    pub excel: ExcelSettings,
    /// Metric key or display name -> `no` cell.
    pub metric_no: AHashMap<String, String>,
    pub defaults: Defaults,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ReportConfig {
    /// Configuration used when no file can be loaded.
    pub fn builtin() -> Self {
        Self {
            catalog: Arc::new(MetricCatalog::default()),
            time_keywords: Vec::new(),
            columns: OutputColumns {
                raw: default_raw_columns(),
                evaluation: default_evaluation_columns(),
                evaluation_excel: default_evaluation_columns(),
            },
            sort: SortSettings::default(),
            evaluation: EvaluationCriteria::default(),
            dual: DualCriteria::default(),
            excel: ExcelSettings::default(),
            metric_no: AHashMap::new(),
            defaults: Defaults::default(),
        }
    }

    pub fn row_mode(&self, mode: OutputMode) -> RowMode {
        match mode {
            OutputMode::Raw => RowMode::Raw,
            OutputMode::Evaluation if self.excel.is_active() => RowMode::EvaluationExcel,
            OutputMode::Evaluation => RowMode::Evaluation,
        }
    }

    pub fn schema(&self, mode: RowMode) -> &ColumnSchema {
        match mode {
            RowMode::Raw => &self.columns.raw,
            RowMode::Evaluation => &self.columns.evaluation,
            RowMode::EvaluationExcel => &self.columns.evaluation_excel,
        }
    }

    pub fn metric_no(&self, key: &str, name: &str) -> Option<&str> {
        self.metric_no
            .get(key)
            .or_else(|| self.metric_no.get(name))
            .map(String::as_str)
    }
}

pub fn default_raw_columns() -> ColumnSchema {
    ColumnSchema::new(
        [
            ("monitor_name", "モニター名"),
            ("frequency", "監視間隔(h)"),
            ("device", "デバイス"),
            ("location", "ロケーション"),
            ("metric_name", "メトリクス名"),
            ("metric_description", "メトリクス説明"),
            ("min", "Min"),
            ("max", "Max"),
            ("avg", "Avg"),
            ("median", "Median"),
            ("stdev", "Stdev"),
            ("tags", "タグ"),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, (key, label))| ColumnSpec::new(key, label, i as u32 + 1)),
    )
}

pub fn default_evaluation_columns() -> ColumnSchema {
    ColumnSchema::new(
        [
            ("code", "code"),
            ("corporate", "corporate"),
            ("no", "no"),
            ("code_no", "code_no"),
            ("metric_full_name", "metric_full_name"),
            ("evaluation", "evaluation"),
            ("avg", "avg"),
            ("url", "url"),
            ("index", "index"),
            ("tags", "tags"),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, (key, label))| ColumnSpec::new(key, label, i as u32 + 1)),
    )
}
