use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use synrep_core::synrep_metrics::{
    AggregationKind, MetricCatalog, MetricDefinition, StatField, TimeUnit,
};
use synrep_core::{
    ColumnSchema, ColumnSpec, DualCriteria, DualCriterion, Encoding, EvaluationCriteria,
    ExcelLayout, ExcelOrderRule, ExcelSettings, ReportConfig, SortSettings, ThresholdTable,
    Warning, WarningKind,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ConfigDoc {
    pub metrics: Vec<MetricYaml>,
    pub output_format: OutputFormatYaml,

    /// Legacy top-level evaluation layout.
    pub csv_columns_evaluation: Vec<ColumnYaml>,
    /// Legacy top-level spreadsheet layout.
    pub csv_columns_evaluation_excel: Vec<ColumnYaml>,

    pub sort_settings: SortSettingsYaml,
    pub evaluation_criteria: EvaluationCriteriaYaml,
    pub action_duration_dual_criteria: Vec<DualCriterionYaml>,
    pub dual_criteria_metric: Option<String>,
    pub output_format_excel: ExcelFormatYaml,

    #[serde(deserialize_with = "ordered_map")]
    pub excel_metric_column_mapping: Vec<(String, String)>,
    pub excel_metric_order: Vec<ExcelOrderYaml>,

    #[serde(deserialize_with = "ordered_scalar_map")]
    pub metric_no_mapping: Vec<(String, String)>,

    pub defaults: DefaultsYaml,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MetricYaml {
    pub key: String,
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    pub category: Option<String>,
    pub aggregation: Option<String>,
    pub order: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ColumnYaml {
    pub key: String,
    pub display_name: Option<String>,
    pub order: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ColumnsYaml {
    pub columns: Vec<ColumnYaml>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct KeywordsYaml {
    pub keywords: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct OutputFormatYaml {
    pub csv: ColumnsYaml,
    pub evaluation: ColumnsYaml,
    pub evaluation_excel: ColumnsYaml,
    pub time_metrics: KeywordsYaml,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SortSettingsYaml {
    pub category_order: Vec<String>,
    #[serde(deserialize_with = "ordered_map")]
    pub metric_order: Vec<(String, Vec<String>)>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct EvaluationCriteriaYaml {
    pub evaluation_value: Option<String>,
    #[serde(deserialize_with = "ordered_map")]
    pub time_thresholds: Vec<(String, f64)>,
    #[serde(deserialize_with = "ordered_map")]
    pub ratio_thresholds: Vec<(String, f64)>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DualCriterionYaml {
    pub threshold_key: String,
    #[serde(default)]
    pub display_suffix: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ExcelFormatYaml {
    pub enabled: bool,
    pub mode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExcelOrderYaml {
    pub metric_pattern: String,
    pub order: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct DefaultsYaml {
    pub monitor: MonitorDefaultsYaml,
    pub output: OutputDefaultsYaml,
    pub fallback: FallbackYaml,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct MonitorDefaultsYaml {
    pub interval: Option<f64>,
    pub location: Option<String>,
    pub device: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct OutputDefaultsYaml {
    pub time_unit: Option<String>,
    pub encoding: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct FallbackYaml {
    pub stats: FallbackStatsYaml,
    pub location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct FallbackStatsYaml {
    pub default: Option<f64>,
}

/// YAML mapping in document order.
fn ordered_map<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<serde_yaml::Mapping>::deserialize(deserializer)?.unwrap_or_default();
    let mut out = Vec::with_capacity(raw.len());

    for (k, v) in raw {
        let key = scalar_to_string(k)
            .ok_or_else(|| serde::de::Error::custom("mapping keys must be scalars"))?;
        let value = serde_yaml::from_value(v).map_err(serde::de::Error::custom)?;
        out.push((key, value));
    }

    Ok(out)
}

/// Like [`ordered_map`], with numeric/bool values rendered as text and nulls dropped.
fn ordered_scalar_map<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = ordered_map::<D, serde_yaml::Value>(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(k, v)| scalar_to_string(v).map(|v| (k, v)))
        .collect())
}

fn scalar_to_string(v: serde_yaml::Value) -> Option<String> {
    match v {
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s),
        _ => None,
    }
}

fn schema(columns: &[ColumnYaml]) -> ColumnSchema {
    ColumnSchema::new(columns.iter().map(|c| {
        ColumnSpec::new(
            c.key.clone(),
            c.display_name.clone().unwrap_or_else(|| c.key.clone()),
            c.order.unwrap_or(999),
        )
    }))
}

fn first_non_empty(a: Vec<ColumnYaml>, b: Vec<ColumnYaml>) -> Vec<ColumnYaml> {
    if a.is_empty() { b } else { a }
}

impl ConfigDoc {
    pub(crate) fn into_report_config(self) -> anyhow::Result<ReportConfig> {
        let mut cfg = ReportConfig::builtin();

        let defs = self.metrics.into_iter().map(|m| MetricDefinition {
            name: m.name.unwrap_or_else(|| m.key.clone()),
            description: m.description,
            category: m
                .category
                .unwrap_or_else(|| synrep_core::synrep_metrics::DEFAULT_CATEGORY.to_string()),
            aggregation: AggregationKind::parse(m.aggregation.as_deref()),
            order: m.order,
            ..MetricDefinition::new(&m.key)
        });
        cfg.catalog = Arc::new(MetricCatalog::from_definitions(defs)?);
        cfg.time_keywords = self.output_format.time_metrics.keywords;

        if !self.output_format.csv.columns.is_empty() {
            cfg.columns.raw = schema(&self.output_format.csv.columns);
        }
        let evaluation = first_non_empty(
            self.output_format.evaluation.columns,
            self.csv_columns_evaluation,
        );
        if !evaluation.is_empty() {
            cfg.columns.evaluation = schema(&evaluation);
        }
        let excel = first_non_empty(
            self.output_format.evaluation_excel.columns,
            self.csv_columns_evaluation_excel,
        );
        cfg.columns.evaluation_excel = if excel.is_empty() {
            cfg.columns.evaluation.clone()
        } else {
            schema(&excel)
        };

        cfg.sort = SortSettings::new(
            self.sort_settings.category_order,
            self.sort_settings.metric_order,
        );

        let value_field = match self.evaluation_criteria.evaluation_value.as_deref() {
            None => StatField::Avg,
            Some(raw) => raw
                .parse::<StatField>()
                .with_context(|| format!("unknown evaluation_value `{raw}`"))?,
        };
        cfg.evaluation = EvaluationCriteria {
            value_field,
            time_thresholds: ThresholdTable::new(self.evaluation_criteria.time_thresholds),
            ratio_thresholds: ThresholdTable::new(self.evaluation_criteria.ratio_thresholds),
        };

        cfg.dual = DualCriteria {
            pattern: self
                .dual_criteria_metric
                .unwrap_or_else(|| DualCriteria::default().pattern),
            criteria: self
                .action_duration_dual_criteria
                .into_iter()
                .map(|c| DualCriterion {
                    threshold_key: c.threshold_key,
                    display_suffix: c.display_suffix,
                    description: c.description,
                })
                .collect(),
        };

        let layout = match self.output_format_excel.mode.as_deref() {
            None => ExcelLayout::Standard,
            Some(raw) => raw
                .parse::<ExcelLayout>()
                .with_context(|| format!("unknown output_format_excel.mode `{raw}`"))?,
        };
        cfg.excel = ExcelSettings {
            enabled: self.output_format_excel.enabled,
            layout,
            column_mapping: self.excel_metric_column_mapping.into_iter().collect(),
            metric_order: self
                .excel_metric_order
                .into_iter()
                .map(|r| ExcelOrderRule {
                    metric_pattern: r.metric_pattern,
                    order: r.order.unwrap_or(synrep_core::UNRANKED),
                })
                .collect(),
        };

        cfg.metric_no = self.metric_no_mapping.into_iter().collect();

        let d = self.defaults;
        let monitor = &mut cfg.defaults.monitor;
        if let Some(v) = d.monitor.interval {
            monitor.frequency_min = v;
        }
        if let Some(v) = d.monitor.location.or(d.fallback.location) {
            monitor.location = v;
        }
        if let Some(v) = d.monitor.device {
            monitor.device = v;
        }
        if let Some(raw) = d.output.time_unit.as_deref() {
            cfg.defaults.output.time_unit = raw
                .parse::<TimeUnit>()
                .with_context(|| format!("unknown defaults.output.time_unit `{raw}`"))?;
        }
        if let Some(raw) = d.output.encoding.as_deref() {
            cfg.defaults.output.encoding = raw
                .parse::<Encoding>()
                .with_context(|| format!("unknown defaults.output.encoding `{raw}`"))?;
        }
        if let Some(v) = d.fallback.stats.default {
            cfg.defaults.fallback = v;
        }

        Ok(cfg)
    }
}

pub async fn load_report_config(path: &Path) -> anyhow::Result<ReportConfig> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read config YAML: {}", path.display()))?;

    let doc: ConfigDoc = serde_yaml::from_slice(&bytes)
        .with_context(|| format!("failed to parse YAML: {}", path.display()))?;

    doc.into_report_config()
        .with_context(|| format!("invalid config: {}", path.display()))
}

/// Loads `path`, falling back to the built-in configuration when it cannot
/// be read or is invalid.
pub async fn load_or_builtin(path: &Path) -> (ReportConfig, Option<Warning>) {
    match load_report_config(path).await {
        Ok(cfg) => {
            tracing::info!(path = %path.display(), metrics = cfg.catalog.len(), "config loaded");
            (cfg, None)
        }
        Err(err) => {
            let warning = Warning::new(
                WarningKind::ConfigMissing,
                format!("{err:#}; using built-in configuration"),
            );
            (ReportConfig::builtin(), Some(warning))
        }
    }
}
