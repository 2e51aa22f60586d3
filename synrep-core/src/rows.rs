use std::sync::Arc;

use synrep_metrics::{
    Classifier, MetricClass, MetricKey, StatsCalculator, StatsIssue, StatsSummary, TagSet,
    TimeUnit, round_to,
};

use crate::config::{ReportConfig, RowMode};
use crate::error::{Warning, WarningKind};
use crate::format::{Cell, RowFields};
use crate::thresholds::{EvaluationOutcome, ThresholdEvaluator};

/// Monitor context shared by every series collected for that monitor.
#[derive(Debug, Clone, Default)]
pub struct MonitorInfo {
    pub name: String,
    pub frequency_min: Option<f64>,
    pub device: Option<String>,
    pub tags: TagSet,
}

/// Samples of one metric for one monitor at one location.
#[derive(Debug, Clone)]
pub struct SampleSeries {
    pub monitor: Arc<MonitorInfo>,
    pub location: String,
    pub metric_key: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub monitor: String,
    pub frequency_h: f64,
    pub device: String,
    pub location: String,
    pub metric_key: MetricKey,
    pub metric_name: String,
    pub description: String,
    pub stats: StatsSummary,
    pub tags: String,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRow {
    pub monitor: String,
    pub location: String,
    pub metric_key: MetricKey,
    pub metric_name: String,
    /// Position in the dual-criteria list, for expanded rows.
    pub criterion: Option<usize>,
    pub label: String,
    pub outcome: EvaluationOutcome,
    pub value: f64,
    pub avg: f64,
    pub index: usize,
    pub tags: String,
    pub code: String,
    pub corporate: String,
    pub no: String,
    pub code_no: String,
    pub url: String,
    /// Spreadsheet column that receives `value`.
    pub excel_column: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportRow {
    Raw(RawRow),
    Evaluation(EvaluationRow),
}

impl ReportRow {
    pub fn monitor(&self) -> &str {
        match self {
            ReportRow::Raw(r) => &r.monitor,
            ReportRow::Evaluation(r) => &r.monitor,
        }
    }

    pub fn location(&self) -> &str {
        match self {
            ReportRow::Raw(r) => &r.location,
            ReportRow::Evaluation(r) => &r.location,
        }
    }

    pub fn metric_key(&self) -> &MetricKey {
        match self {
            ReportRow::Raw(r) => &r.metric_key,
            ReportRow::Evaluation(r) => &r.metric_key,
        }
    }

    pub fn metric_name(&self) -> &str {
        match self {
            ReportRow::Raw(r) => &r.metric_name,
            ReportRow::Evaluation(r) => &r.metric_name,
        }
    }

    /// Composite label for evaluation rows, metric name for raw rows.
    pub fn label(&self) -> &str {
        match self {
            ReportRow::Raw(r) => &r.metric_name,
            ReportRow::Evaluation(r) => &r.label,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            ReportRow::Raw(r) => r.index,
            ReportRow::Evaluation(r) => r.index,
        }
    }

    pub fn set_index(&mut self, index: usize) {
        match self {
            ReportRow::Raw(r) => r.index = index,
            ReportRow::Evaluation(r) => r.index = index,
        }
    }
}

impl RowFields for RawRow {
    fn field(&self, key: &str) -> Option<Cell> {
        let cell = match key {
            "monitor_name" => Cell::text(&self.monitor),
            "frequency" => Cell::Float(self.frequency_h),
            "device" => Cell::text(&self.device),
            "location" => Cell::text(&self.location),
            "metric_name" => Cell::text(&self.metric_name),
            "metric_key" => Cell::text(self.metric_key.as_str()),
            "metric_description" => Cell::text(&self.description),
            "min" => Cell::Float(self.stats.min),
            "max" => Cell::Float(self.stats.max),
            "avg" => Cell::Float(self.stats.avg),
            "median" => Cell::Float(self.stats.median),
            "stdev" => Cell::Float(self.stats.stdev),
            "tags" => Cell::text(&self.tags),
            "index" => Cell::Int(self.index as i64),
            _ => return None,
        };
        Some(cell)
    }
}

impl RowFields for EvaluationRow {
    fn field(&self, key: &str) -> Option<Cell> {
        let cell = match key {
            "code" => Cell::text(&self.code),
            "corporate" => Cell::text(&self.corporate),
            "no" => Cell::text(&self.no),
            "code_no" => Cell::text(&self.code_no),
            "metric_full_name" => Cell::text(&self.label),
            "evaluation" => Cell::Int(self.outcome.code()),
            "avg" => Cell::Float(self.avg),
            "value" => Cell::Float(self.value),
            "url" => Cell::text(&self.url),
            "index" => Cell::Int(self.index as i64),
            "tags" => Cell::text(&self.tags),
            "monitor_name" => Cell::text(&self.monitor),
            "location" => Cell::text(&self.location),
            "metric_name" => Cell::text(&self.metric_name),
            "metric_key" => Cell::text(self.metric_key.as_str()),
            other if self.excel_column.as_deref() == Some(other) => Cell::Float(self.value),
            _ => return None,
        };
        Some(cell)
    }
}

impl RowFields for ReportRow {
    fn field(&self, key: &str) -> Option<Cell> {
        match self {
            ReportRow::Raw(r) => r.field(key),
            ReportRow::Evaluation(r) => r.field(key),
        }
    }
}

fn rewrite_time_unit(description: &str, unit: TimeUnit) -> String {
    match unit {
        TimeUnit::Ms => description.to_string(),
        TimeUnit::S => description
            .replace("（ms）", "（s）")
            .replace("(ms)", "(s)"),
    }
}

/// Per-series context shared by the rows built from it.
struct SeriesContext<'s> {
    series: &'s SampleSeries,
    key: MetricKey,
    class: MetricClass,
    location: &'s str,
}

/// Turns one summarized series into report rows for the run's mode.
pub struct RowBuilder<'a> {
    config: &'a ReportConfig,
    classifier: &'a Classifier,
    stats: StatsCalculator,
    mode: RowMode,
    unit: TimeUnit,
}

impl<'a> RowBuilder<'a> {
    pub fn new(
        config: &'a ReportConfig,
        classifier: &'a Classifier,
        mode: RowMode,
        unit: TimeUnit,
    ) -> Self {
        Self {
            config,
            classifier,
            stats: StatsCalculator::new(config.defaults.fallback),
            mode,
            unit,
        }
    }

    pub fn mode(&self) -> RowMode {
        self.mode
    }

    pub fn build(&self, series: &SampleSeries, warnings: &mut Vec<Warning>) -> Vec<ReportRow> {
        let key = MetricKey::new(&series.metric_key);
        let class = self.classifier.classify(key.as_str());
        let location = if series.location.trim().is_empty() {
            self.config.defaults.monitor.location.as_str()
        } else {
            series.location.as_str()
        };

        let out = self
            .stats
            .summarize(key.as_str(), class, &series.values, self.unit);
        if let Some(issue) = out.issue {
            let kind = match issue {
                StatsIssue::Empty => WarningKind::EmptyInput,
                StatsIssue::NonFinite => WarningKind::ComputationFailure,
            };
            warnings.push(Warning::new(
                kind,
                format!(
                    "{issue} for `{key}` ({} @ {location}); using fallback statistics",
                    series.monitor.name
                ),
            ));
        }

        let ctx = SeriesContext {
            series,
            key,
            class,
            location,
        };

        match self.mode {
            RowMode::Raw => self
                .raw_rows(&ctx, out.summary)
                .into_iter()
                .map(ReportRow::Raw)
                .collect(),
            RowMode::Evaluation | RowMode::EvaluationExcel => self
                .evaluation_rows(&ctx, &out.summary, warnings)
                .into_iter()
                .map(ReportRow::Evaluation)
                .collect(),
        }
    }

    /// Dual-criteria metrics repeat the same statistics once per criterion,
    /// each named with its suffix and described by the criterion.
    fn raw_rows(&self, ctx: &SeriesContext<'_>, stats: StatsSummary) -> Vec<RawRow> {
        let row = self.raw_row(ctx, stats);
        let evaluator = ThresholdEvaluator::new(&self.config.evaluation, &self.config.dual);
        if !evaluator.is_dual(ctx.key.as_str()) {
            return vec![row];
        }

        self.config
            .dual
            .criteria
            .iter()
            .map(|c| RawRow {
                metric_name: format!("{}{}", row.metric_name, c.display_suffix),
                description: c.description.clone(),
                ..row.clone()
            })
            .collect()
    }

    fn raw_row(&self, ctx: &SeriesContext<'_>, stats: StatsSummary) -> RawRow {
        let catalog = self.classifier.catalog();
        let monitor = &ctx.series.monitor;
        let defaults = &self.config.defaults.monitor;

        let minutes = monitor.frequency_min.unwrap_or(defaults.frequency_min);
        let device = monitor
            .device
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(defaults.device.as_str());

        RawRow {
            monitor: monitor.name.clone(),
            frequency_h: round_to(minutes / 60.0, 2),
            device: device.to_string(),
            location: ctx.location.to_string(),
            metric_name: catalog.name_of(ctx.key.as_str()).to_string(),
            description: rewrite_time_unit(catalog.description_of(ctx.key.as_str()), self.unit),
            metric_key: ctx.key.clone(),
            stats,
            tags: monitor.tags.to_cell(),
            index: 0,
        }
    }

    fn evaluation_rows(
        &self,
        ctx: &SeriesContext<'_>,
        stats: &StatsSummary,
        warnings: &mut Vec<Warning>,
    ) -> Vec<EvaluationRow> {
        let catalog = self.classifier.catalog();
        let evaluator = ThresholdEvaluator::new(&self.config.evaluation, &self.config.dual);
        let key = ctx.key.as_str();
        let name = catalog.name_of(key);
        let value = stats.get(self.config.evaluation.value_field);

        let excel_column = if self.mode == RowMode::EvaluationExcel {
            let column = self
                .config
                .excel
                .column_mapping
                .get(key)
                .or_else(|| self.config.excel.column_mapping.get(name))
                .cloned();
            if column.is_none() {
                warnings.push(Warning::new(
                    WarningKind::MappingMissing,
                    format!("no spreadsheet column mapped for `{key}`"),
                ));
            }
            column
        } else {
            None
        };

        let template = EvaluationRow {
            monitor: ctx.series.monitor.name.clone(),
            location: ctx.location.to_string(),
            metric_key: ctx.key.clone(),
            metric_name: name.to_string(),
            criterion: None,
            label: String::new(),
            outcome: EvaluationOutcome::Undefined,
            value,
            avg: stats.avg,
            index: 0,
            tags: ctx.series.monitor.tags.to_cell(),
            code: String::new(),
            corporate: String::new(),
            no: self
                .config
                .metric_no(key, name)
                .unwrap_or_default()
                .to_string(),
            code_no: String::new(),
            url: String::new(),
            excel_column,
        };

        if evaluator.is_dual(key) {
            return evaluator
                .evaluate_dual(key, value, self.unit)
                .into_iter()
                .enumerate()
                .map(|(idx, c)| {
                    if c.threshold.is_none() {
                        warnings.push(Warning::new(
                            WarningKind::ThresholdMissing,
                            format!(
                                "no time threshold `{}` for `{key}`",
                                c.criterion.threshold_key
                            ),
                        ));
                    }
                    EvaluationRow {
                        criterion: Some(idx),
                        label: format!(
                            "{name}{}:{}",
                            c.criterion.display_suffix, c.criterion.description
                        ),
                        outcome: c.outcome,
                        ..template.clone()
                    }
                })
                .collect();
        }

        let outcome = evaluator.evaluate(key, ctx.class, value, self.unit);
        if outcome == EvaluationOutcome::Undefined
            && matches!(ctx.class, MetricClass::Time | MetricClass::Ratio)
        {
            warnings.push(Warning::new(
                WarningKind::ThresholdMissing,
                format!("no {} threshold configured for `{key}`", ctx.class),
            ));
        }

        vec![EvaluationRow {
            label: format!("{name}:{}", catalog.description_of(key)),
            outcome,
            ..template
        }]
    }
}
