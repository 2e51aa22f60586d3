use std::sync::Arc;

use synrep_metrics::{Classifier, TimeUnit, normalize_metric_key};

use crate::config::{OutputMode, ReportConfig, RowMode};
use crate::error::{Error, Result, Warning, WarningKind};
use crate::format::{Table, project};
use crate::rows::{ReportRow, RowBuilder, SampleSeries};
use crate::sort::{Sorter, renumber};

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub time_unit: TimeUnit,
    pub mode: OutputMode,
    /// Row-building threads; `0` and `1` both mean inline.
    pub workers: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            time_unit: TimeUnit::Ms,
            mode: OutputMode::Raw,
            workers: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Report {
    pub mode: RowMode,
    /// Sorted, numbered rows backing `table`.
    pub rows: Vec<ReportRow>,
    pub table: Table,
    pub warnings: Vec<Warning>,
}

/// Summarize, classify, evaluate, sort and shape a batch of series.
pub struct Pipeline {
    config: Arc<ReportConfig>,
    classifier: Classifier,
}

impl Pipeline {
    pub fn new(config: Arc<ReportConfig>) -> Self {
        let classifier = Classifier::new(config.catalog.clone(), &config.time_keywords);
        Self { config, classifier }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn run(&self, series: &[SampleSeries], opts: &RunOptions) -> Result<Report> {
        let mode = self.config.row_mode(opts.mode);
        let builder = RowBuilder::new(&self.config, &self.classifier, mode, opts.time_unit);

        tracing::info!(
            series = series.len(),
            mode = %mode,
            time_unit = %opts.time_unit,
            workers = opts.workers,
            "building report"
        );

        let (mut rows, warnings) = if opts.workers > 1 && series.len() > 1 {
            build_parallel(&builder, series, opts.workers)?
        } else {
            build_chunk(&builder, series)
        };

        if rows.is_empty() {
            return Err(Error::EmptyResult);
        }

        Sorter::new(&self.config).sort(mode, &mut rows);
        renumber(&mut rows);
        let table = project(&rows, self.config.schema(mode));

        tracing::info!(rows = rows.len(), warnings = warnings.len(), "report built");

        Ok(Report {
            mode,
            rows,
            table,
            warnings,
        })
    }
}

fn build_chunk(
    builder: &RowBuilder<'_>,
    series: &[SampleSeries],
) -> (Vec<ReportRow>, Vec<Warning>) {
    let mut rows = Vec::with_capacity(series.len());
    let mut warnings = Vec::new();

    for s in series {
        if normalize_metric_key(&s.metric_key).is_empty() {
            warnings.push(Warning::new(
                WarningKind::ComputationFailure,
                format!(
                    "skipping series with empty metric key ({} @ {})",
                    s.monitor.name, s.location
                ),
            ));
            continue;
        }
        rows.extend(builder.build(s, &mut warnings));
    }

    (rows, warnings)
}

/// Splits `series` into contiguous chunks, one per worker, and concatenates
/// the results in input order.
fn build_parallel(
    builder: &RowBuilder<'_>,
    series: &[SampleSeries],
    workers: usize,
) -> Result<(Vec<ReportRow>, Vec<Warning>)> {
    let chunk_size = series.len().div_ceil(workers);

    std::thread::scope(|scope| {
        let handles: Vec<_> = series
            .chunks(chunk_size)
            .map(|chunk| scope.spawn(move || build_chunk(builder, chunk)))
            .collect();

        let mut rows = Vec::with_capacity(series.len());
        let mut warnings = Vec::new();
        for handle in handles {
            let (r, w) = handle.join().map_err(|_| Error::WorkerPanicked)?;
            rows.extend(r);
            warnings.extend(w);
        }
        Ok((rows, warnings))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::MonitorInfo;

    fn series(monitor: &str, key: &str, values: Vec<f64>) -> SampleSeries {
        SampleSeries {
            monitor: Arc::new(MonitorInfo {
                name: monitor.to_string(),
                ..MonitorInfo::default()
            }),
            location: "tokyo".to_string(),
            metric_key: key.to_string(),
            values,
        }
    }

    #[test]
    fn empty_result_is_an_error() {
        let p = Pipeline::new(Arc::new(ReportConfig::builtin()));
        let err = match p.run(&[], &RunOptions::default()) {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        assert!(matches!(err, Error::EmptyResult));
    }

    #[test]
    fn empty_metric_key_is_skipped_with_warning() {
        let p = Pipeline::new(Arc::new(ReportConfig::builtin()));
        let report = p
            .run(
                &[series("a", " ", vec![1.0]), series("a", "m", vec![1.0])],
                &RunOptions::default(),
            )
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(report.rows.len(), 1);
        assert!(
            report
                .warnings
                .iter()
                .any(|w| w.kind == WarningKind::ComputationFailure)
        );
    }

    #[test]
    fn parallel_build_matches_inline() {
        let p = Pipeline::new(Arc::new(ReportConfig::builtin()));
        let input: Vec<SampleSeries> = (0..17)
            .map(|i| {
                let monitor = format!("m{:02}", i % 5);
                series(&monitor, &format!("metric{i}"), vec![i as f64])
            })
            .collect();

        let inline = p
            .run(&input, &RunOptions::default())
            .unwrap_or_else(|e| panic!("{e}"));
        let parallel = p
            .run(
                &input,
                &RunOptions {
                    workers: 4,
                    ..RunOptions::default()
                },
            )
            .unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(inline.table, parallel.table);
        assert_eq!(inline.rows.len(), 17);
    }
}
