use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use serde::Deserialize;

use synrep_core::synrep_metrics::TagSet;
use synrep_core::{MonitorInfo, SampleSeries};

/// Collected samples, one entry per (monitor, location, metric).
#[derive(Debug, Deserialize)]
struct DatasetDoc {
    #[serde(default)]
    series: Vec<SeriesJson>,
}

#[derive(Debug, Deserialize)]
struct SeriesJson {
    monitor: MonitorJson,
    #[serde(default)]
    location: String,
    metric_key: String,
    #[serde(default)]
    values: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct MonitorJson {
    name: String,
    frequency_min: Option<f64>,
    device: Option<String>,
    #[serde(default)]
    tags: Vec<TagJson>,
}

#[derive(Debug, Deserialize)]
struct TagJson {
    key: String,
    #[serde(default)]
    value: Option<String>,
}

impl MonitorJson {
    fn into_info(self) -> MonitorInfo {
        MonitorInfo {
            name: self.name,
            frequency_min: self.frequency_min,
            device: self.device,
            tags: TagSet::from_pairs(
                self.tags
                    .into_iter()
                    .map(|t| (t.key, t.value.unwrap_or_default())),
            ),
        }
    }
}

fn into_series(doc: DatasetDoc) -> Vec<SampleSeries> {
    let mut monitors: Vec<(String, Arc<MonitorInfo>)> = Vec::new();

    doc.series
        .into_iter()
        .map(|s| {
            // identical monitor names share one allocation
            let monitor = match monitors.iter().find(|(n, _)| *n == s.monitor.name) {
                Some((_, m)) => m.clone(),
                None => {
                    let name = s.monitor.name.clone();
                    let m = Arc::new(s.monitor.into_info());
                    monitors.push((name, m.clone()));
                    m
                }
            };
            SampleSeries {
                monitor,
                location: s.location,
                metric_key: s.metric_key,
                values: s.values.into_iter().flatten().collect(),
            }
        })
        .collect()
}

fn parse_dataset(bytes: &[u8]) -> anyhow::Result<Vec<SampleSeries>> {
    let doc: DatasetDoc = serde_json::from_slice(bytes)?;
    Ok(into_series(doc))
}

pub async fn load_dataset(path: &Path) -> anyhow::Result<Vec<SampleSeries>> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read dataset: {}", path.display()))?;

    let series = parse_dataset(&bytes)
        .with_context(|| format!("failed to parse dataset: {}", path.display()))?;

    tracing::info!(path = %path.display(), series = series.len(), "dataset loaded");
    Ok(series)
}
