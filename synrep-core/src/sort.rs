use crate::config::{ReportConfig, RowMode, UNRANKED};
use crate::rows::ReportRow;

/// Multi-key ordering for one output mode. Lower ranks sort first; anything
/// unconfigured carries [`crate::config::UNRANKED`].
///
/// `metric` is the position in the category's configured list, then the
/// catalog's declared `order`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Raw {
        monitor: String,
        category: u32,
        metric: (u32, u32),
        location: String,
    },
    Evaluation {
        category: u32,
        metric: (u32, u32),
    },
    Excel {
        monitor: String,
        excel: u32,
        category: u32,
        metric: (u32, u32),
    },
}

pub struct Sorter<'a> {
    config: &'a ReportConfig,
}

impl<'a> Sorter<'a> {
    pub fn new(config: &'a ReportConfig) -> Self {
        Self { config }
    }

    pub fn key(&self, mode: RowMode, row: &ReportRow) -> SortKey {
        let key = row.metric_key().as_str();
        let category = self.config.catalog.category_of(key);
        let category_rank = self.config.sort.category_rank(category);
        let metric_rank = (
            self.config
                .sort
                .metric_rank(category, key, row.metric_name()),
            self.config
                .catalog
                .get(key)
                .and_then(|d| d.order)
                .unwrap_or(UNRANKED),
        );

        match mode {
            RowMode::Raw => SortKey::Raw {
                monitor: row.monitor().to_string(),
                category: category_rank,
                metric: metric_rank,
                location: row.location().to_string(),
            },
            RowMode::Evaluation => SortKey::Evaluation {
                category: category_rank,
                metric: metric_rank,
            },
            RowMode::EvaluationExcel => SortKey::Excel {
                monitor: row.monitor().to_string(),
                excel: self.config.excel.rank(row.label()),
                category: category_rank,
                metric: metric_rank,
            },
        }
    }

    /// Stable: rows with equal keys keep their input order.
    pub fn sort(&self, mode: RowMode, rows: &mut [ReportRow]) {
        rows.sort_by_cached_key(|row| self.key(mode, row));
    }
}

/// Assigns 1-based sequence numbers in current order.
pub fn renumber(rows: &mut [ReportRow]) {
    for (i, row) in rows.iter_mut().enumerate() {
        row.set_index(i + 1);
    }
}
