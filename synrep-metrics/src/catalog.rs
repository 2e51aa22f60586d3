use ahash::AHashMap;

use crate::key::MetricKey;

pub const DEFAULT_CATEGORY: &str = "Other";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AggregationKind {
    /// Totals; summarized as a sum instead of a distribution.
    Counter,
    Other(String),
    #[default]
    None,
}

impl AggregationKind {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::None,
            Some(v) if v.eq_ignore_ascii_case("counter") => Self::Counter,
            Some(v) => Self::Other(v.to_string()),
        }
    }

    pub fn is_counter(&self) -> bool {
        matches!(self, Self::Counter)
    }
}

#[derive(Debug, Clone)]
pub struct MetricDefinition {
    pub key: MetricKey,
    pub name: String,
    pub description: String,
    pub category: String,
    pub aggregation: AggregationKind,
    pub order: Option<u32>,
}

impl MetricDefinition {
    pub fn new(key: &str) -> Self {
        let key = MetricKey::new(key);
        Self {
            name: key.to_string(),
            key,
            description: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            aggregation: AggregationKind::None,
            order: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("metric definition #{index} has an empty key")]
    EmptyKey { index: usize },
}

/// Read-only lookup over the configured metric definitions.
#[derive(Debug, Default, Clone)]
pub struct MetricCatalog {
    defs: Vec<MetricDefinition>,
    by_key: AHashMap<MetricKey, usize>,
}

impl MetricCatalog {
    /// Duplicate keys keep the first definition.
    pub fn from_definitions(
        defs: impl IntoIterator<Item = MetricDefinition>,
    ) -> Result<Self, CatalogError> {
        let mut out = Self::default();

        for (index, def) in defs.into_iter().enumerate() {
            if def.key.is_empty() {
                return Err(CatalogError::EmptyKey { index });
            }
            if out.by_key.contains_key(def.key.as_str()) {
                tracing::warn!(metric = %def.key, "duplicate metric definition ignored");
                continue;
            }
            out.by_key.insert(def.key.clone(), out.defs.len());
            out.defs.push(def);
        }

        Ok(out)
    }

    pub fn get(&self, key: &str) -> Option<&MetricDefinition> {
        let key = crate::key::normalize_metric_key(key);
        self.by_key.get(key).and_then(|idx| self.defs.get(*idx))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_counter(&self, key: &str) -> bool {
        self.get(key).is_some_and(|d| d.aggregation.is_counter())
    }

    pub fn category_of(&self, key: &str) -> &str {
        self.get(key)
            .map(|d| d.category.as_str())
            .unwrap_or(DEFAULT_CATEGORY)
    }

    /// Display name, falling back to the normalized key.
    pub fn name_of<'a>(&'a self, key: &'a str) -> &'a str {
        match self.get(key) {
            Some(d) => d.name.as_str(),
            None => crate::key::normalize_metric_key(key),
        }
    }

    /// Description, falling back to the normalized key.
    pub fn description_of<'a>(&'a self, key: &'a str) -> &'a str {
        match self.get(key) {
            Some(d) => d.description.as_str(),
            None => crate::key::normalize_metric_key(key),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricDefinition> + '_ {
        self.defs.iter()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
