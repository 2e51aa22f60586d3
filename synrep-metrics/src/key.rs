use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Metric-selector transformations that may trail a metric key
/// (`builtin:synthetic.browser.speedIndex.load:avg`, `...:splitBy(...)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum Qualifier {
    Avg,
    Sum,
    Max,
    Min,
    Median,
    Count,
    Value,
    Percentile,
    SplitBy,
    Filter,
    Fold,
    Sort,
    Limit,
    Names,
}

/// Canonical metric identity: a metric key with every trailing selector
/// qualifier removed. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricKey(Arc<str>);

impl MetricKey {
    pub fn new(raw: &str) -> Self {
        Self(Arc::from(normalize_metric_key(raw)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for MetricKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MetricKey {
    fn from(v: &str) -> Self {
        Self::new(v)
    }
}

/// Strips trailing selector qualifiers (`:avg`, `:splitBy("x")`, ...) from a
/// metric key. The `builtin:` namespace colon is never treated as a
/// qualifier separator because `synthetic.browser...` is not a qualifier.
pub fn normalize_metric_key(raw: &str) -> &str {
    let mut key = raw.trim();

    while let Some(pos) = last_top_level_colon(key) {
        let segment = &key[pos + 1..];
        let name = segment.split('(').next().unwrap_or(segment).trim();
        if name.parse::<Qualifier>().is_err() {
            break;
        }
        key = key[..pos].trim_end();
    }

    key
}

fn last_top_level_colon(s: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (idx, ch) in s.char_indices().rev() {
        match ch {
            ')' => depth += 1,
            '(' => depth -= 1,
            ':' if depth == 0 => return Some(idx),
            _ => {}
        }
    }
    None
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Availability-style metrics are scored "higher is better".
pub fn is_availability(key: &str) -> bool {
    contains_ignore_case(key, "availability")
}

/// Cumulative layout shift is a unitless score rounded to three decimals.
pub fn is_layout_shift(key: &str) -> bool {
    contains_ignore_case(key, "cumulativeLayoutShift")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_trailing_qualifiers() {
        assert_eq!(
            normalize_metric_key("builtin:synthetic.browser.speedIndex.load:avg"),
            "builtin:synthetic.browser.speedIndex.load"
        );
        assert_eq!(
            normalize_metric_key(
                "builtin:synthetic.browser.actionDuration.load:splitBy(\"dt.entity.synthetic_location\"):avg"
            ),
            "builtin:synthetic.browser.actionDuration.load"
        );
    }

    #[test]
    fn normalize_keeps_namespace_colon() {
        assert_eq!(
            normalize_metric_key("builtin:synthetic.browser.availability.location.total"),
            "builtin:synthetic.browser.availability.location.total"
        );
        assert_eq!(normalize_metric_key("  plain  "), "plain");
    }

    #[test]
    fn metric_key_compares_by_normalized_text() {
        let a = MetricKey::new("builtin:x.y:sum");
        let b = MetricKey::from("builtin:x.y");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "builtin:x.y");
    }

    #[test]
    fn availability_and_layout_shift_are_case_insensitive() {
        assert!(is_availability("builtin:synthetic.browser.Availability"));
        assert!(is_layout_shift("builtin:synthetic.browser.cumulativelayoutshift.load"));
        assert!(!is_layout_shift("builtin:synthetic.browser.speedIndex.load"));
    }
}
