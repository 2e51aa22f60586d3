use std::fmt;

use ahash::AHashMap;

/// A single rendered table cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
}

impl Cell {
    pub fn text(v: impl Into<String>) -> Self {
        Cell::Text(v.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.is_empty(),
            Cell::Int(_) | Cell::Float(_) => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(v) => Some(*v as f64),
            Cell::Float(v) => Some(*v),
            Cell::Empty | Cell::Text(_) => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Int(v) => write!(f, "{v}"),
            // Integral floats keep one decimal so numeric columns read uniformly.
            Cell::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
                write!(f, "{v:.1}")
            }
            Cell::Float(v) => write!(f, "{v}"),
        }
    }
}

/// Rows expose their cells by internal column key.
pub trait RowFields {
    fn field(&self, key: &str) -> Option<Cell>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub key: String,
    pub label: String,
    pub order: u32,
}

impl ColumnSpec {
    pub fn new(key: impl Into<String>, label: impl Into<String>, order: u32) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            order,
        }
    }
}

/// Ordered output columns with O(1) lookup by internal key.
#[derive(Debug, Clone, Default)]
pub struct ColumnSchema {
    columns: Vec<ColumnSpec>,
    by_key: AHashMap<String, usize>,
}

impl ColumnSchema {
    /// Columns are ordered by `order`; ties keep declaration order. A repeated
    /// key keeps its first declaration.
    pub fn new(columns: impl IntoIterator<Item = ColumnSpec>) -> Self {
        let mut columns: Vec<ColumnSpec> = columns.into_iter().collect();
        columns.sort_by_key(|c| c.order);

        let mut out = Self::default();
        for col in columns {
            if out.by_key.contains_key(&col.key) {
                tracing::warn!(column = %col.key, "duplicate column key ignored");
                continue;
            }
            out.by_key.insert(col.key.clone(), out.columns.len());
            out.columns.push(col);
        }
        out
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn get(&self, key: &str) -> Option<&ColumnSpec> {
        self.by_key.get(key).and_then(|idx| self.columns.get(*idx))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|c| c.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == label)
    }

    /// Reads a cell back by display label.
    pub fn get(&self, row: usize, label: &str) -> Option<&Cell> {
        let col = self.column_index(label)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }
}

/// Projects rows onto `schema`: fields outside the schema are dropped, missing
/// fields become empty cells.
pub fn project<R: RowFields>(rows: &[R], schema: &ColumnSchema) -> Table {
    let headers = schema.labels().map(str::to_string).collect();
    let rows = rows
        .iter()
        .map(|row| {
            schema
                .columns()
                .iter()
                .map(|c| row.field(&c.key).unwrap_or_default())
                .collect()
        })
        .collect();

    Table { headers, rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row(Vec<(&'static str, Cell)>);

    impl RowFields for Row {
        fn field(&self, key: &str) -> Option<Cell> {
            self.0
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
        }
    }

    fn schema() -> ColumnSchema {
        ColumnSchema::new([
            ColumnSpec::new("avg", "平均", 2),
            ColumnSpec::new("name", "名前", 1),
            ColumnSpec::new("tags", "タグ", 2),
        ])
    }

    #[test]
    fn schema_orders_by_index_and_keeps_ties_stable() {
        let s = schema();
        let labels: Vec<&str> = s.labels().collect();
        assert_eq!(labels, vec!["名前", "平均", "タグ"]);
        assert_eq!(s.get("tags").map(|c| c.label.as_str()), Some("タグ"));
        assert!(s.get("nope").is_none());
    }

    #[test]
    fn projection_renames_drops_and_fills() {
        let rows = vec![Row(vec![
            ("name", Cell::text("a")),
            ("avg", Cell::Float(1.5)),
            ("internal", Cell::text("hidden")),
        ])];
        let table = project(&rows, &schema());

        assert_eq!(table.headers(), ["名前", "平均", "タグ"]);
        assert_eq!(table.get(0, "名前"), Some(&Cell::text("a")));
        assert_eq!(table.get(0, "平均").and_then(Cell::as_f64), Some(1.5));
        assert_eq!(table.get(0, "タグ"), Some(&Cell::Empty));
        assert!(table.get(0, "internal").is_none());
    }

    #[test]
    fn cell_rendering() {
        assert_eq!(Cell::Float(1500.0).to_string(), "1500.0");
        assert_eq!(Cell::Float(0.25).to_string(), "0.25");
        assert_eq!(Cell::Int(-1).to_string(), "-1");
        assert_eq!(Cell::Empty.to_string(), "");
    }
}
