// src/matrix/mod.rs
use indexmap::IndexSet;
use std::fmt;

pub mod parse;
pub mod resolve;
pub mod trim;
pub mod write;

pub use parse::{parse_matrix_file, parse_matrix_reader, ParseOptions};
pub use resolve::{common_labels, reconcile};
pub use trim::{project, trim};
pub use write::{write_group, write_group_file};

/// A named position along the shared dimension (e.g. a brain zone).
pub type Label = String;

/// Identity of the subject a matrix belongs to (e.g. a mouse name).
pub type EntityId = String;

/// Labels present in every matrix of every group, in first-seen order.
pub type CommonLabelSet = IndexSet<Label>;

/// One body row of a matrix: cell 0 and the value cells that follow it.
///
/// An empty `key` marks a separator row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub key: String,
    pub values: Vec<String>,
}

impl Row {
    pub fn new(key: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            key: key.into(),
            values,
        }
    }

    /// Split a raw record into key + values. An empty record yields an empty key.
    pub fn from_cells(mut cells: Vec<String>) -> Self {
        if cells.is_empty() {
            return Self::new(String::new(), Vec::new());
        }
        let key = cells.remove(0);
        Self { key, values: cells }
    }

    pub fn is_separator(&self) -> bool {
        self.key.is_empty()
    }

    pub fn to_cells(&self) -> Vec<&str> {
        std::iter::once(self.key.as_str())
            .chain(self.values.iter().map(String::as_str))
            .collect()
    }
}

/// A square correlation-style table of one dimension against itself.
///
/// The header row is held apart from the body: `title` is its cell 0 and
/// `labels[j]` names value column `j` of every row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    pub title: String,
    pub labels: Vec<Label>,
    pub rows: Vec<Row>,
}

impl Matrix {
    pub fn new(title: impl Into<String>, labels: Vec<Label>, rows: Vec<Row>) -> Self {
        Self {
            title: title.into(),
            labels,
            rows,
        }
    }

    /// Build from raw records; the first record is the header. `None` for no records.
    pub fn from_records(mut records: Vec<Vec<String>>) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        let header = Row::from_cells(records.remove(0));
        let rows = records.into_iter().map(Row::from_cells).collect();
        Some(Self {
            title: header.key,
            labels: header.values,
            rows,
        })
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Rows whose cell 0 is exactly `key`.
    pub fn rows_keyed<'a: 'k, 'k>(&'a self, key: &'k str) -> impl Iterator<Item = &'a Row> + 'k {
        self.rows.iter().filter(move |r| r.key == key)
    }
}

/// Every matrix parsed from one input stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatrixGroup {
    /// Where the group came from, used in log lines and error messages.
    pub source: String,
    pub matrices: Vec<Matrix>,
    /// Entity names discovered in the stream, first-seen order, no repeats.
    /// Scoped to the whole file, not to individual matrices.
    pub entities: Vec<EntityId>,
    /// Header labels of the first row of the stream. Per-matrix labels live on `Matrix`.
    pub labels: Vec<Label>,
}

impl MatrixGroup {
    pub fn titles(&self) -> Vec<String> {
        self.matrices.iter().map(|m| m.title.clone()).collect()
    }
}

impl fmt::Display for MatrixGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} matrices, {} entities)",
            self.source,
            self.matrices.len(),
            self.entities.len()
        )
    }
}
