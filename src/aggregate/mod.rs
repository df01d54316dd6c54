// src/aggregate/mod.rs
use anyhow::{Context, Result};
use indexmap::IndexMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::error::MergeError;
use crate::matrix::{parse_matrix_file, EntityId, MatrixGroup, ParseOptions};

pub mod write;

pub use write::{format_value, write_merged, write_merged_file};

/// One cell of a target row. Keeps the text it was read from until it takes
/// part in a sum; printed through [`format_value`] after that.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub number: f64,
    text: Option<String>,
}

impl Value {
    pub fn parse(cell: &str) -> Option<Self> {
        let text = cell.trim();
        let number = text.parse::<f64>().ok()?;
        Some(Self {
            number,
            text: Some(text.to_string()),
        })
    }

    fn accumulate(&mut self, other: &Value) {
        self.number += other.number;
        self.text = None;
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Self { number, text: None }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.text {
            Some(text) => f.write_str(text),
            None => f.write_str(&format_value(self.number)),
        }
    }
}

/// One entity paired with its target-row values, in roster order.
pub type EntityRows = Vec<(EntityId, Vec<Value>)>;

/// A trimmed file on disk together with the roster of the group it was written from.
#[derive(Debug, Clone)]
pub struct TrimmedFile {
    pub path: PathBuf,
    pub roster: Vec<EntityId>,
}

/// Per-entity running sum of the chosen row. Keys keep first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub rows: IndexMap<EntityId, Vec<Value>>,
}

impl Aggregation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distinct entities in the order they were first folded in.
    pub fn entities(&self) -> Vec<EntityId> {
        self.rows.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Current sums for `entity`.
    pub fn get(&self, entity: &str) -> Option<Vec<f64>> {
        self.rows
            .get(entity)
            .map(|values| values.iter().map(|v| v.number).collect())
    }

    /// Store `values` for a new entity as read, or add them element-wise to what is there.
    pub fn add(&mut self, entity: EntityId, values: Vec<Value>) -> Result<(), MergeError> {
        match self.rows.get_mut(&entity) {
            None => {
                self.rows.insert(entity, values);
            }
            Some(current) => {
                if current.len() != values.len() {
                    return Err(MergeError::LengthMismatch {
                        entity,
                        expected: current.len(),
                        got: values.len(),
                    });
                }
                for (acc, v) in current.iter_mut().zip(&values) {
                    acc.accumulate(v);
                }
            }
        }
        Ok(())
    }

    pub fn fold(&mut self, pairs: EntityRows) -> Result<(), MergeError> {
        for (entity, values) in pairs {
            self.add(entity, values)?;
        }
        Ok(())
    }
}

/// Value cells of the row keyed by `label`, one entry per matrix that has it.
///
/// A matrix holding the row twice is an error, as is a group where only some
/// matrices hold it. A group where none do yields an empty list.
pub fn target_rows<'a>(group: &'a MatrixGroup, label: &str) -> Result<Vec<&'a [String]>, MergeError> {
    let mut found = Vec::with_capacity(group.matrices.len());
    let mut missing = None;

    for (idx, matrix) in group.matrices.iter().enumerate() {
        let mut rows = matrix.rows_keyed(label);
        match (rows.next(), rows.count()) {
            (Some(row), 0) => found.push(row.values.as_slice()),
            (None, _) => {
                missing.get_or_insert(idx);
            }
            (Some(_), extra) => {
                return Err(MergeError::AmbiguousTargetRow {
                    file: group.source.clone(),
                    matrix: idx + 1,
                    label: label.to_string(),
                    count: extra + 1,
                })
            }
        }
    }

    match missing {
        Some(idx) if !found.is_empty() => Err(MergeError::MissingTargetRow {
            file: group.source.clone(),
            matrix: idx + 1,
            label: label.to_string(),
        }),
        _ => Ok(found),
    }
}

/// Pair the rows matching `label` with `roster`, position by position.
pub fn pair_with_roster(
    group: &MatrixGroup,
    roster: &[EntityId],
    label: &str,
) -> Result<EntityRows, MergeError> {
    // every block of the file was dropped, yet it named entities
    if group.matrices.is_empty() && !roster.is_empty() {
        return Err(MergeError::NoCompleteBlocks {
            file: group.source.clone(),
            roster: roster.len(),
        });
    }
    let rows = target_rows(group, label)?;
    if rows.is_empty() {
        debug!(source = %group.source, label, "no row for label");
        return Ok(Vec::new());
    }
    if rows.len() != roster.len() {
        return Err(MergeError::RosterMismatch {
            file: group.source.clone(),
            label: label.to_string(),
            rows: rows.len(),
            roster: roster.len(),
        });
    }

    roster
        .iter()
        .zip(rows)
        .map(|(entity, cells)| -> Result<(EntityId, Vec<Value>), MergeError> {
            let values = cells
                .iter()
                .map(|c| {
                    Value::parse(c).ok_or_else(|| MergeError::InvalidNumber {
                        file: group.source.clone(),
                        entity: entity.clone(),
                        value: c.clone(),
                    })
                })
                .collect::<Result<Vec<Value>, _>>()?;
            Ok((entity.clone(), values))
        })
        .collect()
}

/// Re-read every trimmed file and sum the `label` row per entity across them.
#[instrument(level = "info", skip(files, opts), fields(files = files.len()))]
pub fn aggregate_files(files: &[TrimmedFile], label: &str, opts: &ParseOptions) -> Result<Aggregation> {
    let mut agg = Aggregation::new();
    for file in files {
        let group = read_trimmed(&file.path, opts)?;
        let pairs = pair_with_roster(&group, &file.roster, label)?;
        debug!(path = %file.path.display(), entities = pairs.len(), "folding");
        agg.fold(pairs)?;
    }
    info!(entities = agg.rows.len(), "aggregated");
    Ok(agg)
}

fn read_trimmed(path: &Path, opts: &ParseOptions) -> Result<MatrixGroup> {
    if !path.is_file() {
        return Err(MergeError::MissingFile(path.to_path_buf()).into());
    }
    parse_matrix_file(path, opts).with_context(|| format!("re-reading {}", path.display()))
}
