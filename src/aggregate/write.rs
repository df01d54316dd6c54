// src/aggregate/write.rs
use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::{fs::File, io::Write, path::Path};
use tracing::{info, instrument};

use super::Aggregation;
use crate::error::MergeError;
use crate::matrix::CommonLabelSet;

/// Integral values keep one decimal (`4.0`), everything else prints shortest round-trip.
pub fn format_value(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

/// Emit the merged label-by-entity table.
///
/// Header is `"<dimension>: <label>"` followed by every entity. Each body row is
/// one common label and, per entity, the value at that label's position in the
/// common set. With no entities the table degenerates to the header cell and a
/// bare label per row.
pub fn write_merged<W: Write>(
    out: W,
    dimension: &str,
    label: &str,
    labels: &CommonLabelSet,
    agg: &Aggregation,
    delimiter: u8,
) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_writer(out);

    let mut header = vec![format!("{}: {}", dimension, label)];
    header.extend(agg.rows.keys().cloned());
    wtr.write_record(&header)?;

    for (idx, row_label) in labels.iter().enumerate() {
        let mut record = Vec::with_capacity(agg.rows.len() + 1);
        record.push(row_label.clone());
        for (entity, values) in &agg.rows {
            let v = values.get(idx).ok_or_else(|| MergeError::MissingValue {
                entity: entity.clone(),
                label: row_label.clone(),
                index: idx,
            })?;
            record.push(v.to_string());
        }
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display(), label = label))]
pub fn write_merged_file<P: AsRef<Path>>(
    path: P,
    dimension: &str,
    label: &str,
    labels: &CommonLabelSet,
    agg: &Aggregation,
    delimiter: u8,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_merged(file, dimension, label, labels, agg, delimiter)
        .with_context(|| format!("writing merged table to {}", path.display()))?;
    info!(entities = agg.rows.len(), rows = labels.len(), "merged table written");
    Ok(())
}
