// src/matrix/parse.rs
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};
use tracing::{debug, instrument, warn};

use super::{Matrix, MatrixGroup};

#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub delimiter: u8,
    /// Substring that marks a row whose cell 0 names an entity.
    pub entity_marker: String,
    /// Keep a final block that is not followed by a blank line.
    /// Off by default: legacy files lose such a block, and we reproduce that.
    pub flush_trailing_block: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            entity_marker: crate::config::DEFAULT_ENTITY_MARKER.to_string(),
            flush_trailing_block: false,
        }
    }
}

/// Open `path` and parse it into a `MatrixGroup`.
#[instrument(level = "info", skip(path, opts), fields(path = %path.as_ref().display()))]
pub fn parse_matrix_file<P: AsRef<Path>>(path: P, opts: &ParseOptions) -> Result<MatrixGroup> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open matrix file: {:?}", path))?;
    let group = parse_matrix_reader(BufReader::new(file), &path.display().to_string(), opts)
        .with_context(|| format!("Failed to parse matrix file: {:?}", path))?;
    debug!(%group, "parsed");
    Ok(group)
}

/// Split a delimited stream into blank-line-terminated matrix blocks.
///
/// Records are read one line at a time, so quoted cells must not span lines.
pub fn parse_matrix_reader<R: BufRead>(
    reader: R,
    source: &str,
    opts: &ParseOptions,
) -> Result<MatrixGroup> {
    let mut group = MatrixGroup {
        source: source.to_string(),
        ..MatrixGroup::default()
    };
    let mut block: Vec<Vec<String>> = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("read error in {} at line {}", source, idx + 1))?;
        let line = line.trim_end_matches('\r');

        if line.is_empty() {
            close_block(&mut group, &mut block, idx + 1);
            continue;
        }

        let cells = split_record(line, opts.delimiter)
            .with_context(|| format!("CSV parse error in {} at line {}", source, idx + 1))?;

        // file-scoped capture: the first row that carries labels wins
        if group.labels.is_empty() && cells.len() > 1 {
            group.labels = cells[1..].to_vec();
        }

        if let Some(first) = cells.first() {
            if first.contains(opts.entity_marker.as_str()) && !group.entities.contains(first) {
                group.entities.push(first.clone());
            }
        }
        block.push(cells);
    }

    if !block.is_empty() {
        if opts.flush_trailing_block {
            close_block(&mut group, &mut block, 0);
        } else {
            warn!(
                source,
                rows = block.len(),
                "dropping final block: no trailing blank line"
            );
        }
    }

    Ok(group)
}

fn close_block(group: &mut MatrixGroup, block: &mut Vec<Vec<String>>, line: usize) {
    match Matrix::from_records(std::mem::take(block)) {
        Some(matrix) => {
            debug!(
                title = %matrix.title,
                labels = matrix.labels.len(),
                rows = matrix.rows.len(),
                "closed block"
            );
            group.matrices.push(matrix);
        }
        None => debug!(line, "skipping repeated blank line"),
    }
}

fn split_record(line: &str, delimiter: u8) -> Result<Vec<String>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    let mut record = StringRecord::new();
    rdr.read_record(&mut record)?;
    Ok(record.iter().map(str::to_string).collect())
}
