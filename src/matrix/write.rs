// src/matrix/write.rs
use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::{fs::File, io::Write, path::Path};
use tracing::{debug, instrument};

use super::{CommonLabelSet, MatrixGroup};

/// Serialize a trimmed group: per matrix, a header `[original] + labels`,
/// its body rows, then one blank line.
///
/// `originals[i]` is the header cell 0 matrix `i` had before trimming.
pub fn write_group<W: Write>(
    mut out: W,
    group: &MatrixGroup,
    originals: &[String],
    labels: &CommonLabelSet,
    delimiter: u8,
) -> Result<()> {
    anyhow::ensure!(
        originals.len() == group.matrices.len(),
        "{}: {} header values for {} matrices",
        group.source,
        originals.len(),
        group.matrices.len()
    );

    let mut builder = WriterBuilder::new();
    builder.delimiter(delimiter).flexible(true);

    for (matrix, original) in group.matrices.iter().zip(originals) {
        {
            let mut wtr = builder.from_writer(&mut out);
            let header =
                std::iter::once(original.as_str()).chain(labels.iter().map(String::as_str));
            wtr.write_record(header)?;
            for row in &matrix.rows {
                wtr.write_record(row.to_cells())?;
            }
            wtr.flush()?;
        }
        // block terminator goes out raw, outside the csv writer
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

/// Create `path` and write the group into it.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display(), matrices = group.matrices.len()))]
pub fn write_group_file<P: AsRef<Path>>(
    path: P,
    group: &MatrixGroup,
    originals: &[String],
    labels: &CommonLabelSet,
    delimiter: u8,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_group(file, group, originals, labels, delimiter)
        .with_context(|| format!("writing trimmed group to {}", path.display()))?;
    debug!("trimmed group written");
    Ok(())
}
