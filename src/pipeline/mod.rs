// src/pipeline/mod.rs
use anyhow::{Context, Result};
use std::{fs, path::PathBuf, time::Instant};
use tracing::{info, instrument, warn};

use crate::aggregate::{aggregate_files, write_merged_file, TrimmedFile};
use crate::config::MergeConfig;
use crate::error::MergeError;
use crate::matrix::{parse_matrix_file, reconcile, write_group_file, CommonLabelSet, EntityId, Label};

pub mod cleanup;
pub mod ports;

pub use cleanup::delete_files;
pub use ports::{FileSelector, LabelChooser, OutputChooser};

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub inputs: Vec<PathBuf>,
    pub intermediates: Vec<PathBuf>,
    pub common_labels: CommonLabelSet,
    pub label: Label,
    /// Column order of the merged table.
    pub entities: Vec<EntityId>,
    pub output: PathBuf,
    /// Intermediates actually removed at the end of the run.
    pub deleted: usize,
}

/// Parse, reconcile, trim, merge.
///
/// Trimmed intermediates are written before the label is asked for and stay on
/// disk if the run is aborted after that point.
#[instrument(level = "info", skip_all)]
pub fn run(
    cfg: &MergeConfig,
    selector: &mut dyn FileSelector,
    chooser: &mut dyn LabelChooser,
    destination: &mut dyn OutputChooser,
) -> Result<RunSummary> {
    let start = Instant::now();

    // ─── 1) select inputs ────────────────────────────────────────────
    let inputs = selector.select_files().context("selecting input files")?;
    if inputs.is_empty() {
        return Err(MergeError::abort("No files selected. Exiting.").into());
    }
    info!("{} input files", inputs.len());

    // ─── 2) parse every file into a group ────────────────────────────
    let opts = cfg.parse_options();
    let groups = inputs
        .iter()
        .map(|p| parse_matrix_file(p, &opts))
        .collect::<Result<Vec<_>>>()?;
    let originals: Vec<Vec<String>> = groups.iter().map(|g| g.titles()).collect();

    // ─── 3) reconcile labels and trim ────────────────────────────────
    let (trimmed, common) = reconcile(&groups, &cfg.sentinel);
    info!(
        "common labels ({}): {:?}",
        common.len(),
        common.iter().collect::<Vec<_>>()
    );

    // ─── 4) persist trimmed groups ───────────────────────────────────
    fs::create_dir_all(&cfg.work_dir)
        .with_context(|| format!("creating work directory {}", cfg.work_dir.display()))?;
    let mut files = Vec::with_capacity(trimmed.len());
    for (i, (group, originals)) in trimmed.iter().zip(&originals).enumerate() {
        let path = cfg.intermediate_path(i + 1);
        write_group_file(&path, group, originals, &common, opts.delimiter)?;
        files.push(TrimmedFile {
            path,
            roster: group.entities.clone(),
        });
    }
    let intermediates: Vec<PathBuf> = files.iter().map(|f| f.path.clone()).collect();

    // ─── 5) pick the row to merge ────────────────────────────────────
    let label = chooser
        .choose_label(&common)
        .context("choosing a label")?
        .filter(|l| !l.is_empty())
        .ok_or_else(|| MergeError::abort("No label selected. Exiting."))?;
    info!("selected label: {}", label);

    // ─── 6) fold the chosen row across files ─────────────────────────
    let agg = aggregate_files(&files, &label, &opts)?;
    if agg.is_empty() {
        warn!(label = %label, "no file has a row for this label, merged table gets no entity columns");
    }

    // ─── 7) write the merged table ───────────────────────────────────
    let output = destination
        .choose_output()
        .context("choosing the output file")?
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| MergeError::abort("No output file name provided. Exiting."))?;
    write_merged_file(&output, &cfg.dimension, &label, &common, &agg, opts.delimiter)?;

    // ─── 8) drop intermediates ───────────────────────────────────────
    let deleted = if cfg.keep_intermediate {
        info!("keeping {} intermediate files", intermediates.len());
        0
    } else {
        delete_files(&intermediates)
    };

    info!(elapsed = ?start.elapsed(), "run complete");
    Ok(RunSummary {
        inputs,
        intermediates,
        common_labels: common,
        label,
        entities: agg.entities(),
        output,
        deleted,
    })
}
