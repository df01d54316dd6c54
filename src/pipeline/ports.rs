// src/pipeline/ports.rs
//! The blocking choices the pipeline delegates: which files, which label,
//! where to write. Every "nothing chosen" answer aborts the run.

use anyhow::{Context, Result};
use glob::glob;
use indexmap::IndexSet;
use std::io::{self, BufRead, Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::matrix::{CommonLabelSet, Label};

pub trait FileSelector {
    /// Input files in selection order. Empty means the user chose nothing.
    fn select_files(&mut self) -> Result<Vec<PathBuf>>;
}

pub trait LabelChooser {
    /// One label to merge on, or `None` when cancelled.
    fn choose_label(&mut self, labels: &CommonLabelSet) -> Result<Option<Label>>;
}

pub trait OutputChooser {
    /// Destination of the merged table, or `None` when cancelled.
    fn choose_output(&mut self) -> Result<Option<PathBuf>>;
}

/// Files named on the command line. An entry that is not an existing path and
/// carries glob metacharacters is expanded. Repeats are dropped.
#[derive(Debug, Clone)]
pub struct ArgsFileSelector {
    patterns: Vec<String>,
}

impl ArgsFileSelector {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }
}

impl FileSelector for ArgsFileSelector {
    fn select_files(&mut self) -> Result<Vec<PathBuf>> {
        let mut files: IndexSet<PathBuf> = IndexSet::new();
        for pattern in &self.patterns {
            let literal = Path::new(pattern);
            if literal.exists() || !pattern.contains(['*', '?', '[']) {
                insert_once(&mut files, literal.to_path_buf());
                continue;
            }
            let mut matched = 0;
            for entry in glob(pattern).with_context(|| format!("Bad glob pattern '{}'", pattern))? {
                match entry {
                    Ok(path) if path.is_file() => {
                        insert_once(&mut files, path);
                        matched += 1;
                    }
                    Ok(_) => {}
                    Err(e) => warn!("skipping unreadable glob match: {}", e),
                }
            }
            if matched == 0 {
                warn!(pattern = %pattern, "glob matched no files");
            }
        }
        debug!(count = files.len(), "selected input files");
        Ok(files.into_iter().collect())
    }
}

fn insert_once(files: &mut IndexSet<PathBuf>, path: PathBuf) {
    if files.contains(&path) {
        debug!(path = %path.display(), "dropping repeated input file");
    } else {
        files.insert(path);
    }
}

#[derive(Debug, Clone, Default)]
pub struct FixedFiles(pub Vec<PathBuf>);

impl FileSelector for FixedFiles {
    fn select_files(&mut self) -> Result<Vec<PathBuf>> {
        Ok(self.0.clone())
    }
}

/// Always answers with the same label, member of the set or not.
#[derive(Debug, Clone, Default)]
pub struct FixedLabel(pub Option<Label>);

impl LabelChooser for FixedLabel {
    fn choose_label(&mut self, _labels: &CommonLabelSet) -> Result<Option<Label>> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FixedOutput(pub Option<PathBuf>);

impl OutputChooser for FixedOutput {
    fn choose_output(&mut self) -> Result<Option<PathBuf>> {
        Ok(self.0.clone())
    }
}

const PROMPT_COLUMNS: usize = 3;

/// Where prompt answers come from, one line at a time.
///
/// `Stdin` is read through its shared handle rather than a held lock, so the
/// label and output prompts can both exist for the whole run.
pub trait LineSource {
    /// Next line including its terminator, or `None` at end of input.
    fn next_line(&mut self) -> io::Result<Option<String>>;
}

impl LineSource for io::Stdin {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        Ok((self.read_line(&mut line)? > 0).then_some(line))
    }
}

impl<T: AsRef<[u8]>> LineSource for Cursor<T> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        Ok((BufRead::read_line(self, &mut line)? > 0).then_some(line))
    }
}

/// Numbered menu of labels on a text terminal. Accepts an index or a label
/// name; a blank answer or end of input cancels.
pub struct PromptLabelChooser<R, W> {
    input: R,
    output: W,
}

impl<R: LineSource, W: Write> PromptLabelChooser<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: LineSource, W: Write> LabelChooser for PromptLabelChooser<R, W> {
    fn choose_label(&mut self, labels: &CommonLabelSet) -> Result<Option<Label>> {
        if labels.is_empty() {
            writeln!(self.output, "No common labels to choose from.")?;
            return Ok(None);
        }

        let width = labels.iter().map(|l| l.len()).max().unwrap_or(0);
        for (idx, label) in labels.iter().enumerate() {
            let sep = if (idx + 1) % PROMPT_COLUMNS == 0 || idx + 1 == labels.len() {
                "\n"
            } else {
                "  "
            };
            write!(self.output, "{:>3}) {:<width$}{}", idx + 1, label, sep, width = width)?;
        }

        loop {
            write!(self.output, "Select a label (number or name, blank to cancel): ")?;
            self.output.flush()?;

            let Some(answer) = read_answer(&mut self.input)? else {
                return Ok(None);
            };
            if answer.is_empty() {
                return Ok(None);
            }
            if let Ok(n) = answer.parse::<usize>() {
                if let Some(label) = n.checked_sub(1).and_then(|i| labels.get_index(i)) {
                    return Ok(Some(label.clone()));
                }
            } else if labels.contains(answer.as_str()) {
                return Ok(Some(answer));
            }
            writeln!(self.output, "'{}' is not one of the listed labels.", answer)?;
        }
    }
}

/// Asks for the merged table path. A missing extension becomes `.csv`.
pub struct PromptOutputChooser<R, W> {
    input: R,
    output: W,
}

impl<R: LineSource, W: Write> PromptOutputChooser<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: LineSource, W: Write> OutputChooser for PromptOutputChooser<R, W> {
    fn choose_output(&mut self) -> Result<Option<PathBuf>> {
        write!(self.output, "Output file name (blank to cancel): ")?;
        self.output.flush()?;
        Ok(read_answer(&mut self.input)?
            .filter(|a| !a.is_empty())
            .map(|a| {
                let mut path = PathBuf::from(a);
                if path.extension().is_none() {
                    path.set_extension("csv");
                }
                path
            }))
    }
}

/// One trimmed line, or `None` at end of input.
fn read_answer<R: LineSource>(input: &mut R) -> Result<Option<String>> {
    let line = input.next_line().context("reading answer")?;
    Ok(line.map(|l| l.trim().to_string()))
}
