use anyhow::Result;
use std::{fs, path::Path, path::PathBuf};
use tempfile::{tempdir, TempDir};
use zonemerge::{
    is_user_abort,
    pipeline::{
        self,
        ports::{FixedFiles, FixedLabel, FixedOutput},
    },
    MergeConfig, MergeError,
};

// Column C never holds "1.0" here, so C drops out for every file.
const GROUP_1: &str = "Average1;A;B;C
A;1;2;0.5
B;1.0;1.0;0.5
C;0.5;0.5;0.9

";

const GROUP_2: &str = "Average1;A;B;C
A;3;4;0.5
B;1.0;1.0;0.5
C;0.5;0.5;1.0

Average2;B;A;C
B;1.0;0.25;0.1
A;0.25;1.0;0.2
C;0.1;0.2;1.0

";

struct Fixture {
    dir: TempDir,
    inputs: Vec<PathBuf>,
}

impl Fixture {
    fn new() -> Result<Self> {
        let dir = tempdir()?;
        let mut inputs = Vec::new();
        for (name, text) in [("mice_a.csv", GROUP_1), ("mice_b.csv", GROUP_2)] {
            let path = dir.path().join(name);
            fs::write(&path, text)?;
            inputs.push(path);
        }
        Ok(Self { dir, inputs })
    }

    fn config(&self) -> MergeConfig {
        MergeConfig {
            work_dir: self.dir.path().join("work"),
            ..MergeConfig::default()
        }
    }

    fn output(&self) -> PathBuf {
        self.dir.path().join("merged.csv")
    }

    fn run(&self, cfg: &MergeConfig, label: Option<&str>) -> Result<pipeline::RunSummary> {
        pipeline::run(
            cfg,
            &mut FixedFiles(self.inputs.clone()),
            &mut FixedLabel(label.map(str::to_string)),
            &mut FixedOutput(Some(self.output())),
        )
    }
}

fn read(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path)?)
}

#[test]
fn merges_chosen_row_across_files() -> Result<()> {
    let fx = Fixture::new()?;
    let summary = fx.run(&fx.config(), Some("A"))?;

    assert_eq!(summary.common_labels.iter().collect::<Vec<_>>(), ["A", "B"]);
    assert_eq!(summary.entities, ["Average1", "Average2"]);
    assert_eq!(
        read(&fx.output())?,
        "Brain zone: A;Average1;Average2\nA;4.0;1.0\nB;6.0;0.25\n"
    );

    // intermediates are cleaned up by default
    assert_eq!(summary.deleted, 2);
    assert!(summary.intermediates.iter().all(|p| !p.exists()));
    Ok(())
}

#[test]
fn intermediates_carry_reattached_headers() -> Result<()> {
    let fx = Fixture::new()?;
    let cfg = MergeConfig {
        keep_intermediate: true,
        ..fx.config()
    };
    let summary = fx.run(&cfg, Some("B"))?;

    assert_eq!(
        summary.intermediates,
        vec![
            cfg.work_dir.join("trimmed_file1.csv"),
            cfg.work_dir.join("trimmed_file2.csv"),
        ]
    );
    assert_eq!(
        read(&summary.intermediates[0])?,
        "Average1;A;B\nA;1;2\nB;1.0;1.0\n\n"
    );
    assert_eq!(
        read(&summary.intermediates[1])?,
        "Average1;A;B\nA;3;4\nB;1.0;1.0\n\nAverage2;A;B\nB;0.25;1.0\nA;1.0;0.25\n\n"
    );
    assert_eq!(
        read(&fx.output())?,
        "Brain zone: B;Average1;Average2\nA;2.0;0.25\nB;2.0;1.0\n"
    );
    Ok(())
}

#[test]
fn unknown_label_yields_bare_table() -> Result<()> {
    let fx = Fixture::new()?;
    let summary = fx.run(&fx.config(), Some("Z"))?;
    assert!(summary.entities.is_empty());
    assert_eq!(read(&fx.output())?, "Brain zone: Z\nA\nB\n");
    Ok(())
}

#[test]
fn empty_selection_aborts_before_any_io() -> Result<()> {
    let fx = Fixture::new()?;
    let cfg = fx.config();
    let err = pipeline::run(
        &cfg,
        &mut FixedFiles(Vec::new()),
        &mut FixedLabel(Some("A".into())),
        &mut FixedOutput(Some(fx.output())),
    )
    .unwrap_err();

    assert!(is_user_abort(&err));
    assert!(!cfg.work_dir.exists());
    assert!(!fx.output().exists());
    Ok(())
}

#[test]
fn cancelled_label_leaves_intermediates_behind() -> Result<()> {
    let fx = Fixture::new()?;
    let cfg = fx.config();
    let err = fx.run(&cfg, None).unwrap_err();

    assert!(is_user_abort(&err));
    assert!(cfg.work_dir.join("trimmed_file1.csv").exists());
    assert!(!fx.output().exists());
    Ok(())
}

#[test]
fn cancelled_output_aborts_after_trimming() -> Result<()> {
    let fx = Fixture::new()?;
    let cfg = fx.config();
    let err = pipeline::run(
        &cfg,
        &mut FixedFiles(fx.inputs.clone()),
        &mut FixedLabel(Some("A".into())),
        &mut FixedOutput(None),
    )
    .unwrap_err();

    assert!(is_user_abort(&err));
    assert_eq!(err.to_string(), "No output file name provided. Exiting.");
    assert!(cfg.work_dir.join("trimmed_file2.csv").exists());
    Ok(())
}

#[test]
fn unreadable_input_is_a_hard_error() -> Result<()> {
    let fx = Fixture::new()?;
    let err = pipeline::run(
        &fx.config(),
        &mut FixedFiles(vec![fx.dir.path().join("missing.csv")]),
        &mut FixedLabel(Some("A".into())),
        &mut FixedOutput(Some(fx.output())),
    )
    .unwrap_err();
    assert!(!is_user_abort(&err));
    Ok(())
}

#[test]
fn file_without_closed_block_fails_instead_of_vanishing() -> Result<()> {
    let fx = Fixture::new()?;
    let open_ended = fx.dir.path().join("mice_c.csv");
    fs::write(&open_ended, "Average2;A;B\nA;1.0;5\nB;6;1.0\n")?;

    let err = pipeline::run(
        &fx.config(),
        &mut FixedFiles(vec![fx.inputs[0].clone(), open_ended]),
        &mut FixedLabel(Some("A".into())),
        &mut FixedOutput(Some(fx.output())),
    )
    .unwrap_err();

    assert!(!is_user_abort(&err));
    assert!(matches!(
        err.chain().find_map(|e| e.downcast_ref::<MergeError>()),
        Some(MergeError::NoCompleteBlocks { roster: 1, .. })
    ));
    assert!(!fx.output().exists());
    Ok(())
}

#[test]
fn single_file_values_are_copied_as_written() -> Result<()> {
    let fx = Fixture::new()?;
    pipeline::run(
        &fx.config(),
        &mut FixedFiles(vec![fx.inputs[0].clone()]),
        &mut FixedLabel(Some("A".into())),
        &mut FixedOutput(Some(fx.output())),
    )?;
    assert_eq!(read(&fx.output())?, "Brain zone: A;Average1\nA;1\nB;2\n");
    Ok(())
}
