use anyhow::Result;
use clap::Parser;
use std::io;
use tracing::info;
use zonemerge::{
    is_user_abort, logging,
    pipeline::{
        self,
        ports::{
            ArgsFileSelector, FixedLabel, FixedOutput, LabelChooser, OutputChooser,
            PromptLabelChooser, PromptOutputChooser,
        },
    },
    CliArgs, MergeConfig,
};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    logging::init("info,zonemerge=info");

    // ─── 2) configuration ────────────────────────────────────────────
    let cfg = MergeConfig::from_args(CliArgs::parse())?;
    cfg.validate()?;
    info!(inputs = cfg.inputs.len(), work_dir = %cfg.work_dir.display(), "startup");

    // ─── 3) wire collaborators ───────────────────────────────────────
    let mut selector = ArgsFileSelector::new(cfg.inputs.clone());
    let mut chooser: Box<dyn LabelChooser> = match &cfg.label {
        Some(label) => Box::new(FixedLabel(Some(label.clone()))),
        None => Box::new(PromptLabelChooser::new(io::stdin(), io::stdout())),
    };
    let mut destination: Box<dyn OutputChooser> = match &cfg.output {
        Some(path) => Box::new(FixedOutput(Some(path.clone()))),
        None => Box::new(PromptOutputChooser::new(io::stdin(), io::stdout())),
    };

    // ─── 4) run ──────────────────────────────────────────────────────
    match pipeline::run(&cfg, &mut selector, chooser.as_mut(), destination.as_mut()) {
        Ok(summary) => {
            println!(
                "The output file has been successfully created: {} ({} entities x {} labels)",
                summary.output.display(),
                summary.entities.len(),
                summary.common_labels.len()
            );
            Ok(())
        }
        Err(e) if is_user_abort(&e) => {
            println!("{}", e.root_cause());
            Ok(())
        }
        Err(e) => Err(e),
    }
}
