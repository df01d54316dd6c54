use anyhow::Result;
use std::{env, path::Path, process::exit};
use zonemerge::matrix::{parse_matrix_file, ParseOptions};

fn main() {
    // Expect exactly one CLI argument: path to a matrix file.
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <MATRIX_FILE>", args[0]);
        exit(1);
    }
    if let Err(e) = inspect(Path::new(&args[1])) {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

/// Parse with flush-on-EOF so a block lost to a missing blank line still shows up.
fn inspect(path: &Path) -> Result<()> {
    let strict = parse_matrix_file(path, &ParseOptions::default())?;
    let lenient = parse_matrix_file(
        path,
        &ParseOptions {
            flush_trailing_block: true,
            ..ParseOptions::default()
        },
    )?;

    println!("=== Matrix file: {} ===", path.display());
    println!("Blocks:               {}", lenient.matrices.len());
    if lenient.matrices.len() != strict.matrices.len() {
        println!("  (last block has no trailing blank line and is ignored by zonemerge)");
    }
    println!("File labels ({}):     {}", strict.labels.len(), strict.labels.join(", "));
    println!("Entities ({}):        {}", strict.entities.len(), strict.entities.join(", "));
    println!();

    for (idx, m) in lenient.matrices.iter().enumerate() {
        let separators = m.rows.iter().filter(|r| r.is_separator()).count();
        println!(
            "- #{:<3} {:<30} | labels: {:>4} | rows: {:>4} | separators: {}",
            idx + 1,
            m.title,
            m.labels.len(),
            m.rows.len() - separators,
            separators
        );
    }
    Ok(())
}
