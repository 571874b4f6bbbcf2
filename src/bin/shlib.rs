//! Compile IR modules and link them into a shared library.
//!
//! The first file is the entry module. The library is written next to the
//! last file, with its extension replaced by `.so`, unless `--output` is given.

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process;
use targetlink::diagnostic::DiagnosticEngine;
use targetlink::frontend::{AssemblyModule, LoadError};
use targetlink::target::{Target, TargetDescriptor};

#[derive(Parser)]
#[command(name = "shlib")]
#[command(about = "Compile modules and link them into a shared library", long_about = None)]
struct Cli {
    /// Module files, entry module first.
    files: Vec<PathBuf>,

    /// `native` or `or1k`.
    #[arg(long, default_value = "or1k")]
    target: TargetDescriptor,

    /// Output path; defaults to the last input with a `.so` extension.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let Some(last) = cli.files.last() else {
        eprintln!("Expected at least one module filename");
        process::exit(1);
    };
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| last.with_extension("so"));

    let mut engine = DiagnosticEngine::with_hook(|diag| {
        eprintln!("{}", diag.render().join("\n"));
    });

    let mut modules = Vec::with_capacity(cli.files.len());
    for file in &cli.files {
        match AssemblyModule::from_filename(file, &mut engine) {
            Ok(module) => modules.push(module),
            Err(LoadError::Halted(_)) => process::exit(1),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
    }

    let target = Target::new(cli.target);
    let library = match target.compile_and_link(&modules) {
        Ok(library) => library,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    fs::write(&output, library)?;
    log::info!("Wrote {}", output.display());
    Ok(())
}
