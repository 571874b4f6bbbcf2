//! Render a module as directly executable IR.
//!
//! Reads source from the given files (concatenated) or from stdin, and prints
//! IR with a `main` wrapping the module initializer, ready for `lli`.

use clap::Parser;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use targetlink::diagnostic::DiagnosticEngine;
use targetlink::harness::{self, HarnessError};

#[derive(Parser)]
#[command(name = "llvmgen")]
#[command(about = "Emit host IR with a main() that runs the module initializer", long_about = None)]
struct Cli {
    /// Source files; stdin is read when none are given.
    files: Vec<PathBuf>,

    /// Module name; the initializer is `<name>.__modinit__`.
    #[arg(long, default_value = "input")]
    name: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let source = if cli.files.is_empty() {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        let mut buffer = String::new();
        for file in &cli.files {
            buffer.push_str(&fs::read_to_string(file)?);
        }
        buffer
    };

    let mut engine = DiagnosticEngine::with_hook(|diag| {
        println!("{}", diag.render().join("\n"));
    });

    match harness::executable_ir(&cli.name, &source, &mut engine) {
        Ok(ir) => {
            print!("{}", ir);
            Ok(())
        }
        // Already rendered by the hook.
        Err(HarnessError::Halted(_)) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
