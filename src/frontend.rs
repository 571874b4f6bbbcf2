// This module provides AssemblyModule, the minimal front end shipped with targetlink: its
// source language is textual LLVM IR. Loading a module parse-checks the text in a scratch
// context and reports parser failures as error diagnostics; a module that does not define
// its `<name>.__modinit__` initializer gets a warning. Rendering binds the text to a
// target descriptor: any target triple or data layout line is replaced by the
// descriptor's triple, and calls to `@printf` are redirected to the descriptor's print
// routine so the same source links against runtimes that substitute their own.

//! Textual-IR front end.

use crate::core::backend::BackendContext;
use crate::core::module::{modinit_symbol, IrModule};
use crate::diagnostic::{Diagnostic, DiagnosticEngine, Halted, Level};
use crate::target::TargetDescriptor;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Symbol the source uses for formatted printing.
const SOURCE_PRINT_FUNCTION: &str = "printf";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Halted(#[from] Halted),
}

/// A module whose source is textual LLVM IR.
#[derive(Debug, Clone)]
pub struct AssemblyModule {
    name: String,
    source: String,
}

impl AssemblyModule {
    /// Load a module from source text, reporting problems to `engine`.
    pub fn from_string(
        name: impl Into<String>,
        source: impl Into<String>,
        engine: &mut DiagnosticEngine,
    ) -> Result<Self, Halted> {
        let name = name.into();
        let source = source.into();

        let scratch = BackendContext::new();
        match scratch.parse_module(&name, &source) {
            Ok(llmod) => {
                let initializer = modinit_symbol(&name);
                let defined = llmod
                    .get_function(&initializer)
                    .is_some_and(|f| f.count_basic_blocks() > 0);
                if !defined {
                    engine.report(Diagnostic::new(
                        Level::Warning,
                        format!("module `{}` does not define `{}`", name, initializer),
                    ))?;
                }
            }
            Err(e) => engine.report(Diagnostic::from_llvm_parse_error(&e.to_string()))?,
        }

        Ok(Self { name, source })
    }

    /// Load a module from a file; the module is named after the file stem.
    pub fn from_filename(
        path: impl AsRef<Path>,
        engine: &mut DiagnosticEngine,
    ) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "module".to_string());
        Ok(Self::from_string(name, source, engine)?)
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl IrModule for AssemblyModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn render_ir(&self, target: &TargetDescriptor) -> String {
        let mut out = String::with_capacity(self.source.len() + 64);
        for line in self.source.lines() {
            let trimmed = line.trim_start();
            if trimmed.starts_with("target triple") || trimmed.starts_with("target datalayout") {
                continue;
            }
            out.push_str(&rename_symbol(
                line,
                SOURCE_PRINT_FUNCTION,
                target.print_function(),
            ));
            out.push('\n');
        }
        out.push_str(&format!("target triple = \"{}\"\n", target.triple()));
        out
    }

    fn entry_point(&self) -> String {
        modinit_symbol(&self.name)
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '$' | '.' | '_' | '-')
}

/// Replace global references `@from` by `@to`, leaving longer names alone.
///
/// Quoted text (string constants, metadata strings, quoted names) is copied
/// unchanged. IR escapes a quote inside a string as `\22`, so every `"`
/// toggles quoting.
fn rename_symbol(text: &str, from: &str, to: &str) -> String {
    if from == to {
        return text.to_string();
    }

    let pattern = format!("@{}", from);
    text.split('"')
        .enumerate()
        .map(|(i, part)| {
            if i % 2 == 0 {
                rename_unquoted(part, &pattern, to)
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\"")
}

fn rename_unquoted(text: &str, pattern: &str, to: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(pattern) {
        let after = &rest[pos + pattern.len()..];
        out.push_str(&rest[..pos]);
        if after.chars().next().map_or(true, |c| !is_ident_char(c)) {
            out.push('@');
            out.push_str(to);
        } else {
            out.push_str(pattern);
        }
        rest = after;
    }
    out.push_str(rest);
    out
}
