//! Front-end diagnostics.
//!
//! Front ends report through a [`DiagnosticEngine`]. Every diagnostic is
//! passed to the engine's processing hook as soon as it is reported; `error`
//! and `fatal` diagnostics additionally halt the front end, which sees
//! [`Halted`] and propagates it.

use std::fmt;
use thiserror::Error;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Note,
    Warning,
    Error,
    Fatal,
}

impl Level {
    /// `error` and `fatal` stop compilation.
    pub fn is_halting(self) -> bool {
        matches!(self, Level::Error | Level::Fatal)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Note => "note",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Fatal => "fatal",
        })
    }
}

/// Source position, 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub location: Option<Location>,
    /// Text of the offending source line, for the caret display.
    pub source_line: Option<String>,
}

impl Diagnostic {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            location: None,
            source_line: None,
        }
    }

    pub fn with_location(mut self, location: Location, source_line: Option<String>) -> Self {
        self.location = Some(location);
        self.source_line = source_line;
        self
    }

    /// Convert an LLVM IR parser message into a diagnostic.
    ///
    /// LLVM reports `<buffer>:<line>:<col>: error: <message>` followed by the
    /// source line and a caret line; anything else is kept verbatim.
    pub fn from_llvm_parse_error(text: &str) -> Self {
        let mut lines = text.lines();
        let first = lines.next().unwrap_or_default();

        if let Some((position, message)) = first.split_once(": error: ") {
            let mut parts = position.rsplitn(3, ':');
            let column = parts.next().and_then(|c| c.parse().ok());
            let line = parts.next().and_then(|l| l.parse().ok());
            if let (Some(column), Some(line), Some(file)) = (column, line, parts.next()) {
                let source_line = lines.next().map(str::to_string);
                return Diagnostic::new(Level::Error, message).with_location(
                    Location {
                        file: file.to_string(),
                        line,
                        column,
                    },
                    source_line,
                );
            }
        }

        Diagnostic::new(Level::Error, text.trim_end())
    }

    /// Render as display lines: header, then source line and caret when known.
    pub fn render(&self) -> Vec<String> {
        let mut out = Vec::new();
        match &self.location {
            Some(loc) => out.push(format!(
                "{}:{}:{}: {}: {}",
                loc.file, loc.line, loc.column, self.level, self.message
            )),
            None => out.push(format!("{}: {}", self.level, self.message)),
        }
        if let (Some(loc), Some(source)) = (&self.location, &self.source_line) {
            out.push(source.clone());
            out.push(format!("{}^", " ".repeat(loc.column.saturating_sub(1))));
        }
        out
    }
}

/// Compilation was stopped by an `error` or `fatal` diagnostic.
#[derive(Error, Debug, Clone)]
#[error("compilation halted by {} diagnostic: {}", .diagnostic.level, .diagnostic.message)]
pub struct Halted {
    pub diagnostic: Diagnostic,
}

type ProcessHook = Box<dyn FnMut(&Diagnostic)>;

/// Collects diagnostics and forwards them to a processing hook.
#[derive(Default)]
pub struct DiagnosticEngine {
    diagnostics: Vec<Diagnostic>,
    process: Option<ProcessHook>,
}

impl DiagnosticEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine calling `hook` for every reported diagnostic.
    pub fn with_hook(hook: impl FnMut(&Diagnostic) + 'static) -> Self {
        Self {
            diagnostics: Vec::new(),
            process: Some(Box::new(hook)),
        }
    }

    /// Record `diagnostic`. Returns `Err` when its level halts compilation.
    pub fn report(&mut self, diagnostic: Diagnostic) -> Result<(), Halted> {
        if let Some(hook) = self.process.as_mut() {
            hook(&diagnostic);
        }
        let halting = diagnostic.level.is_halting();
        self.diagnostics.push(diagnostic.clone());
        if halting {
            Err(Halted { diagnostic })
        } else {
            Ok(())
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level.is_halting())
    }
}

impl fmt::Debug for DiagnosticEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticEngine")
            .field("diagnostics", &self.diagnostics)
            .field("process", &self.process.is_some())
            .finish()
    }
}
