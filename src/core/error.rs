// This module defines the error taxonomy of the targetlink pipeline using the thiserror
// crate. CompileError covers everything that can go wrong while lowering one module to a
// relocatable object: rendered IR that does not parse, IR that fails verification (both
// are defects in the upstream front end), triples the backend does not know, target
// machines that cannot be created, and opaque optimization/emission failures. LinkError
// covers the link stage: empty inputs, temporary-file staging, spawning the external
// linker, a non-zero linker exit (carrying the captured stderr verbatim), and reading
// back the produced library. PipelineError wraps both for compile_and_link.

//! Error types for the compile and link stages.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while lowering a module to a relocatable object.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Malformed IR in module `{module}`: {reason}")]
    MalformedIr {
        module: String,
        reason: String,
    },

    #[error("IR verification failed for module `{module}`: {reason}")]
    Verification {
        module: String,
        reason: String,
    },

    #[error("Unknown target `{triple}`: {reason}")]
    UnknownTarget {
        triple: String,
        reason: String,
    },

    #[error("Cannot create target machine for `{triple}` (features `{features}`)")]
    TargetMachine {
        triple: String,
        features: String,
    },

    #[error("Optimization pipeline failed: {reason}")]
    Optimization {
        reason: String,
    },

    #[error("Code generation failed: {reason}")]
    CodeGeneration {
        reason: String,
    },
}

impl CompileError {
    /// Whether this error signals a defect in the front end rather than a
    /// problem with the target or the backend.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            CompileError::MalformedIr { .. } | CompileError::Verification { .. }
        )
    }
}

/// Failure while linking relocatable objects into a shared library.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("No relocatable objects to link")]
    NoObjects,

    #[error("Initialization symbol must not be empty")]
    EmptyInitSymbol,

    #[error("Failed to stage temporary link files: {0}")]
    Staging(#[source] io::Error),

    #[error("Failed to start linker `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Linker invocation failed: {stderr}")]
    Failed {
        status: Option<i32>,
        stderr: String,
    },

    #[error("Failed to read linker output {path:?}: {source}")]
    ReadOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Linker reported success but produced an empty library")]
    EmptyOutput,
}

/// Failure of [`Target::compile_and_link`](crate::target::Target::compile_and_link).
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No modules to compile")]
    NoModules,

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Link(#[from] LinkError),
}

/// Result type alias for compile operations.
pub type CompileResult<T> = Result<T, CompileError>;

/// Result type alias for link operations.
pub type LinkResult<T> = Result<T, LinkError>;
