//! Core targetlink infrastructure.
//!
//! ## Backend (`backend`)
//! - One-shot, lazy initialization of the LLVM target registry
//! - Per-target LLVM context ownership
//!
//! ## Module port (`module`)
//! - The `IrModule` trait front ends implement
//!
//! ## Errors (`error`)
//! - Compile, link and pipeline error taxonomy

pub mod backend;
pub mod error;
pub mod module;

pub use backend::{ensure_initialized, BackendContext};

pub use error::{
    CompileError,
    CompileResult,
    LinkError,
    LinkResult,
    PipelineError,
};

pub use module::{modinit_symbol, IrModule};
