//! targetlink - target abstraction and native-code production.
//!
//! Takes modules produced by a front end, lowers each one to a relocatable
//! object with LLVM, and links the objects into a shared library for a
//! specific architecture with an external linker.
//!
//! # Primary Usage
//!
//! ```ignore
//! use targetlink::target::Target;
//!
//! let target = Target::or1k();
//! // First module is the entry module; its initializer runs on load.
//! let library = target.compile_and_link(&[kernel, support])?;
//! ```
//!
//! # Architecture
//!
//! - [`core`] - Backend initialization and context, module port, errors
//! - [`target`] - Target descriptors and the compile/link pipeline
//! - [`link`] - Link stage and the external linker port
//! - [`diagnostic`] - Front-end diagnostics
//! - [`frontend`] - Textual-IR front end used by the binaries
//! - [`harness`] - Standalone-executable IR for host testing

pub mod core;
pub mod diagnostic;
pub mod frontend;
pub mod harness;
pub mod link;
pub mod target;

pub use self::core::{
    ensure_initialized, BackendContext, CompileError, CompileResult, IrModule, LinkError,
    LinkResult, PipelineError,
};
pub use link::{Linker, LinkerInvocation, LinkerOutput, SystemLinker};
pub use target::{Target, TargetDescriptor};
