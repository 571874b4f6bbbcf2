//! Code-generation backend state.
//!
//! Two pieces of state live here:
//!
//! - The process-wide LLVM target registry. It is populated once, lazily, by
//!   [`ensure_initialized`], which every target constructor calls. Nothing is
//!   registered at load time.
//! - [`BackendContext`], the per-target LLVM context. Each
//!   [`Target`](crate::target::Target) owns exactly one and drops it with
//!   itself.
//!
//! # Concurrency
//!
//! An LLVM context is not thread-safe and `inkwell::context::Context` is
//! neither `Send` nor `Sync`. `BackendContext` inherits that, so every
//! compile call that shares a context is serialized by ownership: a `Target`
//! cannot be shared between threads. Parallel compilation uses one `Target`
//! per thread.

use inkwell::context::Context;
use inkwell::memory_buffer::MemoryBuffer;
use inkwell::module::Module;
use inkwell::support::LLVMString;
use inkwell::targets::{InitializationConfig, Target};
use std::sync::Once;

static INIT: Once = Once::new();

/// Register every backend target, asm parser and asm printer LLVM was built
/// with. Idempotent.
pub fn ensure_initialized() {
    INIT.call_once(|| {
        Target::initialize_all(&InitializationConfig::default());
        log::debug!("LLVM target registry initialized");
    });
}

/// Whether [`ensure_initialized`] has already run in this process.
#[cfg(test)]
fn is_initialized() -> bool {
    INIT.is_completed()
}

/// LLVM context owned by a single target.
pub struct BackendContext {
    context: Context,
}

impl BackendContext {
    /// Create a fresh context, initializing the target registry on first use.
    pub fn new() -> Self {
        ensure_initialized();
        Self {
            context: Context::create(),
        }
    }

    /// Access the underlying LLVM context.
    pub fn llvm(&self) -> &Context {
        &self.context
    }

    /// Parse textual IR into a module living in this context.
    ///
    /// `name` becomes the module identifier.
    pub fn parse_module(&self, name: &str, ir: &str) -> Result<Module<'_>, LLVMString> {
        let buffer = MemoryBuffer::create_from_memory_range_copy(ir.as_bytes(), name);
        self.context.create_module_from_ir(buffer)
    }
}

impl Default for BackendContext {
    fn default() -> Self {
        Self::new()
    }
}
