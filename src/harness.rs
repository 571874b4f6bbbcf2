//! Standalone-executable harness.
//!
//! Turns front-end source into IR a generic IR runner (e.g. `lli`) can execute
//! directly: the module is rendered for the host, then a `void main()` that
//! calls the module initializer is appended. No object code is produced.

use crate::core::error::CompileError;
use crate::core::module::IrModule;
use crate::diagnostic::{DiagnosticEngine, Halted};
use crate::frontend::AssemblyModule;
use crate::target::Target;
use inkwell::builder::BuilderError;
use thiserror::Error;

/// Tab stop used when expanding source tabs, so diagnostic columns match.
pub const TAB_WIDTH: usize = 8;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error(transparent)]
    Halted(#[from] Halted),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Module does not define initializer `{0}`")]
    MissingInitializer(String),

    #[error("Module already defines `main`")]
    MainAlreadyDefined,

    #[error("Initializer `{name}` takes {params} parameter(s); expected none")]
    InitializerTakesArguments { name: String, params: u32 },

    #[error("Failed to build entry function: {0}")]
    Builder(#[from] BuilderError),
}

/// Expand tabs to the next multiple of `width` columns.
pub fn expand_tabs(source: &str, width: usize) -> String {
    let mut out = String::with_capacity(source.len());
    let mut column = 0;
    for c in source.chars() {
        match c {
            '\t' => {
                let pad = width - column % width;
                out.extend(std::iter::repeat(' ').take(pad));
                column += pad;
            }
            '\n' | '\r' => {
                out.push(c);
                column = 0;
            }
            _ => {
                out.push(c);
                column += 1;
            }
        }
    }
    out
}

/// Compile `source` for the host and wrap its initializer in `main`.
///
/// Diagnostics go to `engine`; the first `error`/`fatal` one aborts with
/// [`HarnessError::Halted`].
pub fn executable_ir(
    name: &str,
    source: &str,
    engine: &mut DiagnosticEngine,
) -> Result<String, HarnessError> {
    let module = AssemblyModule::from_string(name, expand_tabs(source, TAB_WIDTH), engine)?;

    let target = Target::native();
    let ir = module.render_ir(target.descriptor());
    let llmod = target.parse_ir(module.name(), &ir)?;

    if llmod.get_function("main").is_some() {
        return Err(HarnessError::MainAlreadyDefined);
    }
    let entry = module.entry_point();
    let initializer = llmod
        .get_function(&entry)
        .ok_or_else(|| HarnessError::MissingInitializer(entry.clone()))?;
    let params = initializer.count_params();
    if params != 0 {
        return Err(HarnessError::InitializerTakesArguments { name: entry, params });
    }

    let context = target.context().llvm();
    let main = llmod.add_function("main", context.void_type().fn_type(&[], false), None);
    let builder = context.create_builder();
    builder.position_at_end(context.append_basic_block(main, "entry"));
    builder.build_call(initializer, &[], "")?;
    builder.build_return(None)?;

    llmod.verify().map_err(|e| CompileError::Verification {
        module: module.name().to_string(),
        reason: e.to_string(),
    })?;

    log::debug!("Wrapped `{}` in main", entry);
    Ok(llmod.print_to_string().to_string())
}
