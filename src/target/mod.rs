// This module provides Target, the unit that turns front-end modules into native code
// for one architecture. A Target pairs an immutable TargetDescriptor (triple, CPU
// features, print routine) with the LLVM context it exclusively owns and with the linker
// port used by the link stage. compile() renders a module to textual IR, parses and
// verifies it, resolves a position-independent target machine, runs the fixed
// default<Os> pipeline (opt level 2, size level 1) and emits a relocatable object.
// link() delegates to the link stage. compile_and_link() compiles every module in input
// order and links the objects using the first module's entry point as the initializer.

//! Targets: descriptor + backend context + linker.

pub mod descriptor;

pub use descriptor::{TargetDescriptor, UnknownTargetName};

use crate::core::backend::BackendContext;
use crate::core::error::{CompileError, CompileResult, LinkResult, PipelineError};
use crate::core::module::IrModule;
use crate::link::{self, Linker, SystemLinker};
use inkwell::module::Module;
use inkwell::passes::PassBuilderOptions;
use inkwell::targets::{
    CodeModel, FileType, RelocMode, Target as LlvmTarget, TargetMachine, TargetTriple,
};
use inkwell::OptimizationLevel;
use std::fmt;

/// Module pass pipeline run before emission: `-O2` tuned for size (`-Os`).
pub const PASS_PIPELINE: &str = "default<Os>";

/// A compilation target with its own backend context.
pub struct Target {
    descriptor: TargetDescriptor,
    context: BackendContext,
    linker: Box<dyn Linker>,
}

impl Target {
    /// Create a target for `descriptor`, linking with [`SystemLinker`].
    pub fn new(descriptor: TargetDescriptor) -> Self {
        Self {
            descriptor,
            context: BackendContext::new(),
            linker: Box::new(SystemLinker),
        }
    }

    /// Target for the machine running the pipeline.
    pub fn native() -> Self {
        Self::new(TargetDescriptor::native())
    }

    /// Target for the OpenRISC 1000 soft core.
    pub fn or1k() -> Self {
        Self::new(TargetDescriptor::or1k())
    }

    /// Replace the linker used by [`Target::link`].
    pub fn with_linker(mut self, linker: impl Linker + 'static) -> Self {
        self.linker = Box::new(linker);
        self
    }

    pub fn descriptor(&self) -> &TargetDescriptor {
        &self.descriptor
    }

    pub fn triple(&self) -> &str {
        self.descriptor.triple()
    }

    pub fn features(&self) -> &[&'static str] {
        self.descriptor.features()
    }

    pub fn print_function(&self) -> &str {
        self.descriptor.print_function()
    }

    pub fn context(&self) -> &BackendContext {
        &self.context
    }

    /// Parse textual IR into this target's context without verifying it.
    pub fn parse_ir(&self, name: &str, ir: &str) -> CompileResult<Module<'_>> {
        self.context
            .parse_module(name, ir)
            .map_err(|e| CompileError::MalformedIr {
                module: name.to_string(),
                reason: e.to_string(),
            })
    }

    /// Resolve the LLVM target machine described by this target.
    pub fn target_machine(&self) -> CompileResult<TargetMachine> {
        let triple = TargetTriple::create(self.triple());
        let target = LlvmTarget::from_triple(&triple).map_err(|e| {
            CompileError::UnknownTarget {
                triple: self.triple().to_string(),
                reason: e.to_string(),
            }
        })?;

        let features = self.descriptor.feature_string();
        target
            .create_target_machine(
                &triple,
                "",
                &features,
                OptimizationLevel::Default,
                RelocMode::PIC,
                CodeModel::Default,
            )
            .ok_or_else(|| CompileError::TargetMachine {
                triple: self.triple().to_string(),
                features,
            })
    }

    /// Compile `module` to a relocatable object for this target.
    pub fn compile<M: IrModule + ?Sized>(&self, module: &M) -> CompileResult<Vec<u8>> {
        let name = module.name();
        log::info!("Compiling module `{}` for {}", name, self.descriptor);

        let ir = module.render_ir(&self.descriptor);
        log::trace!("Rendered IR for `{}`:\n{}", name, ir);

        let llmod = self.parse_ir(name, &ir)?;
        llmod.verify().map_err(|e| CompileError::Verification {
            module: name.to_string(),
            reason: e.to_string(),
        })?;

        // The pass pipeline needs the machine, so it is resolved first.
        let machine = self.target_machine()?;
        llmod.set_triple(&machine.get_triple());
        llmod.set_data_layout(&machine.get_target_data().get_data_layout());

        llmod
            .run_passes(PASS_PIPELINE, &machine, PassBuilderOptions::create())
            .map_err(|e| CompileError::Optimization {
                reason: e.to_string(),
            })?;

        let buffer = machine
            .write_to_memory_buffer(&llmod, FileType::Object)
            .map_err(|e| CompileError::CodeGeneration {
                reason: e.to_string(),
            })?;

        let object = buffer.as_slice().to_vec();
        log::debug!("Module `{}`: {} bytes of object code", name, object.len());
        Ok(object)
    }

    /// Link relocatable objects into a shared library whose initializer is
    /// `init_fn`.
    pub fn link<O: AsRef<[u8]>>(&self, objects: &[O], init_fn: &str) -> LinkResult<Vec<u8>> {
        log::info!("Linking {} object(s) for {}", objects.len(), self.descriptor);
        link::link_shared_library(&*self.linker, self.triple(), objects, init_fn)
    }

    /// Compile every module and link the objects into one shared library.
    ///
    /// The first module is the entry module: its entry point becomes the
    /// library initializer.
    pub fn compile_and_link<M: IrModule>(&self, modules: &[M]) -> Result<Vec<u8>, PipelineError> {
        let first = modules.first().ok_or(PipelineError::NoModules)?;

        let objects = modules
            .iter()
            .map(|module| self.compile(module))
            .collect::<CompileResult<Vec<_>>>()?;

        Ok(self.link(&objects, &first.entry_point())?)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
