// This module defines the IrModule trait, the boundary between targetlink and the
// upstream front end. A front end hands the pipeline modules that can render themselves
// to textual LLVM IR for a given target descriptor and that name the symbol a loader
// must call to run module-level initialization. The pipeline only borrows modules for
// the duration of a compile call and never inspects them beyond these three queries.

//! Upstream module port.

use crate::target::TargetDescriptor;

/// A compiled front-end module, as seen by the code-generation pipeline.
pub trait IrModule {
    /// Module identifier; used as the backend module name.
    fn name(&self) -> &str;

    /// Render the module as textual IR for `target`.
    fn render_ir(&self, target: &TargetDescriptor) -> String;

    /// Name of the module initialization symbol.
    fn entry_point(&self) -> String;
}

impl<T: IrModule + ?Sized> IrModule for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn render_ir(&self, target: &TargetDescriptor) -> String {
        (**self).render_ir(target)
    }

    fn entry_point(&self) -> String {
        (**self).entry_point()
    }
}

impl<T: IrModule + ?Sized> IrModule for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn render_ir(&self, target: &TargetDescriptor) -> String {
        (**self).render_ir(target)
    }

    fn entry_point(&self) -> String {
        (**self).entry_point()
    }
}

/// Conventional initializer symbol of a module named `name`.
pub fn modinit_symbol(name: &str) -> String {
    format!("{}.__modinit__", name)
}
