// This module implements the link stage: it takes an ordered list of relocatable objects
// and an initialization symbol, stages every object in a private scratch directory,
// asks the configured Linker to produce a shared library with the symbol registered as
// the module initializer, and reads the library back into memory. The scratch directory
// is a tempfile::TempDir owned by the call, so every staged file disappears when the
// call returns, whether it succeeded or failed. The linker runs at most once per call
// and is never retried: a failing linker fails identically on the same inputs.

//! Link stage and linker port.

pub mod linker;

pub use linker::{Linker, LinkerInvocation, LinkerOutput, SystemLinker};

use crate::core::error::{LinkError, LinkResult};
use std::fs;
use std::path::PathBuf;

/// Link `objects` into a shared library for `triple` with `init_fn` as the
/// module initializer.
pub fn link_shared_library<O: AsRef<[u8]>>(
    linker: &dyn Linker,
    triple: &str,
    objects: &[O],
    init_fn: &str,
) -> LinkResult<Vec<u8>> {
    if objects.is_empty() {
        return Err(LinkError::NoObjects);
    }
    if init_fn.is_empty() {
        return Err(LinkError::EmptyInitSymbol);
    }

    let staging = tempfile::Builder::new()
        .prefix("targetlink-")
        .tempdir()
        .map_err(LinkError::Staging)?;

    let output = staging.path().join("output.so");
    fs::write(&output, b"").map_err(LinkError::Staging)?;

    let mut paths: Vec<PathBuf> = Vec::with_capacity(objects.len());
    for (index, object) in objects.iter().enumerate() {
        let path = staging.path().join(format!("object{}.o", index));
        fs::write(&path, object.as_ref()).map_err(LinkError::Staging)?;
        paths.push(path);
    }

    let invocation = LinkerInvocation::shared_library(triple, init_fn, &paths, &output);
    log::debug!("Linking {} object(s): {}", paths.len(), invocation);

    let result = linker.run(&invocation).map_err(|source| LinkError::Spawn {
        program: invocation.program.clone(),
        source,
    })?;

    if !result.success {
        let stderr = String::from_utf8_lossy(&result.stderr).into_owned();
        log::debug!("Linker exited with {:?}", result.code);
        return Err(LinkError::Failed {
            status: result.code,
            stderr,
        });
    }

    let library = fs::read(&output).map_err(|source| LinkError::ReadOutput {
        path: output.clone(),
        source,
    })?;
    if library.is_empty() {
        return Err(LinkError::EmptyOutput);
    }

    log::debug!("Linked shared library: {} bytes", library.len());
    Ok(library)
}
