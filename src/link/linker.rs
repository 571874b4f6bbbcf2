//! External linker port.
//!
//! The link stage never spawns processes itself. It builds a
//! [`LinkerInvocation`] and hands it to a [`Linker`]; [`SystemLinker`] is the
//! production implementation, tests plug in their own.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A fully resolved linker command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkerInvocation {
    /// Linker binary, e.g. `or1k-linux-ld`.
    pub program: String,
    /// Arguments in the order they are passed to the linker.
    pub args: Vec<OsString>,
    /// Object files, in caller order.
    pub objects: Vec<PathBuf>,
    /// Where the shared library is written.
    pub output: PathBuf,
}

impl LinkerInvocation {
    /// `<triple>-ld -shared --eh-frame-hdr -init <init_fn> <objects...> -o <output>`
    pub fn shared_library(
        triple: &str,
        init_fn: &str,
        objects: &[PathBuf],
        output: &Path,
    ) -> Self {
        let mut args: Vec<OsString> = ["-shared", "--eh-frame-hdr", "-init", init_fn]
            .iter()
            .map(OsString::from)
            .collect();
        args.extend(objects.iter().map(|p| p.as_os_str().to_owned()));
        args.push(OsString::from("-o"));
        args.push(output.as_os_str().to_owned());

        Self {
            program: format!("{}-ld", triple),
            args,
            objects: objects.to_vec(),
            output: output.to_path_buf(),
        }
    }
}

impl fmt::Display for LinkerInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Outcome of a linker process that ran to completion.
#[derive(Debug, Clone, Default)]
pub struct LinkerOutput {
    pub success: bool,
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    /// Everything the linker wrote to standard error.
    pub stderr: Vec<u8>,
}

/// Something that can run a linker command line.
pub trait Linker {
    /// Run `invocation` to completion. An `Err` means the linker could not be
    /// run at all; a failing linker is reported through [`LinkerOutput`].
    fn run(&self, invocation: &LinkerInvocation) -> io::Result<LinkerOutput>;
}

impl<L: Linker + ?Sized> Linker for &L {
    fn run(&self, invocation: &LinkerInvocation) -> io::Result<LinkerOutput> {
        (**self).run(invocation)
    }
}

/// Runs the linker as a child process, blocking until it exits.
///
/// There is no timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLinker;

impl Linker for SystemLinker {
    fn run(&self, invocation: &LinkerInvocation) -> io::Result<LinkerOutput> {
        let output = Command::new(OsStr::new(&invocation.program))
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stderr(Stdio::piped())
            .output()?;

        Ok(LinkerOutput {
            success: output.status.success(),
            code: output.status.code(),
            stderr: output.stderr,
        })
    }
}
