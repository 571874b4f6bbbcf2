//! Target descriptors.
//!
//! A descriptor is pure data: triple, CPU feature names, and the name of the
//! `printf`-compatible routine the deployed runtime provides. Nothing is
//! validated here; an unknown triple only surfaces when a module is first
//! compiled for it.

use inkwell::targets::TargetMachine;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const OR1K_TRIPLE: &str = "or1k-linux";
const OR1K_FEATURES: &[&str] = &["mul", "div", "ffl1", "cmov", "addc"];
// The OR1K runtime has no printf; `log` shares its calling convention.
const OR1K_PRINT_FUNCTION: &str = "log";

const DEFAULT_PRINT_FUNCTION: &str = "printf";

/// Where binaries produced by the pipeline are deployed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetDescriptor {
    /// The machine running the pipeline.
    Native { triple: String },
    /// OpenRISC 1000 soft core.
    Or1k,
}

impl TargetDescriptor {
    /// Host descriptor with the triple LLVM detects for this machine.
    pub fn native() -> Self {
        let triple = TargetMachine::get_default_triple();
        TargetDescriptor::Native {
            triple: triple.as_str().to_string_lossy().into_owned(),
        }
    }

    pub fn or1k() -> Self {
        TargetDescriptor::Or1k
    }

    /// LLVM target triple, e.g. `or1k-linux`.
    pub fn triple(&self) -> &str {
        match self {
            TargetDescriptor::Native { triple } => triple,
            TargetDescriptor::Or1k => OR1K_TRIPLE,
        }
    }

    /// CPU feature names, e.g. `["mul", "div"]`.
    pub fn features(&self) -> &[&'static str] {
        match self {
            TargetDescriptor::Native { .. } => &[],
            TargetDescriptor::Or1k => OR1K_FEATURES,
        }
    }

    /// Symbol of the formatted print routine provided by the target.
    pub fn print_function(&self) -> &str {
        match self {
            TargetDescriptor::Native { .. } => DEFAULT_PRINT_FUNCTION,
            TargetDescriptor::Or1k => OR1K_PRINT_FUNCTION,
        }
    }

    /// Feature string handed to the backend. Bare names are enabled
    /// (`mul` becomes `+mul`); declared order is kept.
    pub fn feature_string(&self) -> String {
        self.features()
            .iter()
            .map(|feature| {
                if feature.starts_with('+') || feature.starts_with('-') {
                    feature.to_string()
                } else {
                    format!("+{}", feature)
                }
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for TargetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetDescriptor::Native { triple } => write!(f, "native ({})", triple),
            TargetDescriptor::Or1k => write!(f, "or1k ({})", OR1K_TRIPLE),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown target name `{0}` (expected `native` or `or1k`)")]
pub struct UnknownTargetName(pub String);

impl FromStr for TargetDescriptor {
    type Err = UnknownTargetName;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "native" => Ok(TargetDescriptor::native()),
            "or1k" | OR1K_TRIPLE => Ok(TargetDescriptor::or1k()),
            other => Err(UnknownTargetName(other.to_string())),
        }
    }
}
