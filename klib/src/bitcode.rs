//! The seam to the external native bitcode linker.

use std::fmt::Display;
use std::path::Path;

/// Parses, links, and serializes native bitcode modules.
///
/// The container layer never interprets bitcode itself; writers drive an implementation of
/// this trait, typically backed by LLVM. `Error` values are carried into this crate's
/// diagnostics verbatim, so implementations should surface the underlying linker message
/// rather than a generic failure.
pub trait BitcodeLinker {
    /// Handle to an in-memory bitcode module.
    type Module;
    type Error: Display;

    /// Parses the bitcode file at `path` into an in-memory module.
    fn parse_file(&self, path: &Path) -> Result<Self::Module, Self::Error>;

    /// Links `source` into `destination`, consuming `source`.
    fn link_modules(&self, destination: &mut Self::Module, source: Self::Module) -> Result<(), Self::Error>;

    /// Serializes `module` to the bitcode file at `path`.
    fn write_module_to_file(&self, module: &Self::Module, path: &Path) -> Result<(), Self::Error>;
}
