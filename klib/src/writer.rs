//! Writers accumulating a module's output artifacts and persisting them per container
//! format.
//!
//! A writer is bound to its destination at construction and finalized exactly once;
//! [`LibraryWriter::commit`] consumes the writer, so reuse after commit is rejected at
//! compile time. The order of `add_*` calls is otherwise unconstrained.

use crate::bitcode::BitcodeLinker;
use crate::config::LibraryConfig;
use crate::error::{BitcodeError, Error, LinkError};
use crate::layout;
use crate::link_data::LinkData;
use crate::metadata::{MetadataGenerator, SplitMetadataGenerator};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Accumulates a compiled module's artifacts for one output library.
pub trait LibraryWriter {
    /// Handle to the managed-code bitcode module produced by the compiler.
    type BitcodeModule;

    /// Encodes and persists the table of contents plus every package fragment.
    fn add_link_data(&mut self, link_data: &LinkData) -> Result<(), Error>;

    /// Incorporates an externally produced native bitcode file.
    fn add_native_bitcode(&mut self, path: &Path) -> Result<(), Error>;

    /// Incorporates the compiler's own managed-code bitcode module.
    fn add_kotlin_bitcode(&mut self, module: &Self::BitcodeModule) -> Result<(), Error>;

    /// Finalizes the artifact, consuming the writer.
    fn commit(self) -> Result<(), Error>;
}

/// Writes a single-file library: the bitcode module is the container, carrying the linkage
/// metadata in custom sections, and nothing reaches disk before [`commit`].
///
/// The module handle is passed in explicitly at construction and owned by the writer for
/// its whole lifetime.
///
/// [`commit`]: LibraryWriter::commit
pub struct BitcodeLibraryWriter<L, G>
where
    L: BitcodeLinker,
    G: MetadataGenerator<Module = L::Module>,
{
    path: PathBuf,
    linker: L,
    generator: G,
    module: L::Module,
}

impl<L, G> BitcodeLibraryWriter<L, G>
where
    L: BitcodeLinker,
    G: MetadataGenerator<Module = L::Module>,
{
    pub fn new<P: Into<PathBuf>>(path: P, linker: L, generator: G, module: L::Module) -> Self {
        Self {
            path: path.into(),
            linker,
            generator,
            module,
        }
    }
}

impl<L, G> LibraryWriter for BitcodeLibraryWriter<L, G>
where
    L: BitcodeLinker,
    G: MetadataGenerator<Module = L::Module>,
{
    type BitcodeModule = L::Module;

    fn add_link_data(&mut self, link_data: &LinkData) -> Result<(), Error> {
        self.generator
            .add_link_data(&mut self.module, link_data)
            .map_err(Error::from)
    }

    /// Parses `path` and links it into the in-memory module. Parse and link failures both
    /// surface as [`LinkError`] carrying the offending path and the linker's diagnostic.
    fn add_native_bitcode(&mut self, path: &Path) -> Result<(), Error> {
        let parsed = self
            .linker
            .parse_file(path)
            .map_err(|e| LinkError::new(path.to_path_buf(), e))?;
        self.linker
            .link_modules(&mut self.module, parsed)
            .map_err(|e| LinkError::new(path.to_path_buf(), e))?;
        Ok(())
    }

    /// A no-op: the module handed to the constructor is the container itself.
    fn add_kotlin_bitcode(&mut self, _module: &Self::BitcodeModule) -> Result<(), Error> {
        Ok(())
    }

    /// Serializes the in-memory module to the backing path. This is the single point at
    /// which the artifact becomes durable.
    fn commit(self) -> Result<(), Error> {
        self.linker
            .write_module_to_file(&self.module, &self.path)
            .map_err(|e| BitcodeError::new(e).into())
    }
}

/// Writes a split library: a directory tree populated one file at a time.
///
/// Construction is destructive: any pre-existing contents at the destination path are
/// deleted before the empty tree is created. Never point a writer at a path an in-flight
/// reader is still consulting. Writes are not atomic across operations; a crash
/// mid-sequence leaves a partially populated directory.
pub struct SplitLibraryWriter<L: BitcodeLinker> {
    root: PathBuf,
    config: LibraryConfig,
    linker: L,
    generator: SplitMetadataGenerator,
}

impl<L: BitcodeLinker> SplitLibraryWriter<L> {
    /// Replaces whatever is at `root` with the empty split layout: `linkdata/`,
    /// `resources/`, and the target-qualified `kotlin/` and `native/` directories.
    pub fn create<P: Into<PathBuf>>(root: P, config: LibraryConfig, linker: L) -> Result<Self, Error> {
        let root = root.into();
        match fs::remove_dir_all(&root) {
            Ok(()) => (),
            Err(e) if e.kind() == io::ErrorKind::NotFound => (),
            // a pre-existing regular file at the destination is replaced like any tree
            Err(_) => fs::remove_file(&root)?,
        }
        fs::create_dir_all(layout::kotlin_directory(&root, &config.target))?;
        fs::create_dir(layout::native_directory(&root, &config.target))?;
        fs::create_dir(layout::link_data_directory(&root))?;
        fs::create_dir(layout::resources_directory(&root))?;

        Ok(Self {
            generator: SplitMetadataGenerator::new(&root, config.abi_version),
            root,
            config,
            linker,
        })
    }
}

impl<L: BitcodeLinker> LibraryWriter for SplitLibraryWriter<L> {
    type BitcodeModule = L::Module;

    fn add_link_data(&mut self, link_data: &LinkData) -> Result<(), Error> {
        self.generator.add_link_data(link_data).map_err(Error::from)
    }

    /// Copies the file byte-for-byte into `native/` under its base name, overwriting any
    /// existing file of that name.
    fn add_native_bitcode(&mut self, path: &Path) -> Result<(), Error> {
        let basename = path.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("bitcode path {:?} has no file name", path),
            )
        })?;
        let destination = layout::native_directory(&self.root, &self.config.target).join(basename);
        fs::copy(path, destination)?;
        Ok(())
    }

    /// Serializes the module to the fixed path under the target-qualified `kotlin/`
    /// directory.
    fn add_kotlin_bitcode(&mut self, module: &Self::BitcodeModule) -> Result<(), Error> {
        let path = layout::kotlin_bitcode_file(&self.root, &self.config.target);
        self.linker
            .write_module_to_file(module, &path)
            .map_err(|e| BitcodeError::new(e).into())
    }

    /// A no-op: every prior call already wrote its own files.
    fn commit(self) -> Result<(), Error> {
        Ok(())
    }
}
