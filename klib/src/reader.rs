//! Readers presenting a persisted library as a module descriptor plus bitcode paths,
//! uniformly over both container formats.
//!
//! A reader is bound to an existing path at construction and is immutable afterwards. The
//! table of contents and the module descriptor are computed on first access and memoized
//! (failures included) with [`lazy_init::Lazy`]; the layer is designed for single-threaded
//! driver use, though the one-time initialization makes a concurrent first access
//! well-defined.

use crate::config::LibraryConfig;
use crate::error::{Error, ErrorKind};
use crate::layout;
use crate::metadata::{MetadataReader, ModuleDeserializer, NamedModuleData, SplitMetadataReader};
use lazy_init::Lazy;
use std::fs;
use std::path::{Path, PathBuf};

/// Uniform view of a persisted library, regardless of its physical container format.
pub trait LibraryReader {
    type ModuleDescriptor;

    /// The backing path, verbatim.
    fn library_name(&self) -> &Path;

    /// The module's logical name, from the cached table of contents.
    fn module_name(&self) -> Result<&str, Error>;

    /// The fully deserialized module, built on first access by combining the cached table
    /// of contents with on-demand package fragment lookups.
    fn module_descriptor(&self) -> Result<&Self::ModuleDescriptor, Error>;

    /// Paths of every native or managed bitcode artifact to be linked.
    fn bitcode_paths(&self) -> Result<Vec<PathBuf>, Error>;
}

fn existing_path(path: PathBuf) -> Result<PathBuf, Error> {
    if path.exists() {
        Ok(path)
    } else {
        Err(ErrorKind::NotFound(path).into())
    }
}

fn deserialize_with<D, M>(
    deserializer: &D,
    metadata: &M,
    module: &NamedModuleData,
) -> Result<D::ModuleDescriptor, Error>
where
    D: ModuleDeserializer,
    M: MetadataReader,
{
    let mut fetch_fragment =
        |fq_name: &str| metadata.load_serialized_package_fragment(fq_name);
    deserializer
        .deserialize(&module.name, &module.base64, &mut fetch_fragment)
        .map_err(Error::from)
}

/// Reads a single-file library: one bitcode file whose custom sections, decoded by the
/// caller-supplied [`MetadataReader`], carry the linkage metadata.
pub struct BitcodeLibraryReader<M, D>
where
    M: MetadataReader,
    D: ModuleDeserializer,
    D::ModuleDescriptor: Sync,
{
    path: PathBuf,
    abi_version: u32,
    metadata: M,
    deserializer: D,
    named_module: Lazy<Result<NamedModuleData, Error>>,
    descriptor: Lazy<Result<D::ModuleDescriptor, Error>>,
}

impl<M, D> BitcodeLibraryReader<M, D>
where
    M: MetadataReader,
    D: ModuleDeserializer,
    D::ModuleDescriptor: Sync,
{
    /// Binds a reader to an existing bitcode file.
    ///
    /// Fails with [`ErrorKind::NotFound`] if `path` does not exist, constructing nothing.
    pub fn open<P: Into<PathBuf>>(
        path: P,
        abi_version: u32,
        metadata: M,
        deserializer: D,
    ) -> Result<Self, Error> {
        Ok(Self {
            path: existing_path(path.into())?,
            abi_version,
            metadata,
            deserializer,
            named_module: Lazy::new(),
            descriptor: Lazy::new(),
        })
    }

    fn named_module_data(&self) -> Result<&NamedModuleData, Error> {
        self.named_module
            .get_or_create(|| {
                self.metadata
                    .load_serialized_module(self.abi_version)
                    .map_err(Error::from)
            })
            .as_ref()
            .map_err(Error::clone)
    }
}

impl<M, D> LibraryReader for BitcodeLibraryReader<M, D>
where
    M: MetadataReader,
    D: ModuleDeserializer,
    D::ModuleDescriptor: Sync,
{
    type ModuleDescriptor = D::ModuleDescriptor;

    fn library_name(&self) -> &Path {
        &self.path
    }

    fn module_name(&self) -> Result<&str, Error> {
        Ok(&self.named_module_data()?.name)
    }

    fn module_descriptor(&self) -> Result<&Self::ModuleDescriptor, Error> {
        self.descriptor
            .get_or_create(|| {
                let module = self.named_module_data()?;
                deserialize_with(&self.deserializer, &self.metadata, module)
            })
            .as_ref()
            .map_err(Error::clone)
    }

    /// The backing file is the one and only bitcode artifact.
    fn bitcode_paths(&self) -> Result<Vec<PathBuf>, Error> {
        Ok(vec![self.path.clone()])
    }
}

/// Reads a split library: a directory tree with metadata under `linkdata/` and bitcode
/// under the target-qualified `kotlin/` and `native/` subdirectories.
pub struct SplitLibraryReader<D>
where
    D: ModuleDeserializer,
    D::ModuleDescriptor: Sync,
{
    path: PathBuf,
    config: LibraryConfig,
    metadata: SplitMetadataReader,
    deserializer: D,
    named_module: Lazy<Result<NamedModuleData, Error>>,
    descriptor: Lazy<Result<D::ModuleDescriptor, Error>>,
}

impl<D> SplitLibraryReader<D>
where
    D: ModuleDeserializer,
    D::ModuleDescriptor: Sync,
{
    /// Binds a reader to an existing library root directory.
    ///
    /// Fails with [`ErrorKind::NotFound`] if `path` does not exist, constructing nothing.
    pub fn open<P: Into<PathBuf>>(
        path: P,
        config: LibraryConfig,
        deserializer: D,
    ) -> Result<Self, Error> {
        let path = existing_path(path.into())?;
        Ok(Self {
            metadata: SplitMetadataReader::new(&path),
            path,
            config,
            deserializer,
            named_module: Lazy::new(),
            descriptor: Lazy::new(),
        })
    }

    fn named_module_data(&self) -> Result<&NamedModuleData, Error> {
        self.named_module
            .get_or_create(|| {
                self.metadata
                    .load_serialized_module(self.config.abi_version)
                    .map_err(Error::from)
            })
            .as_ref()
            .map_err(Error::clone)
    }
}

fn directory_paths(directory: &Path, paths: &mut Vec<PathBuf>) -> Result<(), Error> {
    for entry in fs::read_dir(directory)? {
        paths.push(entry?.path());
    }
    Ok(())
}

impl<D> LibraryReader for SplitLibraryReader<D>
where
    D: ModuleDeserializer,
    D::ModuleDescriptor: Sync,
{
    type ModuleDescriptor = D::ModuleDescriptor;

    fn library_name(&self) -> &Path {
        &self.path
    }

    fn module_name(&self) -> Result<&str, Error> {
        Ok(&self.named_module_data()?.name)
    }

    fn module_descriptor(&self) -> Result<&Self::ModuleDescriptor, Error> {
        self.descriptor
            .get_or_create(|| {
                let module = self.named_module_data()?;
                deserialize_with(&self.deserializer, &self.metadata, module)
            })
            .as_ref()
            .map_err(Error::clone)
    }

    /// Every entry under the target-qualified `kotlin/` directory, then every entry under
    /// `native/`. Within each directory, entries come in file-system order; callers must
    /// not rely on ordering beyond the grouping.
    fn bitcode_paths(&self) -> Result<Vec<PathBuf>, Error> {
        let mut paths = Vec::new();
        directory_paths(&layout::kotlin_directory(&self.path, &self.config.target), &mut paths)?;
        directory_paths(&layout::native_directory(&self.path, &self.config.target), &mut paths)?;
        Ok(paths)
    }
}
