//! The metadata codec seam and the split format's file-based codec.
//!
//! The single-file format stores its encoded metadata in custom sections of the bitcode
//! file, behind a codec implemented outside this crate and plugged in through
//! [`MetadataReader`] and [`MetadataGenerator`]. The split format's codec is just the
//! `linkdata/` file layout, so [`SplitMetadataReader`] and [`SplitMetadataGenerator`] live
//! here.
//!
//! Version compatibility is owned by the codec: [`MetadataReader::load_serialized_module`]
//! receives the ABI version the compiler accepts and fails before producing any metadata
//! when the library was written with another one.

use crate::error::CodecError;
use crate::layout;
use crate::link_data::LinkData;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A module's name together with its encoded table of contents, produced once per reader
/// and cached for the reader's lifetime.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NamedModuleData {
    pub name: String,
    pub base64: String,
}

/// Decodes persisted linkage metadata.
pub trait MetadataReader {
    /// Loads the module's name and encoded table of contents, verifying that the metadata
    /// was produced for `abi_version`.
    fn load_serialized_module(&self, abi_version: u32) -> Result<NamedModuleData, CodecError>;

    /// Loads the encoded metadata of the package fragment named by `fq_name`.
    fn load_serialized_package_fragment(&self, fq_name: &str) -> Result<String, CodecError>;
}

/// Encodes linkage metadata into an in-memory bitcode module's custom sections.
///
/// Only the single-file container format uses this seam; nothing reaches disk until the
/// owning writer commits.
pub trait MetadataGenerator {
    type Module;

    fn add_link_data(&self, module: &mut Self::Module, link_data: &LinkData) -> Result<(), CodecError>;
}

/// Callback handed to a [`ModuleDeserializer`] to fetch one package fragment's encoded
/// metadata by fully qualified name.
pub type FragmentFetcher<'a> = dyn FnMut(&str) -> Result<String, CodecError> + 'a;

/// Reconstructs the compiler's in-memory module descriptor from encoded metadata.
///
/// Fragments are fetched one at a time through the callback, which is what allows large
/// modules to be loaded partially.
pub trait ModuleDeserializer {
    type ModuleDescriptor;

    fn deserialize(
        &self,
        module_name: &str,
        table_of_contents: &str,
        fetch_fragment: &mut FragmentFetcher<'_>,
    ) -> Result<Self::ModuleDescriptor, CodecError>;
}

/// The error type used when a split library's metadata was written for another ABI version.
#[derive(Clone, Debug, thiserror::Error)]
#[error("expected metadata ABI version {expected}, but the library was written with version {found}")]
pub struct AbiVersionMismatchError {
    expected: u32,
    found: u32,
}

impl AbiVersionMismatchError {
    pub fn expected(&self) -> u32 {
        self.expected
    }

    pub fn found(&self) -> u32 {
        self.found
    }
}

/// The error type used when a split library's metadata files do not have the expected shape.
#[derive(Clone, Debug, thiserror::Error)]
#[error("malformed metadata in {path:?}: {reason}")]
pub struct MalformedMetadataError {
    path: PathBuf,
    reason: &'static str,
}

impl MalformedMetadataError {
    fn new(path: PathBuf, reason: &'static str) -> Self {
        Self { path, reason }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The error type used when a split library's metadata file cannot be read or written.
#[derive(Debug, thiserror::Error)]
#[error("could not access metadata file {path:?}")]
pub struct MetadataFileError {
    path: PathBuf,
    #[source]
    source: io::Error,
}

impl MetadataFileError {
    fn new(path: PathBuf, source: io::Error) -> Self {
        Self { path, source }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

const ABI_VERSION_KEY: &str = "abi_version";

fn read_metadata_file(path: PathBuf) -> Result<String, CodecError> {
    match fs::read_to_string(&path) {
        Ok(contents) => Ok(contents),
        Err(source) => Err(CodecError::new(MetadataFileError::new(path, source))),
    }
}

/// Reads the split format's metadata: the manifest at the library root plus the files under
/// `linkdata/`.
#[derive(Clone, Debug)]
pub struct SplitMetadataReader {
    manifest: PathBuf,
    link_data_directory: PathBuf,
}

impl SplitMetadataReader {
    pub fn new(library_root: &Path) -> Self {
        Self {
            manifest: layout::manifest_file(library_root),
            link_data_directory: layout::link_data_directory(library_root),
        }
    }

    fn load_abi_version(&self) -> Result<u32, CodecError> {
        let contents = read_metadata_file(self.manifest.clone())?;
        let malformed =
            |reason| CodecError::new(MalformedMetadataError::new(self.manifest.clone(), reason));

        let value = contents
            .lines()
            .filter_map(|line| line.split_once('='))
            .find(|(key, _)| key.trim() == ABI_VERSION_KEY)
            .map(|(_, value)| value.trim())
            .ok_or_else(|| malformed("missing abi_version property"))?;

        value.parse().map_err(|_| malformed("abi_version is not an integer"))
    }
}

impl MetadataReader for SplitMetadataReader {
    fn load_serialized_module(&self, abi_version: u32) -> Result<NamedModuleData, CodecError> {
        let found = self.load_abi_version()?;
        if found != abi_version {
            return Err(CodecError::new(AbiVersionMismatchError {
                expected: abi_version,
                found,
            }));
        }

        let path = layout::table_of_contents_file(&self.link_data_directory);
        let contents = read_metadata_file(path.clone())?;
        match contents.split_once('\n') {
            Some((name, base64)) if !name.is_empty() => Ok(NamedModuleData {
                name: name.to_string(),
                base64: base64.to_string(),
            }),
            _ => Err(CodecError::new(MalformedMetadataError::new(
                path,
                "expected a module name line followed by the encoded table of contents",
            ))),
        }
    }

    fn load_serialized_package_fragment(&self, fq_name: &str) -> Result<String, CodecError> {
        read_metadata_file(layout::package_fragment_file(&self.link_data_directory, fq_name))
    }
}

/// Writes the split format's metadata files; the counterpart of [`SplitMetadataReader`].
#[derive(Clone, Debug)]
pub struct SplitMetadataGenerator {
    manifest: PathBuf,
    link_data_directory: PathBuf,
    abi_version: u32,
}

impl SplitMetadataGenerator {
    pub fn new(library_root: &Path, abi_version: u32) -> Self {
        Self {
            manifest: layout::manifest_file(library_root),
            link_data_directory: layout::link_data_directory(library_root),
            abi_version,
        }
    }

    /// Persists the manifest, the table of contents, and one file per package fragment.
    pub fn add_link_data(&self, link_data: &LinkData) -> io::Result<()> {
        fs::write(
            &self.manifest,
            format!("{} = {}\n", ABI_VERSION_KEY, self.abi_version),
        )?;

        fs::write(
            layout::table_of_contents_file(&self.link_data_directory),
            format!("{}\n{}", link_data.module_name(), link_data.module()),
        )?;

        for (fq_name, fragment) in link_data.fragments() {
            fs::write(
                layout::package_fragment_file(&self.link_data_directory, fq_name),
                fragment,
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_link_data() -> LinkData {
        LinkData::new(
            "pkg.demo",
            "TOC==",
            vec!["ABC==".to_string()],
            vec!["pkg.demo.core".to_string()],
        )
        .unwrap()
    }

    fn written_library(abi_version: u32) -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(layout::link_data_directory(root.path())).unwrap();
        SplitMetadataGenerator::new(root.path(), abi_version)
            .add_link_data(&sample_link_data())
            .unwrap();
        root
    }

    #[test]
    fn serialized_module_round_trips() {
        let root = written_library(1);
        let reader = SplitMetadataReader::new(root.path());

        let module = reader.load_serialized_module(1).unwrap();
        assert_eq!(module.name, "pkg.demo");
        assert_eq!(module.base64, "TOC==");
        assert_eq!(
            reader.load_serialized_package_fragment("pkg.demo.core").unwrap(),
            "ABC=="
        );
    }

    #[test]
    fn abi_version_mismatch_is_detected_before_any_metadata_is_read() {
        let root = written_library(1);
        let error = SplitMetadataReader::new(root.path())
            .load_serialized_module(2)
            .unwrap_err();

        let mismatch = error
            .into_inner()
            .downcast::<AbiVersionMismatchError>()
            .unwrap();
        assert_eq!(mismatch.expected(), 2);
        assert_eq!(mismatch.found(), 1);
    }

    #[test]
    fn missing_fragment_is_an_error() {
        let root = written_library(1);
        let reader = SplitMetadataReader::new(root.path());
        assert!(reader.load_serialized_package_fragment("pkg.absent").is_err());
    }

    #[test]
    fn garbled_manifest_is_malformed() {
        let root = written_library(1);
        fs::write(layout::manifest_file(root.path()), "abi_version = soon\n").unwrap();

        let error = SplitMetadataReader::new(root.path())
            .load_serialized_module(1)
            .unwrap_err();
        assert!(error.into_inner().downcast::<MalformedMetadataError>().is_ok());
    }
}
