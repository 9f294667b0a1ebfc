//! Pure helpers deriving the split container format's fixed sub-paths.
//!
//! Both the reader and the writer derive every path through these functions, which is what
//! guarantees the two sides agree on the layout. Relative to a library root `R` and a
//! target `T`:
//!
//! ```text
//! R/manifest                      properties, currently the metadata ABI version
//! R/resources/                    opaque passthrough assets
//! R/linkdata/module.knm           table of contents
//! R/linkdata/package_<fq>.knm     one file per package fragment
//! R/T/kotlin/program.kt.bc        managed bitcode, fixed name
//! R/T/native/<basename>...        copied native bitcode files
//! ```

use crate::config::Target;
use std::path::{Path, PathBuf};

/// File name of the managed bitcode inside the target-qualified `kotlin` directory.
pub const KOTLIN_BITCODE_FILE_NAME: &str = "program.kt.bc";

/// File name of the library manifest at the library root.
pub const MANIFEST_FILE_NAME: &str = "manifest";

const TABLE_OF_CONTENTS_FILE_NAME: &str = "module.knm";

pub fn target_directory(root: &Path, target: &Target) -> PathBuf {
    root.join(target.as_str())
}

pub fn kotlin_directory(root: &Path, target: &Target) -> PathBuf {
    target_directory(root, target).join("kotlin")
}

pub fn native_directory(root: &Path, target: &Target) -> PathBuf {
    target_directory(root, target).join("native")
}

pub fn link_data_directory(root: &Path) -> PathBuf {
    root.join("linkdata")
}

pub fn resources_directory(root: &Path) -> PathBuf {
    root.join("resources")
}

pub fn manifest_file(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILE_NAME)
}

pub fn kotlin_bitcode_file(root: &Path, target: &Target) -> PathBuf {
    kotlin_directory(root, target).join(KOTLIN_BITCODE_FILE_NAME)
}

pub fn table_of_contents_file(link_data_directory: &Path) -> PathBuf {
    link_data_directory.join(TABLE_OF_CONTENTS_FILE_NAME)
}

/// Path of the encoded metadata file for one package fragment.
///
/// The `package_` prefix keeps fragment files disjoint from the table of contents file for
/// every fully qualified name, including the empty name of the root package.
pub fn package_fragment_file(link_data_directory: &Path, fq_name: &str) -> PathBuf {
    link_data_directory.join(format!("package_{}.knm", fq_name))
}
