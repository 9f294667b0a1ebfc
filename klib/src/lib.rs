//! Contains types for reading and writing compiled Kotlin library containers.
//!
//! A library packages a compiled module's pieces — linkage metadata, managed bitcode,
//! native bitcode, and resources — into a persistent artifact behind one logical contract,
//! with two physical layouts: a single self-contained bitcode file, or a directory tree
//! split by artifact kind. The bitcode format itself and the metadata wire format are
//! external collaborators, consumed through the seams in [`bitcode`] and [`metadata`].
//!
//! All operations are synchronous and blocking; the compiler driver is expected to
//! serialize access to each library path, one writer per output artifact.

pub mod bitcode;
pub mod config;
pub mod error;
pub mod layout;
pub mod link_data;
pub mod metadata;
pub mod reader;
pub mod writer;

pub use config::{LibraryConfig, Target};
pub use error::Error;
pub use link_data::LinkData;
pub use reader::{BitcodeLibraryReader, LibraryReader, SplitLibraryReader};
pub use writer::{BitcodeLibraryWriter, LibraryWriter, SplitLibraryWriter};
