//! Target identification and the configuration read by the container layer.
//!
//! Readers and writers receive a [`LibraryConfig`] carrying only the fields this layer
//! actually consults, rather than the whole compiler configuration.

use std::fmt::{Debug, Display, Formatter};

/// The error type used when a string is not a valid target identifier.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{identifier:?} is not a valid target identifier")]
pub struct InvalidTargetError {
    identifier: String,
}

impl InvalidTargetError {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// Identifies the compilation target a library's bitcode was produced for.
///
/// The identifier names a subdirectory of the split container format, so it is restricted
/// to non-empty ASCII lowercase alphanumerics and underscores.
#[derive(Clone, Eq, Hash, PartialEq)]
#[repr(transparent)]
pub struct Target(String);

impl Target {
    pub fn new<S: Into<String>>(identifier: S) -> Result<Self, InvalidTargetError> {
        let identifier = identifier.into();
        let valid = !identifier.is_empty()
            && identifier
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
        if valid {
            Ok(Self(identifier))
        } else {
            Err(InvalidTargetError { identifier })
        }
    }

    /// The target corresponding to the host this compiler was built for.
    pub fn host() -> Self {
        let arch = match std::env::consts::ARCH {
            "x86_64" => "x64",
            "aarch64" => "arm64",
            other => other,
        };
        Self(format!("{}_{}", std::env::consts::OS, arch))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Target {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Debug for Target {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::str::FromStr for Target {
    type Err = InvalidTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// The subset of the compiler configuration consulted by the container layer.
#[derive(Clone, Debug)]
pub struct LibraryConfig {
    /// The metadata ABI version this compiler produces and accepts.
    pub abi_version: u32,
    /// The compilation target used to qualify the split format's bitcode subtree.
    pub target: Target,
}

impl LibraryConfig {
    pub fn new(abi_version: u32, target: Target) -> Self {
        Self { abi_version, target }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_identifiers_are_accepted() {
        for identifier in ["linux_x64", "wasm32", "macos_arm64"] {
            assert_eq!(Target::new(identifier).unwrap().as_str(), identifier);
        }
    }

    #[test]
    fn invalid_identifiers_are_rejected() {
        for identifier in ["", "Linux", "a/b", "..", "linux x64"] {
            assert!(Target::new(identifier).is_err());
        }
    }

    #[test]
    fn host_target_is_valid() {
        assert!(Target::new(Target::host().as_str()).is_ok());
    }
}
