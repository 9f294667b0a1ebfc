//! The linkage metadata payload exchanged across the container boundary.

use rustc_hash::FxHashSet;

/// A list specifying the ways a [`LinkData`] payload can be malformed.
#[derive(Clone, Debug, thiserror::Error)]
#[non_exhaustive]
pub enum InvalidLinkDataError {
    #[error("expected {name_count} package fragments to match the fragment names, but got {fragment_count}")]
    FragmentCountMismatch { fragment_count: usize, name_count: usize },
    #[error("duplicate package fragment name {0:?}")]
    DuplicateFragmentName(String),
    /// Fragment names become file name components of the split format, so they must not
    /// contain path separators.
    #[error("package fragment name {0:?} contains a path separator")]
    InvalidFragmentName(String),
    /// The module name is persisted as a single line of the split format's table of
    /// contents file.
    #[error("module name {0:?} contains a line break")]
    InvalidModuleName(String),
}

/// The payload a library writer consumes and a library reader produces: an encoded table of
/// contents plus the encoded metadata of every package fragment in the module.
///
/// `fragments` and `fragment_names` are index aligned, so `fragments[i]` holds the metadata
/// of the package named by `fragment_names[i]`. The constructor is the only way to obtain a
/// value, which keeps the alignment and name uniqueness invariants from being broken after
/// construction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LinkData {
    module: String,
    module_name: String,
    fragments: Vec<String>,
    fragment_names: Vec<String>,
}

impl LinkData {
    pub fn new<N, M>(
        module_name: N,
        module: M,
        fragments: Vec<String>,
        fragment_names: Vec<String>,
    ) -> Result<Self, InvalidLinkDataError>
    where
        N: Into<String>,
        M: Into<String>,
    {
        if fragments.len() != fragment_names.len() {
            return Err(InvalidLinkDataError::FragmentCountMismatch {
                fragment_count: fragments.len(),
                name_count: fragment_names.len(),
            });
        }

        let module_name = module_name.into();
        if module_name.contains('\n') {
            return Err(InvalidLinkDataError::InvalidModuleName(module_name));
        }

        let mut seen = FxHashSet::default();
        for name in &fragment_names {
            if name.contains(|c| c == '/' || c == '\\') {
                return Err(InvalidLinkDataError::InvalidFragmentName(name.clone()));
            }
            if !seen.insert(name.as_str()) {
                return Err(InvalidLinkDataError::DuplicateFragmentName(name.clone()));
            }
        }

        Ok(Self {
            module: module.into(),
            module_name,
            fragments,
            fragment_names,
        })
    }

    /// The encoded table of contents for the whole module.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// The module's fully qualified logical name.
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn fragment_names(&self) -> &[String] {
        &self.fragment_names
    }

    /// Iterates `(fully qualified name, encoded metadata)` pairs in insertion order.
    pub fn fragments(&self) -> impl ExactSizeIterator<Item = (&str, &str)> {
        self.fragment_names
            .iter()
            .zip(&self.fragments)
            .map(|(name, fragment)| (name.as_str(), fragment.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_fragments_are_accepted() {
        let data = LinkData::new(
            "pkg.demo",
            "TOC==",
            vec!["AA==".to_string(), "BB==".to_string()],
            vec!["pkg.demo".to_string(), "pkg.demo.core".to_string()],
        )
        .unwrap();

        assert_eq!(data.fragments().len(), 2);
        assert_eq!(data.fragments().next(), Some(("pkg.demo", "AA==")));
    }

    #[test]
    fn fragment_count_mismatch_is_rejected() {
        let result = LinkData::new("pkg.demo", "TOC==", vec!["AA==".to_string()], Vec::new());
        assert!(matches!(
            result,
            Err(InvalidLinkDataError::FragmentCountMismatch {
                fragment_count: 1,
                name_count: 0,
            })
        ));
    }

    #[test]
    fn fragment_names_with_path_separators_are_rejected() {
        for name in ["../x", "a/b", "a\\b"] {
            let result = LinkData::new(
                "pkg.demo",
                "TOC==",
                vec!["AA==".to_string()],
                vec![name.to_string()],
            );
            assert!(matches!(
                result,
                Err(InvalidLinkDataError::InvalidFragmentName(n)) if n == name
            ));
        }
    }

    #[test]
    fn module_names_with_line_breaks_are_rejected() {
        let result = LinkData::new("pkg\ndemo", "TOC==", Vec::new(), Vec::new());
        assert!(matches!(
            result,
            Err(InvalidLinkDataError::InvalidModuleName(_))
        ));
    }

    #[test]
    fn duplicate_fragment_names_are_rejected() {
        let result = LinkData::new(
            "pkg.demo",
            "TOC==",
            vec!["AA==".to_string(), "BB==".to_string()],
            vec!["pkg.demo".to_string(), "pkg.demo".to_string()],
        );
        assert!(matches!(
            result,
            Err(InvalidLinkDataError::DuplicateFragmentName(name)) if name == "pkg.demo"
        ));
    }
}
