//! Resource locators naming loadable model files.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Path or URL of a loadable model. Immutable; a new model is always a new
/// locator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceLocator(String);

impl ResourceLocator {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    /// `{dir}/{name}` with exactly one separator between the two.
    pub fn in_directory(dir: &str, name: &str) -> Self {
        Self(format!(
            "{}/{}",
            dir.trim_end_matches('/'),
            name.trim_start_matches('/')
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment, e.g. `sofa.glb` for `/static/models/sofa.glb`.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// File extension of the last segment, lowercased.
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name();
        name.rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}

impl fmt::Display for ResourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceLocator {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ResourceLocator {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ResourceLocator {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_directory_joins_once() {
        assert_eq!(
            ResourceLocator::in_directory("/static/models/", "/sofa.glb").as_str(),
            "/static/models/sofa.glb"
        );
        assert_eq!(
            ResourceLocator::in_directory("/static/models", "chair.gltf").as_str(),
            "/static/models/chair.gltf"
        );
    }

    #[test]
    fn test_file_name_and_extension() {
        let loc = ResourceLocator::new("/static/models/Sofa.GLB");
        assert_eq!(loc.file_name(), "Sofa.GLB");
        assert_eq!(loc.extension().as_deref(), Some("glb"));

        let bare = ResourceLocator::new("model");
        assert_eq!(bare.file_name(), "model");
        assert_eq!(bare.extension(), None);
    }
}
