//! Viewer configuration.
//!
//! Every field has a default matching the stock web client, so an empty
//! JSON object (or no file at all) yields a working setup.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::resource::ResourceLocator;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Shown when nothing has been persisted yet.
    pub default_model: ResourceLocator,
    /// Directory existing models are selected from by name.
    pub model_dir: String,
    /// Key of the last displayed locator in session storage.
    pub storage_key: String,
    pub api: ApiConfig,
    pub camera: CameraConfig,
    pub upload: UploadLimits,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            default_model: ResourceLocator::new("/static/models/sofa.glb"),
            model_dir: "/static/models".to_string(),
            storage_key: "currentModelUrl".to_string(),
            api: ApiConfig::default(),
            camera: CameraConfig::default(),
            upload: UploadLimits::default(),
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Server endpoints. An empty `base_url` means same origin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub upload_path: String,
    pub customize_path: String,
    pub list_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            upload_path: "/api/upload-model".to_string(),
            customize_path: "/api/customize-model".to_string(),
            list_path: "/api/list-models".to_string(),
        }
    }
}

impl ApiConfig {
    pub fn upload_url(&self) -> String {
        self.join(&self.upload_path)
    }

    pub fn customize_url(&self) -> String {
        self.join(&self.customize_path)
    }

    pub fn list_url(&self) -> String {
        self.join(&self.list_path)
    }

    fn join(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Initial distance from the orbit target
    pub distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub zoom_step: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
            distance: 5.0,
            min_distance: 2.0,
            max_distance: 10.0,
            zoom_step: 0.5,
        }
    }
}

/// Client-side copy of the server's upload rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadLimits {
    pub allowed_extensions: Vec<String>,
    pub max_bytes: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            allowed_extensions: vec!["glb".to_string(), "gltf".to_string()],
            max_bytes: 16 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_gives_defaults() {
        let config: ViewerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.default_model.as_str(), "/static/models/sofa.glb");
        assert_eq!(config.camera.min_distance, 2.0);
        assert_eq!(config.camera.max_distance, 10.0);
    }

    #[test]
    fn test_partial_override() {
        let config: ViewerConfig =
            serde_json::from_str(r#"{"camera": {"zoom_step": 1.0}, "api": {"base_url": "http://localhost:5000/"}}"#)
                .unwrap();
        assert_eq!(config.camera.zoom_step, 1.0);
        assert_eq!(config.camera.fov_y_degrees, 45.0);
        assert_eq!(config.api.upload_url(), "http://localhost:5000/api/upload-model");
        assert_eq!(config.api.list_url(), "http://localhost:5000/api/list-models");
    }

    #[test]
    fn test_save_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.json");

        let mut config = ViewerConfig::default();
        config.model_dir = "/assets".to_string();
        config.save(&path).unwrap();

        let loaded = ViewerConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ViewerConfig::load(Path::new("/nonexistent/viewer.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
