/// Pipeline configuration
///
/// All tunables live here and are injected into the components that need
/// them - the extension allowlist is handed to the classifier at
/// construction, never read from a global. The config is serialized to
/// JSON so users can edit it on disk.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the asset pipeline
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Extensions catalogued as images (lowercase, no dot)
    pub image_extensions: Vec<String>,
    /// Extensions catalogued as audio
    pub audio_extensions: Vec<String>,
    /// Extensions catalogued as 3D models
    pub model_extensions: Vec<String>,
    /// Extensions catalogued as configuration files
    pub config_extensions: Vec<String>,
    /// Extensions catalogued as scripts
    pub script_extensions: Vec<String>,
    /// Milliseconds to wait after a change notification before reading
    /// the file, so writers have a chance to finish flushing
    pub settle_delay_ms: u64,
    /// Number of watcher worker tasks
    pub worker_count: usize,
    /// Explicit catalog database path (None = user data directory)
    pub database_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    /// Create the default configuration (stock allowlist, 500ms settle)
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            image_extensions: strings(&["png", "bmp", "jpg", "jpeg", "gif", "tga"]),
            audio_extensions: strings(&["wav", "mp3", "ogg", "flac"]),
            model_extensions: strings(&["obj", "fbx", "gltf", "glb"]),
            config_extensions: strings(&["json", "toml", "ini", "yaml"]),
            script_extensions: strings(&["lua", "wren", "glsl"]),
            settle_delay_ms: 500,
            worker_count: 4,
            database_path: None,
        }
    }
}

impl PipelineConfig {
    /// Convert to JSON string for storage
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load the configuration from the user config file, falling back to
    /// defaults when the file is missing or unparseable
    pub fn load() -> Self {
        let path = Self::config_path();
        match std::fs::read_to_string(&path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("⚠️  Ignoring malformed config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Get the path where the configuration is stored
    ///
    /// - Linux: ~/.local/share/asset-pipeline/asset-pipeline.json
    /// - macOS: ~/Library/Application Support/asset-pipeline/asset-pipeline.json
    /// - Windows: %APPDATA%\asset-pipeline\asset-pipeline.json
    pub fn config_path() -> PathBuf {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        path.push("asset-pipeline");
        path.push("asset-pipeline.json");
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allowlist_covers_all_categories() {
        let config = PipelineConfig::default();
        assert!(config.image_extensions.iter().any(|e| e == "png"));
        assert!(config.audio_extensions.iter().any(|e| e == "wav"));
        assert!(config.model_extensions.iter().any(|e| e == "obj"));
        assert!(config.config_extensions.iter().any(|e| e == "json"));
        assert!(config.script_extensions.iter().any(|e| e == "lua"));
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut config = PipelineConfig::default();
        config.settle_delay_ms = 250;
        config.image_extensions.push("webp".to_string());

        let json = config.to_json().unwrap();
        let restored = PipelineConfig::from_json(&json).unwrap();

        assert_eq!(config, restored);
    }
}
