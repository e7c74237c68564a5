/// Extension classifier
///
/// Pure lookup from a file extension to (supported, category, MIME hint).
/// The allowlist comes from the injected configuration, never from a
/// process-wide constant, so two pipelines can run with different rules.

use crate::config::PipelineConfig;
use crate::state::data::AssetCategory;
use std::collections::HashMap;

/// Result of classifying one extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Whether the pipeline processes this extension at all
    pub supported: bool,
    /// Category the asset would be catalogued under
    pub category: AssetCategory,
    /// Best-effort MIME hint for the query layer
    pub mime_hint: &'static str,
}

/// Maps file extensions to categories and MIME hints
#[derive(Debug, Clone)]
pub struct Classifier {
    allowlist: HashMap<String, AssetCategory>,
}

impl Classifier {
    /// Build a classifier from the configured allowlist
    ///
    /// Extensions are normalized to lowercase once here so every later
    /// lookup is a plain map hit.
    pub fn new(config: &PipelineConfig) -> Self {
        let mut allowlist = HashMap::new();
        let mut add = |extensions: &[String], category: AssetCategory| {
            for ext in extensions {
                allowlist.insert(ext.to_lowercase(), category);
            }
        };
        add(&config.image_extensions, AssetCategory::Image);
        add(&config.audio_extensions, AssetCategory::Audio);
        add(&config.model_extensions, AssetCategory::Model);
        add(&config.config_extensions, AssetCategory::Config);
        add(&config.script_extensions, AssetCategory::Script);

        Classifier { allowlist }
    }

    /// Classify a file extension (with or without the leading dot)
    ///
    /// Case-insensitive. Anything outside the allowlist comes back as
    /// Other / unsupported.
    pub fn classify(&self, extension: &str) -> Classification {
        let ext = extension.trim_start_matches('.').to_lowercase();

        match self.allowlist.get(ext.as_str()) {
            Some(&category) => Classification {
                supported: true,
                category,
                mime_hint: mime_hint_for(&ext, category),
            },
            None => Classification {
                supported: false,
                category: AssetCategory::Other,
                mime_hint: "application/octet-stream",
            },
        }
    }

    /// Check whether an extension is supported without building the full
    /// classification
    pub fn is_supported(&self, extension: &str) -> bool {
        let ext = extension.trim_start_matches('.').to_lowercase();
        self.allowlist.contains_key(ext.as_str())
    }
}

/// Best-effort MIME hint for a known extension
fn mime_hint_for(ext: &str, category: AssetCategory) -> &'static str {
    match ext {
        "png" => "image/png",
        "bmp" => "image/bmp",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "tga" => "image/x-tga",
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "gltf" | "glb" => "model/gltf-binary",
        "json" => "application/json",
        "toml" | "ini" | "yaml" => "text/plain",
        _ => match category {
            // Custom extension added through the config - fall back to
            // something generic per category
            AssetCategory::Image => "image/*",
            AssetCategory::Audio => "audio/*",
            AssetCategory::Model => "model/*",
            AssetCategory::Config | AssetCategory::Script => "text/plain",
            AssetCategory::Other => "application/octet-stream",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new(&PipelineConfig::default())
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        let c = classifier();
        assert_eq!(c.classify("PNG"), c.classify("png"));
        assert_eq!(c.classify(".WaV").category, AssetCategory::Audio);
    }

    #[test]
    fn test_unsupported_extension_is_other() {
        let result = classifier().classify("tmp");
        assert!(!result.supported);
        assert_eq!(result.category, AssetCategory::Other);
        assert_eq!(result.mime_hint, "application/octet-stream");
    }

    #[test]
    fn test_known_extensions_map_to_categories() {
        let c = classifier();
        assert_eq!(c.classify("png").category, AssetCategory::Image);
        assert_eq!(c.classify("mp3").category, AssetCategory::Audio);
        assert_eq!(c.classify("fbx").category, AssetCategory::Model);
        assert_eq!(c.classify("toml").category, AssetCategory::Config);
        assert_eq!(c.classify("lua").category, AssetCategory::Script);
    }

    #[test]
    fn test_config_injection_changes_allowlist() {
        let mut config = PipelineConfig::default();
        config.image_extensions.push("webp".to_string());
        let c = Classifier::new(&config);

        assert!(c.is_supported("webp"));
        assert!(!classifier().is_supported("webp"));
    }

    #[test]
    fn test_mime_hints() {
        let c = classifier();
        assert_eq!(c.classify("png").mime_hint, "image/png");
        assert_eq!(c.classify("jpeg").mime_hint, "image/jpeg");
        assert_eq!(c.classify("json").mime_hint, "application/json");
    }
}
