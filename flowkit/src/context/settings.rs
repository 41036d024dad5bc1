// Serialization Settings
// Project, domain, version and image information used when compiling entities

use crate::config::ConfigError;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Name given to an image declared without an explicit name
pub const DEFAULT_IMAGE_NAME: &str = "default";

/// A container image reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Short name used to look the image up
    pub name: String,
    /// Fully qualified repository name
    pub fqn: String,
    pub tag: String,
}

impl Image {
    pub fn new(name: impl Into<String>, fqn: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fqn: fqn.into(),
            tag: tag.into(),
        }
    }

    /// Full image reference, `fqn:tag`
    pub fn full(&self) -> String {
        format!("{}:{}", self.fqn, self.tag)
    }

    /// Parse `name=fqn:tag` or `fqn:tag`
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        let (name, reference) = match spec.split_once('=') {
            Some((name, reference)) => (name.trim(), reference.trim()),
            None => (DEFAULT_IMAGE_NAME, spec.trim()),
        };

        if name.is_empty() {
            return Err(ConfigError::invalid_value(format!(
                "image '{}' has an empty name",
                spec
            )));
        }

        // The tag separator is the last ':' that is not part of a registry port
        let (fqn, tag) = reference
            .rsplit_once(':')
            .filter(|(fqn, tag)| !fqn.is_empty() && !tag.is_empty() && !tag.contains('/'))
            .ok_or_else(|| {
                ConfigError::invalid_value(format!("image '{}' must be of the form fqn:tag", spec))
                    .with_suggestion("use name=registry/repository:tag, e.g. default=ghcr.io/org/app:v1")
            })?;

        Ok(Self::new(name, fqn, tag))
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.full())
    }
}

/// Default image plus named alternatives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageConfig {
    pub default_image: Image,
    #[serde(default)]
    pub images: Vec<Image>,
}

impl ImageConfig {
    pub fn new(default_image: Image) -> Self {
        Self {
            default_image,
            images: Vec::new(),
        }
    }

    pub fn with_image(mut self, image: Image) -> Self {
        self.images.push(image);
        self
    }

    /// Find an image by name, including the default image
    pub fn find_image(&self, name: &str) -> Option<&Image> {
        std::iter::once(&self.default_image)
            .chain(self.images.iter())
            .find(|image| image.name == name)
    }
}

/// Settings for shipping code as a separate archive instead of baking it into the image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FastSerializationSettings {
    #[serde(default)]
    pub enabled: bool,
    /// Directory the archive is unpacked into inside the container
    #[serde(default)]
    pub destination_dir: Option<String>,
    /// Where the archive is fetched from
    #[serde(default)]
    pub distribution_location: Option<String>,
}

impl FastSerializationSettings {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }
}

/// Everything needed to turn an entity into a registrable template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializationSettings {
    pub project: String,
    pub domain: String,
    pub version: String,
    pub image_config: ImageConfig,
    /// Environment variables set on every container
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub fast_serialization_settings: FastSerializationSettings,
}

impl SerializationSettings {
    pub fn new(
        project: impl Into<String>,
        domain: impl Into<String>,
        version: impl Into<String>,
        image_config: ImageConfig,
    ) -> Self {
        Self {
            project: project.into(),
            domain: domain.into(),
            version: version.into(),
            image_config,
            env: BTreeMap::new(),
            fast_serialization_settings: FastSerializationSettings::default(),
        }
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_fast_serialization(mut self, settings: FastSerializationSettings) -> Self {
        self.fast_serialization_settings = settings;
        self
    }

    pub fn is_fast(&self) -> bool {
        self.fast_serialization_settings.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_full() {
        let image = Image::new("name", "image", "name");
        assert_eq!(image.full(), "image:name");
        assert_eq!(image.to_string(), "name=image:name");
    }

    #[test]
    fn test_parse_named_image() {
        let image = Image::parse("gpu=ghcr.io/org/app:v1").unwrap();
        assert_eq!(image, Image::new("gpu", "ghcr.io/org/app", "v1"));
    }

    #[test]
    fn test_parse_unnamed_image_with_registry_port() {
        let image = Image::parse("localhost:5000/app:latest").unwrap();
        assert_eq!(image.name, DEFAULT_IMAGE_NAME);
        assert_eq!(image.fqn, "localhost:5000/app");
        assert_eq!(image.tag, "latest");
    }

    #[test]
    fn test_parse_image_without_tag() {
        let err = Image::parse("localhost:5000/app").unwrap_err();
        assert!(err.message.contains("fqn:tag"));
        assert!(err.suggestion.is_some());

        assert!(Image::parse("=app:v1").is_err());
    }

    #[test]
    fn test_find_image() {
        let config = ImageConfig::new(Image::new("default", "app", "v1"))
            .with_image(Image::new("gpu", "app-gpu", "v1"));

        assert_eq!(config.find_image("default").map(|i| i.full()), Some("app:v1".to_string()));
        assert_eq!(config.find_image("gpu").map(|i| i.full()), Some("app-gpu:v1".to_string()));
        assert!(config.find_image("tpu").is_none());
    }
}
