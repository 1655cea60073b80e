//! Synchronizer configuration, read from JSON.
//!
//! Every section is optional; missing fields take the defaults below.

use std::fmt;
use std::fs;
use std::path::Path;

use convert::{
    ClusterConverter, DEFAULT_CLUSTER_FONT, DEFAULT_MAX_STOREYS, DEFAULT_PREFIX, FeatureConverter,
    HeightPolicy, PropertyKeys,
};
use scene::Capabilities;
use serde::{Deserialize, Serialize};

use crate::engine::LayerSynchronizer;
use crate::lod::{DEFAULT_MAX_LEVEL, LEVEL_LIMIT, LodOptions, LodReference};
use crate::raster::{RasterSynchronizer, RasterTarget};
use crate::vector::{VectorSynchronizer, VectorTarget};

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "I/O error: {err}"),
            ConfigError::Parse(err) => write!(f, "config parse error: {err}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilitiesConfig {
    pub ground_polylines: bool,
    pub classification_primitives: bool,
    pub ground_primitive_materials: bool,
}

impl Default for CapabilitiesConfig {
    fn default() -> Self {
        let caps = Capabilities::default();
        Self {
            ground_polylines: caps.ground_polylines,
            classification_primitives: caps.classification_primitives,
            ground_primitive_materials: caps.ground_primitive_materials,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertiesConfig {
    /// Prefix of the recognised feature and layer property keys.
    pub prefix: String,
}

impl Default for PropertiesConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightConfig {
    /// Storey counts above this fall back to a plain extrusion.
    pub max_storeys: u32,
}

impl Default for HeightConfig {
    fn default() -> Self {
        Self {
            max_storeys: DEFAULT_MAX_STOREYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodConfig {
    pub max_level: u32,
    pub reference: LodReference,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            max_level: DEFAULT_MAX_LEVEL,
            reference: LodReference::Coarsest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub minimum_cluster_size: usize,
    pub default_font: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            minimum_cluster_size: 2,
            default_font: DEFAULT_CLUSTER_FONT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub capabilities: CapabilitiesConfig,
    pub properties: PropertiesConfig,
    pub height: HeightConfig,
    pub lod: LodConfig,
    pub cluster: ClusterConfig,
}

impl SyncConfig {
    pub fn from_json_str(payload: &str) -> Result<Self, ConfigError> {
        let config: SyncConfig = serde_json::from_str(payload).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let payload = fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&payload)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lod.max_level == 0 || self.lod.max_level > LEVEL_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "lod.max_level must be within 1..={LEVEL_LIMIT}, got {}",
                self.lod.max_level
            )));
        }
        if self.cluster.minimum_cluster_size < 2 {
            return Err(ConfigError::Invalid(format!(
                "cluster.minimum_cluster_size must be at least 2, got {}",
                self.cluster.minimum_cluster_size
            )));
        }
        if self.properties.prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(format!(
                "properties.prefix contains whitespace: {:?}",
                self.properties.prefix
            )));
        }
        Ok(())
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            ground_polylines: self.capabilities.ground_polylines,
            classification_primitives: self.capabilities.classification_primitives,
            ground_primitive_materials: self.capabilities.ground_primitive_materials,
        }
    }

    pub fn property_keys(&self) -> PropertyKeys {
        PropertyKeys::new(self.properties.prefix.clone())
    }

    pub fn feature_converter(&self) -> FeatureConverter {
        let height = HeightPolicy::new(self.property_keys(), self.height.max_storeys);
        FeatureConverter::new(self.property_keys(), height, self.capabilities())
    }

    pub fn cluster_converter(&self) -> ClusterConverter {
        ClusterConverter::new(self.feature_converter())
            .with_default_font(self.cluster.default_font.clone())
            .with_minimum_cluster_size(self.cluster.minimum_cluster_size)
    }

    pub fn lod_options(&self) -> LodOptions {
        LodOptions {
            max_level: self.lod.max_level,
            reference: self.lod.reference,
        }
    }

    pub fn vector_synchronizer(&self) -> VectorSynchronizer {
        LayerSynchronizer::new(VectorTarget::new(self.cluster_converter()))
    }

    pub fn raster_synchronizer(&self) -> RasterSynchronizer {
        LayerSynchronizer::new(RasterTarget::new(self.lod_options()))
    }
}
