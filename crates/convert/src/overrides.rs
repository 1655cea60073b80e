use layers::{GeometryKind, Properties, PropertyValue};
use scene::{ClassificationType, HeightReference};

pub const DEFAULT_PREFIX: &str = "olcs_";

/// Names of the recognised properties, all sharing one prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyKeys {
    prefix: String,
}

impl Default for PropertyKeys {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl PropertyKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn key(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    pub fn altitude_mode(&self) -> String {
        self.key("altitudeMode")
    }

    pub fn extruded_height(&self) -> String {
        self.key("extrudedHeight")
    }

    pub fn storey_number(&self) -> String {
        self.key("storeyNumber")
    }

    pub fn storey_height(&self) -> String {
        self.key("storeyHeight")
    }

    pub fn skirt(&self) -> String {
        self.key("skirt")
    }

    pub fn ground_level(&self) -> String {
        self.key("groundLevel")
    }

    pub fn height_above_ground(&self) -> String {
        self.key("heightAboveGround")
    }

    pub fn z_eye_offset(&self) -> String {
        self.key("zCoordinateEyeOffset")
    }

    pub fn scale_by_distance(&self) -> String {
        self.key("scaleByDistance")
    }

    pub fn allow_picking(&self) -> String {
        self.key("allowPicking")
    }

    pub fn classification_type(&self) -> String {
        self.key("classificationType")
    }
}

/// Property bags searched in priority order, most specific first.
#[derive(Debug, Clone, Copy)]
pub struct OverrideChain<'a> {
    levels: [Option<&'a Properties>; 3],
}

impl<'a> OverrideChain<'a> {
    /// Geometry, then feature, then layer.
    pub fn new(
        geometry: Option<&'a Properties>,
        feature: &'a Properties,
        layer: &'a Properties,
    ) -> Self {
        Self {
            levels: [geometry, Some(feature), Some(layer)],
        }
    }

    /// Same chain without the geometry level.
    pub fn without_geometry(self) -> Self {
        Self {
            levels: [None, self.levels[1], self.levels[2]],
        }
    }

    /// First non-null value for `key` along the chain.
    pub fn resolve(&self, key: &str) -> Option<&'a PropertyValue> {
        self.levels
            .into_iter()
            .flatten()
            .filter_map(|p| p.get(key))
            .find(|v| !v.is_null())
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.resolve(key).and_then(PropertyValue::as_f64)
    }

    pub fn string(&self, key: &str) -> Option<&'a str> {
        self.resolve(key).and_then(PropertyValue::as_str)
    }
}

/// Altitude mode to height reference. Relative-to-ground is honoured for
/// points only; other kinds fall back to clamping.
pub fn height_reference(keys: &PropertyKeys, chain: OverrideChain<'_>, kind: GeometryKind) -> HeightReference {
    match chain.string(&keys.altitude_mode()) {
        Some("clampToGround") => HeightReference::ClampToGround,
        Some("relativeToGround") if kind == GeometryKind::Point => HeightReference::RelativeToGround,
        Some("relativeToGround") => HeightReference::ClampToGround,
        _ => HeightReference::None,
    }
}

/// Defaults to `true` when no level sets the flag.
pub fn allow_picking(keys: &PropertyKeys, chain: OverrideChain<'_>) -> bool {
    match chain.resolve(&keys.allow_picking()) {
        Some(PropertyValue::Bool(b)) => *b,
        Some(PropertyValue::Number(n)) => *n != 0.0 && !n.is_nan(),
        Some(PropertyValue::String(s)) => !s.is_empty(),
        Some(PropertyValue::Array(_)) => true,
        Some(PropertyValue::Null) | None => true,
    }
}

/// Read from the feature, else the layer. Unknown names resolve to nothing.
pub fn classification_type(keys: &PropertyKeys, chain: OverrideChain<'_>) -> Option<ClassificationType> {
    let key = keys.classification_type();
    let chain = chain.without_geometry();
    let value = chain
        .levels
        .into_iter()
        .flatten()
        .filter_map(|p| p.string(&key))
        .find(|s| !s.is_empty())?;
    ClassificationType::parse(value)
}
