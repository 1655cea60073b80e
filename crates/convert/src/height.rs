use layers::{Coordinate, Properties};

use crate::overrides::{OverrideChain, PropertyKeys};

pub const DEFAULT_MAX_STOREYS: u32 = 200;

/// Extrusion parameters derived for one feature.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HeightInfo {
    pub extruded_height: f64,
    /// Explicit base height above mean sea level.
    pub ground_level: Option<f64>,
    /// Downward extension of the extrusion base.
    pub skirt: f64,
    pub storey_number: Option<u32>,
    pub storey_height: Option<f64>,
}

impl HeightInfo {
    /// Storey count and height, only when both are known.
    pub fn storeys(&self) -> Option<(u32, f64)> {
        Some((self.storey_number?, self.storey_height?))
    }
}

/// Finite and non-zero; zero means "not set" for these properties.
fn set(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v != 0.0)
}

/// Derives [`HeightInfo`] from feature and layer properties.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightPolicy {
    keys: PropertyKeys,
    max_storeys: u32,
}

impl Default for HeightPolicy {
    fn default() -> Self {
        Self::new(PropertyKeys::default(), DEFAULT_MAX_STOREYS)
    }
}

impl HeightPolicy {
    pub fn new(keys: PropertyKeys, max_storeys: u32) -> Self {
        Self { keys, max_storeys }
    }

    pub fn max_storeys(&self) -> u32 {
        self.max_storeys
    }

    /// Returns `None` when the feature is not extruded.
    ///
    /// Storey fields derive each other. A given extrusion and storey height
    /// yield the storey count, rounded up, so the top storey may be shorter.
    /// Negative extrusions and counts above the storey bound carry no storey
    /// fields.
    pub fn resolve(&self, feature: &Properties, layer: &Properties) -> Option<HeightInfo> {
        let chain = OverrideChain::new(None, feature, layer);
        let mut extruded = set(chain.number(&self.keys.extruded_height()));
        let mut storey_number = set(feature.number(&self.keys.storey_number())).filter(|n| *n > 0.0);
        let mut storey_height = set(chain.number(&self.keys.storey_height())).filter(|h| *h > 0.0);

        match (extruded, storey_number, storey_height) {
            (Some(e), _, _) if e < 0.0 => {
                storey_number = None;
                storey_height = None;
            }
            (Some(e), _, Some(h)) => {
                storey_number = Some((e / h).ceil());
            }
            (Some(e), Some(n), None) => {
                storey_height = Some(e / n);
                storey_number = Some(n.ceil());
            }
            (None, Some(n), Some(h)) => {
                let n = n.ceil();
                storey_number = Some(n);
                extruded = Some(n * h);
            }
            _ => {}
        }

        if storey_number.is_some_and(|n| n > f64::from(self.max_storeys)) {
            storey_number = None;
            storey_height = None;
        }

        let extruded_height = extruded?;
        let skirt = chain
            .number(&self.keys.skirt())
            .filter(|s| s.is_finite())
            .unwrap_or(0.0);
        let ground_level = feature
            .number(&self.keys.ground_level())
            .filter(|g| g.is_finite());
        Some(HeightInfo {
            extruded_height,
            ground_level,
            skirt,
            storey_number: storey_number.map(|n| n as u32),
            storey_height,
        })
    }
}

/// Explicit ground level when finite, else the lowest non-zero Z below
/// `initial`, else 0.
pub fn min_height_or_ground_level(
    coordinates: &[Coordinate],
    ground_level: Option<f64>,
    initial: Option<f64>,
) -> f64 {
    if let Some(g) = ground_level.filter(|g| g.is_finite()) {
        return g;
    }
    let min = coordinates
        .iter()
        .map(|c| c.z)
        .filter(|z| *z != 0.0 && !z.is_nan())
        .fold(initial.unwrap_or(f64::INFINITY), f64::min);
    if min.is_finite() { min } else { 0.0 }
}
