/// Normalized RGBA, as used by every material and instance colour.
pub type Color = [f32; 4];

pub const TRANSPARENT: Color = [0.0, 0.0, 0.0, 0.0];

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum HeightReference {
    /// Absolute height.
    #[default]
    None,
    ClampToGround,
    RelativeToGround,
}

/// Surfaces a clamped primitive drapes onto.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ClassificationType {
    Terrain,
    Cesium3DTile,
    Both,
}

impl ClassificationType {
    /// Parses the property values `"terrain"`, `"cesium3DTile"` and `"both"`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "terrain" => Some(ClassificationType::Terrain),
            "cesium3DTile" => Some(ClassificationType::Cesium3DTile),
            "both" => Some(ClassificationType::Both),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum VerticalOrigin {
    Top,
    #[default]
    Center,
    Bottom,
    Baseline,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum HorizontalOrigin {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LabelStyle {
    Fill,
    Outline,
    FillAndOutline,
}

/// Scale interpolated between a near and a far camera distance.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NearFarScalar {
    pub near: f64,
    pub near_value: f64,
    pub far: f64,
    pub far_value: f64,
}

impl NearFarScalar {
    pub fn new(near: f64, near_value: f64, far: f64, far_value: f64) -> Self {
        Self {
            near,
            near_value,
            far,
            far_value,
        }
    }

    /// Built from a `[near, nearValue, far, farValue]` array.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            [a, b, c, d] => Some(Self::new(*a, *b, *c, *d)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ClassificationType, NearFarScalar};

    #[test]
    fn classification_names_round_to_variants() {
        assert_eq!(ClassificationType::parse("both"), Some(ClassificationType::Both));
        assert_eq!(
            ClassificationType::parse("cesium3DTile"),
            Some(ClassificationType::Cesium3DTile)
        );
        assert_eq!(ClassificationType::parse("Terrain"), None);
    }

    #[test]
    fn near_far_needs_four_values() {
        assert!(NearFarScalar::from_slice(&[1.0, 2.0, 3.0]).is_none());
        assert_eq!(
            NearFarScalar::from_slice(&[1.0, 2.0, 3.0, 4.0]),
            Some(NearFarScalar::new(1.0, 2.0, 3.0, 4.0))
        );
    }
}
