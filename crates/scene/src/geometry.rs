use foundation::Ecef;

use crate::types::Color;

#[derive(Debug, Clone, PartialEq)]
pub struct PolygonHierarchy {
    pub positions: Vec<Ecef>,
    pub holes: Vec<Vec<Ecef>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolygonGeometry {
    pub hierarchy: PolygonHierarchy,
    /// Base height; `None` keeps the per-position heights.
    pub height: Option<f64>,
    pub extruded_height: Option<f64>,
    pub per_position_height: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WallGeometry {
    pub positions: Vec<Ecef>,
    pub minimum_height: f64,
    pub maximum_height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircleGeometry {
    pub center: Ecef,
    pub radius: f64,
    pub height: f64,
    pub extruded_height: Option<f64>,
}

/// Geometry descriptions understood by the 3D engine.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryShape {
    Polygon(PolygonGeometry),
    PolygonOutline(PolygonGeometry),
    Polyline { positions: Vec<Ecef>, width: f64 },
    GroundPolyline { positions: Vec<Ecef>, width: f64 },
    Corridor { positions: Vec<Ecef>, width: f64 },
    Wall(WallGeometry),
    WallOutline(WallGeometry),
    Circle(CircleGeometry),
    CircleOutline(CircleGeometry),
}

impl GeometryShape {
    /// Whether the geometry can be draped on terrain as a ground primitive.
    pub fn supports_shadow_volume(&self) -> bool {
        matches!(
            self,
            GeometryShape::Polygon(_) | GeometryShape::Corridor { .. } | GeometryShape::Circle(_)
        )
    }

    pub fn is_outline(&self) -> bool {
        matches!(
            self,
            GeometryShape::PolygonOutline(_)
                | GeometryShape::WallOutline(_)
                | GeometryShape::CircleOutline(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeometryInstance {
    pub geometry: GeometryShape,
    /// Per-instance colour attribute; `None` when a material colours it.
    pub color: Option<Color>,
}

impl GeometryInstance {
    pub fn new(geometry: GeometryShape) -> Self {
        Self {
            geometry,
            color: None,
        }
    }

    pub fn colored(geometry: GeometryShape, color: Color) -> Self {
        Self {
            geometry,
            color: Some(color),
        }
    }
}
