use foundation::{Extent, Projection};

use crate::properties::Properties;

/// Map coordinate. `z` defaults to 0 for 2D input.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coordinate {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub const fn xy(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn same_xy(&self, other: &Coordinate) -> bool {
        self.x == other.x && self.y == other.y
    }

    fn transformed(self, projection: &Projection) -> Self {
        let [x, y] = projection.to_lon_lat([self.x, self.y]);
        Self { x, y, z: self.z }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    LineString,
    LinearRing,
    Polygon,
    Circle,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
}

impl GeometryKind {
    pub fn name(self) -> &'static str {
        match self {
            GeometryKind::Point => "Point",
            GeometryKind::LineString => "LineString",
            GeometryKind::LinearRing => "LinearRing",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::Circle => "Circle",
            GeometryKind::MultiPoint => "MultiPoint",
            GeometryKind::MultiLineString => "MultiLineString",
            GeometryKind::MultiPolygon => "MultiPolygon",
            GeometryKind::GeometryCollection => "GeometryCollection",
        }
    }
}

impl std::fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Point(Coordinate),
    LineString(Vec<Coordinate>),
    /// Only valid as a polygon ring; never converted on its own.
    LinearRing(Vec<Coordinate>),
    /// Outer ring first, then holes.
    Polygon(Vec<Vec<Coordinate>>),
    Circle { center: Coordinate, radius: f64 },
    MultiPoint(Vec<Coordinate>),
    MultiLineString(Vec<Vec<Coordinate>>),
    MultiPolygon(Vec<Vec<Vec<Coordinate>>>),
    GeometryCollection(Vec<Geometry>),
}

/// A typed shape plus its own property bag (highest override priority).
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub shape: Shape,
    pub properties: Properties,
}

impl Geometry {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            properties: Properties::new(),
        }
    }

    pub fn point(c: Coordinate) -> Self {
        Self::new(Shape::Point(c))
    }

    pub fn line_string(coords: Vec<Coordinate>) -> Self {
        Self::new(Shape::LineString(coords))
    }

    pub fn polygon(rings: Vec<Vec<Coordinate>>) -> Self {
        Self::new(Shape::Polygon(rings))
    }

    pub fn circle(center: Coordinate, radius: f64) -> Self {
        Self::new(Shape::Circle { center, radius })
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn kind(&self) -> GeometryKind {
        match &self.shape {
            Shape::Point(_) => GeometryKind::Point,
            Shape::LineString(_) => GeometryKind::LineString,
            Shape::LinearRing(_) => GeometryKind::LinearRing,
            Shape::Polygon(_) => GeometryKind::Polygon,
            Shape::Circle { .. } => GeometryKind::Circle,
            Shape::MultiPoint(_) => GeometryKind::MultiPoint,
            Shape::MultiLineString(_) => GeometryKind::MultiLineString,
            Shape::MultiPolygon(_) => GeometryKind::MultiPolygon,
            Shape::GeometryCollection(_) => GeometryKind::GeometryCollection,
        }
    }

    /// All vertices in document order (circle: its center).
    pub fn coordinates(&self) -> Vec<Coordinate> {
        let mut out = Vec::new();
        self.collect_coordinates(&mut out);
        out
    }

    fn collect_coordinates(&self, out: &mut Vec<Coordinate>) {
        match &self.shape {
            Shape::Point(c) | Shape::Circle { center: c, .. } => out.push(*c),
            Shape::LineString(cs) | Shape::LinearRing(cs) | Shape::MultiPoint(cs) => {
                out.extend_from_slice(cs)
            }
            Shape::Polygon(rings) | Shape::MultiLineString(rings) => {
                rings.iter().for_each(|r| out.extend_from_slice(r))
            }
            Shape::MultiPolygon(polys) => polys
                .iter()
                .flatten()
                .for_each(|r| out.extend_from_slice(r)),
            Shape::GeometryCollection(members) => {
                members.iter().for_each(|g| g.collect_coordinates(out))
            }
        }
    }

    pub fn first_coordinate(&self) -> Option<Coordinate> {
        self.coordinates().first().copied()
    }

    /// 2D bounding box; circles include their radius.
    pub fn extent(&self) -> Extent {
        let mut e = Extent::empty();
        if let Shape::Circle { center, radius } = &self.shape {
            e.extend(center.x - radius, center.y - radius);
            e.extend(center.x + radius, center.y + radius);
            return e;
        }
        for c in self.coordinates() {
            e.extend(c.x, c.y);
        }
        e
    }

    /// Copy of this geometry expressed in `[lon, lat]` degrees.
    ///
    /// A circle keeps its center and measures its new radius to the
    /// transformed point one radius east of the center.
    pub fn to_lon_lat(&self, projection: &Projection) -> Geometry {
        let map_all = |cs: &[Coordinate]| -> Vec<Coordinate> {
            cs.iter().map(|c| c.transformed(projection)).collect()
        };
        let shape = match &self.shape {
            Shape::Point(c) => Shape::Point(c.transformed(projection)),
            Shape::LineString(cs) => Shape::LineString(map_all(cs)),
            Shape::LinearRing(cs) => Shape::LinearRing(map_all(cs)),
            Shape::MultiPoint(cs) => Shape::MultiPoint(map_all(cs)),
            Shape::Polygon(rings) => Shape::Polygon(rings.iter().map(|r| map_all(r)).collect()),
            Shape::MultiLineString(lines) => {
                Shape::MultiLineString(lines.iter().map(|l| map_all(l)).collect())
            }
            Shape::MultiPolygon(polys) => Shape::MultiPolygon(
                polys
                    .iter()
                    .map(|rings| rings.iter().map(|r| map_all(r)).collect())
                    .collect(),
            ),
            Shape::Circle { center, radius } => {
                let c = center.transformed(projection);
                let edge = Coordinate::new(center.x + radius, center.y, center.z)
                    .transformed(projection);
                let radius = ((edge.x - c.x).powi(2) + (edge.y - c.y).powi(2)).sqrt();
                Shape::Circle { center: c, radius }
            }
            Shape::GeometryCollection(members) => Shape::GeometryCollection(
                members.iter().map(|g| g.to_lon_lat(projection)).collect(),
            ),
        };
        Geometry {
            shape,
            properties: self.properties.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Coordinate, Geometry, GeometryKind, Shape};
    use foundation::{Extent, Projection};

    #[test]
    fn extent_covers_all_rings() {
        let g = Geometry::polygon(vec![
            vec![Coordinate::xy(0.0, 0.0), Coordinate::xy(4.0, 0.0), Coordinate::xy(4.0, 2.0)],
            vec![Coordinate::xy(-1.0, 1.0)],
        ]);
        assert_eq!(g.extent(), Extent::from_array([-1.0, 0.0, 4.0, 2.0]));
        assert_eq!(g.kind(), GeometryKind::Polygon);
    }

    #[test]
    fn collection_coordinates_are_flattened_in_order() {
        let g = Geometry::new(Shape::GeometryCollection(vec![
            Geometry::point(Coordinate::new(1.0, 1.0, 5.0)),
            Geometry::line_string(vec![Coordinate::xy(2.0, 2.0), Coordinate::xy(3.0, 3.0)]),
        ]));
        let zs: Vec<f64> = g.coordinates().iter().map(|c| c.x).collect();
        assert_eq!(zs, vec![1.0, 2.0, 3.0]);
        assert_eq!(g.first_coordinate().map(|c| c.z), Some(5.0));
    }

    #[test]
    fn geographic_transform_is_identity() {
        let g = Geometry::circle(Coordinate::new(7.0, 46.0, 10.0), 0.5);
        assert_eq!(g.to_lon_lat(&Projection::Epsg4326), g);
    }

    #[test]
    fn mercator_circle_keeps_height_and_positive_radius() {
        let g = Geometry::circle(Coordinate::new(0.0, 0.0, 3.0), 111_319.490_793_273_6);
        match g.to_lon_lat(&Projection::Epsg3857).shape {
            Shape::Circle { center, radius } => {
                assert_eq!(center.z, 3.0);
                assert!((radius - 1.0).abs() < 1e-9, "radius {radius}");
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }
}
