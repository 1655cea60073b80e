use foundation::{WGS84_A, lon_lat_to_ecef};
use layers::{Coordinate, Feature, Geometry, Shape, Style};
use scene::{
    Appearance, CircleGeometry, ClassificationType, GeometryInstance, GeometryShape,
    HeightReference, PickRef, Primitive, PrimitiveCollection, PrimitiveKind, SceneObject,
};

use crate::converter::{Conversion, FeatureConverter, to_ecef};
use crate::height::min_height_or_ground_level;
use crate::paint::{line_material, line_width};

const CIRCLE_SEGMENTS: usize = 32;

/// Closed ring approximating a circle of `radius_m` metres on a sphere
/// of the WGS84 equatorial radius, as `[lon, lat]` degrees.
pub fn circular_ring(center_lon: f64, center_lat: f64, radius_m: f64, segments: usize) -> Vec<[f64; 2]> {
    let lat1 = center_lat.to_radians();
    let lon1 = center_lon.to_radians();
    let d = radius_m / WGS84_A;
    let mut ring: Vec<[f64; 2]> = (0..segments)
        .map(|i| {
            let bearing = 2.0 * std::f64::consts::PI * i as f64 / segments as f64;
            let lat2 = (lat1.sin() * d.cos() + lat1.cos() * d.sin() * bearing.cos()).asin();
            let lon2 = lon1
                + (bearing.sin() * d.sin() * lat1.cos()).atan2(d.cos() - lat1.sin() * lat2.sin());
            [lon2.to_degrees(), lat2.to_degrees()]
        })
        .collect();
    if let Some(first) = ring.first().copied() {
        ring.push(first);
    }
    ring
}

impl FeatureConverter {
    /// Converts a circle. Its radius is the straight-line distance in
    /// scene space between the centre and a point one radius east.
    pub(crate) fn circle(
        &self,
        cx: &mut Conversion<'_>,
        feature: &Feature,
        style: &Style,
        geometry: &Geometry,
    ) -> SceneObject {
        let Shape::Circle { center, radius } = geometry.shape else {
            return SceneObject::Collection(PrimitiveCollection::new());
        };
        let center_ecef = to_ecef(&center);
        let edge = Coordinate::new(center.x + radius, center.y, center.z);
        let radius_m = center_ecef.distance(to_ecef(&edge));

        let height = self.height_info(cx.layer, feature);
        let ground_level = feature.properties.number(&self.keys.ground_level());
        let mut min = min_height_or_ground_level(&[center], ground_level, None);
        let extruded = height.map(|h| {
            min -= h.skirt;
            min + h.extruded_height
        });
        let circle = CircleGeometry {
            center: center_ecef,
            radius: radius_m,
            height: min,
            extruded_height: extruded,
        };

        let clamped = self.height_reference(cx.layer, feature, geometry) == HeightReference::ClampToGround;
        let mut outline = None;
        let mut ground_outline = None;
        if height.is_none() && clamped && self.capabilities.ground_polylines {
            let width = line_width(style.stroke.as_ref());
            if width != 0.0 {
                let positions = circular_ring(center.x, center.y, radius_m, CIRCLE_SEGMENTS)
                    .into_iter()
                    .map(|[lon, lat]| lon_lat_to_ecef(lon, lat, 0.0))
                    .collect();
                let shape = GeometryShape::GroundPolyline { positions, width };
                let pick = PickRef::new(cx.layer.id(), feature.id());
                ground_outline = Some(
                    Primitive::new(PrimitiveKind::GroundPolyline, vec![GeometryInstance::new(shape)], pick)
                        .with_appearance(Appearance::PolylineMaterial(line_material(style)))
                        .with_allow_picking(self.allow_picking(cx.layer, feature, geometry))
                        .with_classification(Some(ClassificationType::Terrain)),
                );
            }
        } else {
            outline = Some(vec![GeometryShape::CircleOutline(circle.clone())]);
        }

        let fill = vec![GeometryShape::Circle(circle)];
        let mut primitives =
            self.wrap_fill_and_outline(cx, feature, geometry, fill, outline, style, height.as_ref());
        if let Some(p) = ground_outline {
            primitives.add(SceneObject::Primitive(p));
        }
        SceneObject::Collection(self.add_text_style(cx, feature, geometry, style, primitives))
    }
}
