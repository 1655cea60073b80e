use layers::{Feature, Geometry, Style};
use scene::{
    Appearance, ClassificationType, GeometryInstance, GeometryShape, HeightReference, PickRef,
    Primitive, PrimitiveCollection, PrimitiveKind, SceneObject, WallGeometry,
};

use crate::converter::{Conversion, FeatureConverter, to_ecef_all};
use crate::height::{HeightInfo, min_height_or_ground_level};
use crate::paint::{extract_color, line_material, line_width};

impl FeatureConverter {
    /// Converts a line string. Extruded lines become walls unless
    /// `no_extrusion` is set.
    pub(crate) fn line_string(
        &self,
        cx: &mut Conversion<'_>,
        feature: &Feature,
        style: &Style,
        geometry: &Geometry,
        no_extrusion: bool,
    ) -> PrimitiveCollection {
        let coords = geometry.coordinates();
        if !no_extrusion && let Some(h) = self.height_info(cx.layer, feature) {
            return self.wall(cx, feature, style, geometry, &h);
        }

        let positions = to_ecef_all(&coords);
        let width = line_width(style.stroke.as_ref());
        let pick = PickRef::new(cx.layer.id(), feature.id());
        let allow = self.allow_picking(cx.layer, feature, geometry);
        let classification = self.classification(cx.layer, feature, geometry);
        let appearance = Appearance::PolylineMaterial(line_material(style));

        let primitive = match self.height_reference(cx.layer, feature, geometry) {
            HeightReference::ClampToGround => {
                let draped = Some(classification.unwrap_or(ClassificationType::Terrain));
                if self.capabilities.ground_polylines {
                    let shape = GeometryShape::GroundPolyline { positions, width };
                    Primitive::new(PrimitiveKind::GroundPolyline, vec![GeometryInstance::new(shape)], pick)
                        .with_appearance(appearance)
                        .with_classification(draped)
                } else {
                    let color = extract_color(style.fill.as_ref(), style.stroke.as_ref(), true);
                    let shape = GeometryShape::Corridor { positions, width };
                    Primitive::new(PrimitiveKind::Ground, vec![GeometryInstance::colored(shape, color)], pick)
                        .with_classification(draped)
                }
            }
            _ if self.capabilities.classification_primitives && classification.is_some() => {
                let shape = GeometryShape::Polyline { positions, width };
                Primitive::new(PrimitiveKind::Classification, vec![GeometryInstance::new(shape)], pick)
                    .with_appearance(appearance)
                    .with_classification(classification)
            }
            _ => {
                let shape = GeometryShape::Polyline { positions, width };
                Primitive::new(PrimitiveKind::Primitive, vec![GeometryInstance::new(shape)], pick)
                    .with_appearance(appearance)
            }
        };

        let mut primitives = PrimitiveCollection::new();
        primitives.add(SceneObject::Primitive(primitive.with_allow_picking(allow)));
        self.add_text_style(cx, feature, geometry, style, primitives)
    }

    /// Vertical wall from `min - skirt` up to `min + extrusion`.
    fn wall(
        &self,
        cx: &mut Conversion<'_>,
        feature: &Feature,
        style: &Style,
        geometry: &Geometry,
        height: &HeightInfo,
    ) -> PrimitiveCollection {
        let coords = geometry.coordinates();
        let min = min_height_or_ground_level(&coords, height.ground_level, None);
        let wall = WallGeometry {
            positions: to_ecef_all(&coords),
            minimum_height: min - height.skirt,
            maximum_height: min + height.extruded_height,
        };
        let fill = vec![GeometryShape::Wall(wall.clone())];
        let outline = vec![GeometryShape::WallOutline(wall)];
        let primitives =
            self.wrap_fill_and_outline(cx, feature, geometry, fill, Some(outline), style, Some(height));
        self.add_text_style(cx, feature, geometry, style, primitives)
    }
}
