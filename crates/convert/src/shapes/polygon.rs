use foundation::Ecef;
use layers::{Feature, Geometry, Shape, Style};
use scene::{
    Appearance, ClassificationType, GeometryInstance, GeometryShape, HeightReference, PickRef,
    PolygonGeometry, PolygonHierarchy, Primitive, PrimitiveCollection, PrimitiveKind, SceneObject,
};

use crate::converter::{Conversion, FeatureConverter, to_ecef_all};
use crate::height::min_height_or_ground_level;
use crate::paint::{line_material, line_width};

impl FeatureConverter {
    /// Converts a polygon with holes.
    ///
    /// Rings are closed when their ends differ. A storeyed extrusion
    /// becomes one slab per storey, each top one storey higher and capped
    /// at the full extrusion.
    pub(crate) fn polygon(
        &self,
        cx: &mut Conversion<'_>,
        feature: &Feature,
        style: &Style,
        geometry: &Geometry,
    ) -> PrimitiveCollection {
        let Shape::Polygon(rings) = &geometry.shape else {
            return PrimitiveCollection::new();
        };
        let height = self.height_info(cx.layer, feature);

        let mut min_height = f64::INFINITY;
        let mut closed: Vec<Vec<Ecef>> = Vec::with_capacity(rings.len());
        for ring in rings {
            if let Some(h) = &height {
                min_height = min_height_or_ground_level(ring, h.ground_level, Some(min_height));
            }
            let mut ring = ring.clone();
            if let (Some(first), Some(last)) = (ring.first().copied(), ring.last())
                && !first.same_xy(last)
            {
                ring.push(first);
            }
            closed.push(to_ecef_all(&ring));
        }
        let mut closed = closed.into_iter();
        let Some(outer) = closed.next() else {
            return PrimitiveCollection::new();
        };
        let hierarchy = PolygonHierarchy {
            positions: outer,
            holes: closed.collect(),
        };

        let mut base = None;
        let mut per_position_height = true;
        if let Some(h) = &height {
            if h.skirt != 0.0 {
                base = Some(min_height - h.skirt);
                per_position_height = false;
            } else if let Some(g) = h.ground_level.filter(|g| *g != 0.0) {
                base = Some(g);
                per_position_height = false;
            }
        }
        let extruded = height.map(|h| min_height + h.extruded_height);

        let mut outline = None;
        let fill = match height.and_then(|h| h.storeys()).filter(|(n, _)| *n > 0) {
            Some((storeys, storey_height)) => {
                let base = base.filter(|b| *b != 0.0).unwrap_or(min_height);
                let max = extruded.unwrap_or(min_height);
                let mut top = min_height + storey_height;
                let mut fills = Vec::with_capacity(storeys as usize);
                let mut outlines = Vec::with_capacity(storeys as usize);
                for _ in 0..storeys {
                    let slab = PolygonGeometry {
                        hierarchy: hierarchy.clone(),
                        height: Some(base),
                        extruded_height: Some(top),
                        per_position_height: false,
                    };
                    fills.push(GeometryShape::Polygon(slab.clone()));
                    outlines.push(GeometryShape::PolygonOutline(slab));
                    top = (top + storey_height).min(max);
                }
                outline = Some(outlines);
                fills
            }
            None => vec![GeometryShape::Polygon(PolygonGeometry {
                hierarchy: hierarchy.clone(),
                height: base,
                extruded_height: extruded,
                per_position_height,
            })],
        };

        let mut ground_outline = None;
        let clamped = self.height_reference(cx.layer, feature, geometry) == HeightReference::ClampToGround;
        if height.is_none() && clamped && self.capabilities.ground_polylines {
            let width = line_width(style.stroke.as_ref());
            if width > 0.0 {
                let instances = std::iter::once(&hierarchy.positions)
                    .chain(hierarchy.holes.iter())
                    .map(|positions| {
                        GeometryInstance::new(GeometryShape::GroundPolyline {
                            positions: positions.clone(),
                            width,
                        })
                    })
                    .collect();
                let pick = PickRef::new(cx.layer.id(), feature.id());
                ground_outline = Some(
                    Primitive::new(PrimitiveKind::GroundPolyline, instances, pick)
                        .with_appearance(Appearance::PolylineMaterial(line_material(style)))
                        .with_allow_picking(self.allow_picking(cx.layer, feature, geometry))
                        .with_classification(Some(ClassificationType::Terrain)),
                );
            }
        } else if outline.is_none() {
            outline = Some(vec![GeometryShape::PolygonOutline(PolygonGeometry {
                hierarchy,
                height: base,
                extruded_height: extruded,
                per_position_height,
            })]);
        }

        let mut primitives =
            self.wrap_fill_and_outline(cx, feature, geometry, fill, outline, style, height.as_ref());
        if let Some(p) = ground_outline {
            primitives.add(SceneObject::Primitive(p));
        }
        self.add_text_style(cx, feature, geometry, style, primitives)
    }
}
