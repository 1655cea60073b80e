use foundation::Ecef;
use layers::{Coordinate, Feature, Geometry, ImageStyle, Properties, Style};
use scene::{
    Billboard, HeightReference, NearFarScalar, ObjectRef, PendingBillboard, PendingTarget,
    PickRef, PrimitiveCollection, SceneObject, VerticalOrigin,
};
use tracing::trace;

use crate::converter::{Conversion, FeatureConverter, to_ecef};
use crate::height::min_height_or_ground_level;

impl FeatureConverter {
    /// Billboard for an image style, without feature-specific placement.
    pub(crate) fn image_billboard(
        &self,
        feature: &Feature,
        image: &ImageStyle,
        position: Ecef,
        height_reference: HeightReference,
        pick: Option<PickRef>,
    ) -> Billboard {
        let mut bb = Billboard::new(position, pick);
        bb.image = Some(image.image);
        bb.color = [1.0, 1.0, 1.0, image.opacity as f32];
        bb.scale = image.scale;
        bb.height_reference = height_reference;
        bb.vertical_origin = VerticalOrigin::Bottom;
        let dz = feature
            .properties
            .number(&self.keys.z_eye_offset())
            .unwrap_or(0.0);
        bb.eye_offset = [0.0, 0.0, dz];
        bb.scale_by_distance = feature
            .properties
            .get(&self.keys.scale_by_distance())
            .and_then(|v| v.as_numbers())
            .and_then(|v| NearFarScalar::from_slice(&v));
        bb
    }

    /// Converts a point: a billboard for its image, plus a pin when
    /// extruded or a label when it has text.
    ///
    /// The billboard goes straight into the shared collection; when its
    /// image is still loading it is parked until the load completes.
    pub(crate) fn point(
        &self,
        cx: &mut Conversion<'_>,
        feature: &Feature,
        style: &Style,
        geometry: &Geometry,
        c: Coordinate,
    ) -> Option<SceneObject> {
        let height = self.height_info(cx.layer, feature);
        let mut top = c;
        let mut min_height = 0.0;
        if let Some(h) = &height {
            min_height = min_height_or_ground_level(&[c], h.ground_level, None);
            top.z = min_height + h.extruded_height;
        }

        if let Some(image) = &style.image {
            self.point_billboard(cx, feature, geometry, image, top, height.is_some());
        }

        if let Some(h) = height {
            let bottom = Coordinate::new(top.x, top.y, min_height - h.skirt);
            let pin = Geometry::line_string(vec![top, bottom])
                .with_properties(Properties::new().with(self.keys.altitude_mode(), "absolute"));
            let primitives = self.line_string(cx, feature, style, &pin, true);
            return Some(SceneObject::Collection(primitives));
        }
        if style.text.as_ref().is_some_and(|t| t.has_text()) {
            let primitives = self.add_text_style(cx, feature, geometry, style, PrimitiveCollection::new());
            return Some(SceneObject::Collection(primitives));
        }
        None
    }

    fn point_billboard(
        &self,
        cx: &mut Conversion<'_>,
        feature: &Feature,
        geometry: &Geometry,
        image: &ImageStyle,
        mut position: Coordinate,
        extruded: bool,
    ) {
        let Some(entry) = cx.images.get(image.image) else {
            trace!(feature = %feature.id(), image = %image.image, "unknown image, no billboard");
            return;
        };
        if image.opacity <= 0.0 {
            trace!(feature = %feature.id(), "transparent image, no billboard");
            return;
        }
        let loaded = entry.loaded;

        let mut href = self.height_reference(cx.layer, feature, geometry);
        if extruded {
            href = HeightReference::None;
        }
        if href == HeightReference::RelativeToGround
            && let Some(h) = feature.properties.number(&self.keys.height_above_ground())
        {
            position.z = h;
        }

        let pick = PickRef::new(cx.layer.id(), feature.id());
        let mut bb = self.image_billboard(feature, image, to_ecef(&position), href, Some(pick));
        bb.id = feature.stable_id.clone();
        if let (Some(anchor), Some(size)) = (image.anchor, image.size) {
            bb.pixel_offset = Some([size[0] / 2.0 - anchor[0], size[1] / 2.0 - anchor[1]]);
        }

        let source = cx.source();
        if loaded {
            cx.gate.cancel(source, feature.id());
            if let Some(id) = cx.context.billboards.add(bb) {
                cx.context.record(feature.id(), ObjectRef::Billboard(id));
            }
        } else {
            let token = cx.gate.begin(source, feature.id());
            cx.context.defer(PendingBillboard {
                feature: feature.id(),
                image: image.image,
                token,
                billboard: bb,
                target: PendingTarget::Collection,
            });
        }
    }
}
