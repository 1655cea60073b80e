use foundation::{FeatureId, LayerId};

/// Back-reference from a scene object to the 2D feature it was built from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PickRef {
    pub layer: LayerId,
    pub feature: FeatureId,
}

impl PickRef {
    pub fn new(layer: LayerId, feature: FeatureId) -> Self {
        Self { layer, feature }
    }
}

/// Something the renderer reported under the cursor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PickTarget {
    Root(crate::PrimitiveId),
    Billboard(crate::BillboardId),
    Label(crate::LabelId),
    Entity(crate::EntityId),
}

impl crate::LayerCounterpart {
    /// Resolves a picked object back to its feature.
    ///
    /// Primitives built with picking disabled resolve to nothing even
    /// though they carry a back-reference.
    pub fn pick(&self, target: PickTarget) -> Option<PickRef> {
        match target {
            PickTarget::Root(id) => {
                let object = self.primitives()?.get(id)?;
                object
                    .primitives()
                    .into_iter()
                    .find(|p| p.allow_picking)
                    .map(|p| p.pick_ref())
            }
            PickTarget::Billboard(id) => self.context.billboards.get(id)?.pick_ref(),
            PickTarget::Label(id) => self.context.labels.get(id)?.pick_ref(),
            PickTarget::Entity(id) => {
                let entity = self.data_source()?.entities.get(id)?;
                Some(entity.pick_ref())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PickRef, PickTarget};
    use crate::geometry::{GeometryInstance, GeometryShape};
    use crate::primitive::{Primitive, PrimitiveKind, SceneObject};
    use crate::LayerCounterpart;
    use foundation::{Ecef, FeatureId, LayerId, Projection};

    fn primitive(pick: PickRef, allow: bool) -> SceneObject {
        let shape = GeometryShape::Polyline {
            positions: vec![Ecef::ZERO, Ecef::new(1.0, 0.0, 0.0)],
            width: 1.0,
        };
        let instance = GeometryInstance::new(shape);
        SceneObject::Primitive(
            Primitive::new(PrimitiveKind::Primitive, vec![instance], pick).with_allow_picking(allow),
        )
    }

    #[test]
    fn picking_honours_allow_picking() {
        let mut cp = LayerCounterpart::new_primitives(LayerId(2), Projection::Epsg3857);
        let pick = PickRef::new(LayerId(2), FeatureId(9));
        let on = cp.add_feature_object(FeatureId(9), primitive(pick, true)).unwrap();
        let off = cp.add_feature_object(FeatureId(9), primitive(pick, false)).unwrap();
        assert_eq!(cp.pick(PickTarget::Root(on)), Some(pick));
        assert_eq!(cp.pick(PickTarget::Root(off)), None);
    }
}
