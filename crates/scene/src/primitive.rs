use crate::appearance::Appearance;
use crate::geometry::GeometryInstance;
use crate::label::LabelId;
use crate::picking::PickRef;
use crate::types::ClassificationType;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PrimitiveKind {
    Primitive,
    /// Draped on terrain through shadow volumes.
    Ground,
    GroundPolyline,
    Classification,
}

/// Geometry instances rendered with one appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    pub instances: Vec<GeometryInstance>,
    pub appearance: Option<Appearance>,
    pub classification: Option<ClassificationType>,
    pub allow_picking: bool,
    pub shadows: bool,
    pick: PickRef,
}

impl Primitive {
    pub fn new(kind: PrimitiveKind, instances: Vec<GeometryInstance>, pick: PickRef) -> Self {
        Self {
            kind,
            instances,
            appearance: None,
            classification: None,
            allow_picking: true,
            shadows: false,
            pick,
        }
    }

    pub fn with_appearance(mut self, appearance: Appearance) -> Self {
        self.appearance = Some(appearance);
        self
    }

    pub fn with_classification(mut self, classification: Option<ClassificationType>) -> Self {
        self.classification = classification;
        self
    }

    pub fn with_allow_picking(mut self, allow: bool) -> Self {
        self.allow_picking = allow;
        self
    }

    pub fn with_shadows(mut self) -> Self {
        self.shadows = true;
        self
    }

    pub fn pick_ref(&self) -> PickRef {
        self.pick
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PrimitiveId(pub u64);

/// A node of the primitive tree produced for one feature or layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneObject {
    Primitive(Primitive),
    Collection(PrimitiveCollection),
    /// A label living in the counterpart's shared label collection.
    Label(LabelId),
}

impl SceneObject {
    /// Label handles anywhere below this node.
    pub fn label_ids(&self) -> Vec<LabelId> {
        let mut out = Vec::new();
        self.collect_labels(&mut out);
        out
    }

    fn collect_labels(&self, out: &mut Vec<LabelId>) {
        match self {
            SceneObject::Label(id) => out.push(*id),
            SceneObject::Collection(c) => c.iter().for_each(|o| o.collect_labels(out)),
            SceneObject::Primitive(_) => {}
        }
    }

    /// Primitives anywhere below this node, depth-first.
    pub fn primitives(&self) -> Vec<&Primitive> {
        match self {
            SceneObject::Primitive(p) => vec![p],
            SceneObject::Collection(c) => c.iter().flat_map(SceneObject::primitives).collect(),
            SceneObject::Label(_) => Vec::new(),
        }
    }

    /// Number of leaves (primitives and labels).
    pub fn leaf_count(&self) -> usize {
        match self {
            SceneObject::Collection(c) => c.iter().map(SceneObject::leaf_count).sum(),
            _ => 1,
        }
    }
}

/// Ordered container of scene objects.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveCollection {
    next: u64,
    items: Vec<(PrimitiveId, SceneObject)>,
    pub show: bool,
}

impl Default for PrimitiveCollection {
    fn default() -> Self {
        Self {
            next: 1,
            items: Vec::new(),
            show: true,
        }
    }
}

impl PrimitiveCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, object: SceneObject) -> PrimitiveId {
        let id = PrimitiveId(self.next);
        self.next += 1;
        self.items.push((id, object));
        id
    }

    pub fn remove(&mut self, id: PrimitiveId) -> Option<SceneObject> {
        let idx = self.items.iter().position(|(i, _)| *i == id)?;
        Some(self.items.remove(idx).1)
    }

    pub fn get(&self, id: PrimitiveId) -> Option<&SceneObject> {
        self.items.iter().find(|(i, _)| *i == id).map(|(_, o)| o)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.items.iter().map(|(_, o)| o)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{Primitive, PrimitiveCollection, PrimitiveKind, SceneObject};
    use crate::label::LabelId;
    use crate::picking::PickRef;
    use foundation::{FeatureId, LayerId};

    fn prim() -> SceneObject {
        SceneObject::Primitive(Primitive::new(
            PrimitiveKind::Primitive,
            Vec::new(),
            PickRef::new(LayerId(1), FeatureId(2)),
        ))
    }

    #[test]
    fn collection_walks_nested_labels() {
        let mut inner = PrimitiveCollection::new();
        inner.add(prim());
        inner.add(SceneObject::Label(LabelId(4)));
        let mut outer = PrimitiveCollection::new();
        outer.add(SceneObject::Collection(inner));
        outer.add(SceneObject::Label(LabelId(9)));
        let root = SceneObject::Collection(outer);
        assert_eq!(root.label_ids(), vec![LabelId(4), LabelId(9)]);
        assert_eq!(root.primitives().len(), 1);
        assert_eq!(root.leaf_count(), 3);
    }

    #[test]
    fn remove_by_id_keeps_order() {
        let mut c = PrimitiveCollection::new();
        let a = c.add(prim());
        let _b = c.add(SceneObject::Label(LabelId(1)));
        assert!(c.remove(a).is_some());
        assert!(c.remove(a).is_none());
        assert_eq!(c.len(), 1);
    }
}
