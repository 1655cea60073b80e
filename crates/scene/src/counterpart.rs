use std::collections::BTreeMap;

use foundation::{FeatureId, ImageId, LayerId, Projection};
use runtime::CancelToken;

use crate::billboard::{Billboard, BillboardCollection, BillboardId};
use crate::entity::{DataSource, Entity, EntityId};
use crate::label::LabelCollection;
use crate::primitive::{PrimitiveCollection, PrimitiveId, SceneObject};

/// Handle to one scene object created for a feature.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ObjectRef {
    /// Top-level object in the primitive root; labels below it are
    /// released together with it.
    Root(PrimitiveId),
    Billboard(BillboardId),
    Entity(EntityId),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PendingTarget {
    /// Added to the shared billboard collection.
    Collection,
    /// Attached to an existing entity.
    Entity(EntityId),
}

/// Billboard waiting for its image to finish loading.
#[derive(Debug, Clone)]
pub struct PendingBillboard {
    pub feature: FeatureId,
    pub image: ImageId,
    pub token: CancelToken,
    pub billboard: Billboard,
    pub target: PendingTarget,
}

/// Result of [`LayerCounterpart::complete_image`].
#[derive(Debug, Clone, Default)]
pub struct ImageCompletion {
    pub created: usize,
    /// Live waits that ended with this image, whether or not their target
    /// still existed.
    pub settled: Vec<(FeatureId, CancelToken)>,
}

/// Everything a conversion pass writes into, owned by one counterpart.
#[derive(Debug, Clone)]
pub struct ConversionContext {
    pub projection: Projection,
    pub billboards: BillboardCollection,
    pub labels: LabelCollection,
    pub feature_objects: BTreeMap<FeatureId, Vec<ObjectRef>>,
    pub pending: Vec<PendingBillboard>,
}

impl ConversionContext {
    pub fn new(projection: Projection) -> Self {
        Self {
            projection,
            billboards: BillboardCollection::new(),
            labels: LabelCollection::new(),
            feature_objects: BTreeMap::new(),
            pending: Vec::new(),
        }
    }

    pub fn record(&mut self, feature: FeatureId, object: ObjectRef) {
        self.feature_objects.entry(feature).or_default().push(object);
    }

    pub fn objects_for(&self, feature: FeatureId) -> &[ObjectRef] {
        self.feature_objects
            .get(&feature)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn defer(&mut self, pending: PendingBillboard) {
        self.pending.push(pending);
    }
}

#[derive(Debug, Clone)]
pub enum CounterpartRoot {
    Primitives(PrimitiveCollection),
    Entities(DataSource),
}

/// 3D representative of one vector layer.
#[derive(Debug, Clone)]
pub struct LayerCounterpart {
    layer: LayerId,
    pub root: CounterpartRoot,
    pub context: ConversionContext,
}

impl LayerCounterpart {
    pub fn new_primitives(layer: LayerId, projection: Projection) -> Self {
        Self {
            layer,
            root: CounterpartRoot::Primitives(PrimitiveCollection::new()),
            context: ConversionContext::new(projection),
        }
    }

    pub fn new_entities(layer: LayerId, projection: Projection, source: DataSource) -> Self {
        Self {
            layer,
            root: CounterpartRoot::Entities(source),
            context: ConversionContext::new(projection),
        }
    }

    pub fn layer(&self) -> LayerId {
        self.layer
    }

    pub fn primitives(&self) -> Option<&PrimitiveCollection> {
        match &self.root {
            CounterpartRoot::Primitives(p) => Some(p),
            CounterpartRoot::Entities(_) => None,
        }
    }

    pub fn data_source(&self) -> Option<&DataSource> {
        match &self.root {
            CounterpartRoot::Entities(d) => Some(d),
            CounterpartRoot::Primitives(_) => None,
        }
    }

    pub fn data_source_mut(&mut self) -> Option<&mut DataSource> {
        match &mut self.root {
            CounterpartRoot::Entities(d) => Some(d),
            CounterpartRoot::Primitives(_) => None,
        }
    }

    pub fn show(&self) -> bool {
        match &self.root {
            CounterpartRoot::Primitives(p) => p.show,
            CounterpartRoot::Entities(d) => d.show,
        }
    }

    pub fn set_show(&mut self, show: bool) {
        match &mut self.root {
            CounterpartRoot::Primitives(p) => p.show = show,
            CounterpartRoot::Entities(d) => d.show = show,
        }
    }

    /// Adds the converted object of `feature` to the primitive root.
    pub fn add_feature_object(&mut self, feature: FeatureId, object: SceneObject) -> Option<PrimitiveId> {
        let CounterpartRoot::Primitives(root) = &mut self.root else {
            return None;
        };
        let id = root.add(object);
        self.context.record(feature, ObjectRef::Root(id));
        Some(id)
    }

    /// Adds the entity of `feature` to the entity root.
    pub fn add_entity(&mut self, feature: FeatureId, entity: Entity) -> Option<EntityId> {
        let CounterpartRoot::Entities(source) = &mut self.root else {
            return None;
        };
        let id = source.entities.add(entity)?;
        self.context.record(feature, ObjectRef::Entity(id));
        Some(id)
    }

    /// Releases every object created for `feature`. Returns how many
    /// handles were released.
    pub fn remove_feature(&mut self, feature: FeatureId) -> usize {
        self.context.pending.retain(|p| p.feature != feature);
        let Some(objects) = self.context.feature_objects.remove(&feature) else {
            return 0;
        };
        for object in &objects {
            match (*object, &mut self.root) {
                (ObjectRef::Root(id), CounterpartRoot::Primitives(root)) => {
                    if let Some(removed) = root.remove(id) {
                        for label in removed.label_ids() {
                            self.context.labels.remove(label);
                        }
                    }
                }
                (ObjectRef::Billboard(id), _) => {
                    self.context.billboards.remove(id);
                }
                (ObjectRef::Entity(id), CounterpartRoot::Entities(source)) => {
                    source.entities.remove(id);
                }
                _ => {}
            }
        }
        objects.len()
    }

    /// Drops every feature object, keeping the counterpart itself.
    pub fn clear_features(&mut self) {
        let features: Vec<FeatureId> = self.context.feature_objects.keys().copied().collect();
        for feature in features {
            self.remove_feature(feature);
        }
        self.context.pending.clear();
    }

    /// Creates the billboards that were waiting for `image`.
    ///
    /// A pending billboard is dropped without effect when its token was
    /// cancelled or its target collection was torn down.
    pub fn complete_image(&mut self, image: ImageId) -> ImageCompletion {
        let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.context.pending)
            .into_iter()
            .partition(|p| p.image == image);
        self.context.pending = waiting;

        let mut done = ImageCompletion::default();
        for pending in ready {
            if pending.token.is_cancelled() {
                continue;
            }
            done.settled.push((pending.feature, pending.token.clone()));
            match pending.target {
                PendingTarget::Collection => {
                    if let Some(id) = self.context.billboards.add(pending.billboard) {
                        self.context.record(pending.feature, ObjectRef::Billboard(id));
                        done.created += 1;
                    }
                }
                PendingTarget::Entity(entity) => {
                    let CounterpartRoot::Entities(source) = &mut self.root else {
                        continue;
                    };
                    if source.entities.is_destroyed() {
                        continue;
                    }
                    if let Some(e) = source.entities.get_mut(entity) {
                        e.billboard = Some(pending.billboard);
                        done.created += 1;
                    }
                }
            }
        }
        done
    }

    /// Root objects, billboards, labels and entities currently alive.
    pub fn object_count(&self) -> usize {
        let root = match &self.root {
            CounterpartRoot::Primitives(p) => p.len(),
            CounterpartRoot::Entities(d) => d.entities.len(),
        };
        root + self.context.billboards.len() + self.context.labels.len()
    }

    /// Tears the counterpart down; late image completions become no-ops.
    pub fn destroy(&mut self) {
        match &mut self.root {
            CounterpartRoot::Primitives(p) => p.clear(),
            CounterpartRoot::Entities(d) => d.entities.destroy(),
        }
        self.context.billboards.destroy();
        self.context.labels.destroy();
        self.context.feature_objects.clear();
        self.context.pending.clear();
    }
}
