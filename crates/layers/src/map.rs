use std::collections::BTreeMap;

use foundation::{Extent, FeatureId, IdGen, ImageId, LayerId, Projection, SourceId};
use runtime::EventBus;

use crate::feature::Feature;
use crate::image::ImageRegistry;
use crate::layer::{Layer, LayerKind};
use crate::source::TileSource;

/// What the 2D view currently shows. Both fields are required before any
/// conversion can run.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct View {
    pub projection: Option<Projection>,
    pub resolution: Option<f64>,
}

impl View {
    pub fn new(projection: Projection, resolution: f64) -> Self {
        Self {
            projection: Some(projection),
            resolution: Some(resolution),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.projection.is_some() && self.resolution.is_some()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LayerProperty {
    Opacity,
    Visible,
    Extent,
    ZIndex,
    /// Generic change, e.g. new source parameters.
    Source,
}

/// Object an event is emitted by.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventTarget {
    Layer(LayerId),
    Source(SourceId),
    Image(ImageId),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    LayerAdded,
    LayerRemoved,
    Changed(LayerProperty),
    FeatureAdded,
    FeatureRemoved,
    FeatureChanged,
    SourceCleared,
    ImageLoaded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Emitted by the group the layer joined.
    LayerAdded { parent: LayerId, layer: LayerId },
    /// Emitted by the group the layer left; descendants leave with it.
    LayerRemoved { parent: LayerId, layer: LayerId },
    LayerChanged { layer: LayerId, property: LayerProperty },
    FeatureAdded { source: SourceId, feature: FeatureId },
    FeatureRemoved { source: SourceId, feature: FeatureId },
    FeatureChanged { source: SourceId, feature: FeatureId },
    SourceCleared { source: SourceId, features: Vec<FeatureId> },
    ImageLoaded { image: ImageId },
}

impl MapEvent {
    pub fn target(&self) -> EventTarget {
        match self {
            MapEvent::LayerAdded { parent, .. } | MapEvent::LayerRemoved { parent, .. } => {
                EventTarget::Layer(*parent)
            }
            MapEvent::LayerChanged { layer, .. } => EventTarget::Layer(*layer),
            MapEvent::FeatureAdded { source, .. }
            | MapEvent::FeatureRemoved { source, .. }
            | MapEvent::FeatureChanged { source, .. }
            | MapEvent::SourceCleared { source, .. } => EventTarget::Source(*source),
            MapEvent::ImageLoaded { image } => EventTarget::Image(*image),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            MapEvent::LayerAdded { .. } => EventKind::LayerAdded,
            MapEvent::LayerRemoved { .. } => EventKind::LayerRemoved,
            MapEvent::LayerChanged { property, .. } => EventKind::Changed(*property),
            MapEvent::FeatureAdded { .. } => EventKind::FeatureAdded,
            MapEvent::FeatureRemoved { .. } => EventKind::FeatureRemoved,
            MapEvent::FeatureChanged { .. } => EventKind::FeatureChanged,
            MapEvent::SourceCleared { .. } => EventKind::SourceCleared,
            MapEvent::ImageLoaded { .. } => EventKind::ImageLoaded,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapError {
    UnknownLayer(LayerId),
    NotAGroup(LayerId),
    NoFeatureSource(LayerId),
    UnknownFeature(FeatureId),
    RootLayer,
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapError::UnknownLayer(id) => write!(f, "unknown layer {id}"),
            MapError::NotAGroup(id) => write!(f, "layer {id} is not a group"),
            MapError::NoFeatureSource(id) => write!(f, "layer {id} has no feature source"),
            MapError::UnknownFeature(id) => write!(f, "unknown feature {id}"),
            MapError::RootLayer => write!(f, "the root group cannot be removed"),
        }
    }
}

impl std::error::Error for MapError {}

/// The 2D map: a view, a layer tree under one root group, an image
/// registry and the event queue every mutation reports to.
#[derive(Debug)]
pub struct Map {
    view: View,
    root: LayerId,
    layers: BTreeMap<LayerId, Layer>,
    parents: BTreeMap<LayerId, LayerId>,
    images: ImageRegistry,
    layer_ids: IdGen,
    source_ids: IdGen,
    feature_ids: IdGen,
    events: EventBus<MapEvent>,
}

impl Map {
    pub fn new(view: View) -> Self {
        let mut layer_ids = IdGen::new();
        let mut root = Layer::group();
        root.id = LayerId(layer_ids.next_raw());
        let root_id = root.id;
        let mut layers = BTreeMap::new();
        layers.insert(root_id, root);
        Self {
            view,
            root: root_id,
            layers,
            parents: BTreeMap::new(),
            images: ImageRegistry::new(),
            layer_ids,
            source_ids: IdGen::new(),
            feature_ids: IdGen::new(),
            events: EventBus::new(),
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn set_view(&mut self, view: View) {
        self.view = view;
    }

    pub fn root(&self) -> LayerId {
        self.root
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(&id)
    }

    pub fn contains_layer(&self, id: LayerId) -> bool {
        self.layers.contains_key(&id)
    }

    pub fn parent(&self, id: LayerId) -> Option<LayerId> {
        self.parents.get(&id).copied()
    }

    /// Enclosing groups, nearest first, ending with the root.
    pub fn ancestry(&self, id: LayerId) -> Vec<LayerId> {
        let mut out = Vec::new();
        let mut cur = id;
        while let Some(p) = self.parent(cur) {
            out.push(p);
            cur = p;
        }
        out
    }

    /// Depth-first preorder walk from `start`: a group precedes its
    /// children, children follow their declared order.
    pub fn preorder(&self, start: LayerId) -> Vec<LayerId> {
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(layer) = self.layers.get(&id) else {
                continue;
            };
            out.push(id);
            stack.extend(layer.children().iter().rev().copied());
        }
        out
    }

    pub fn add_layer(&mut self, parent: LayerId, layer: Layer) -> Result<LayerId, MapError> {
        let len = self.group_children(parent)?.len();
        self.insert_layer(parent, len, layer)
    }

    /// Inserts at `index` within `parent` (clamped to the end).
    pub fn insert_layer(
        &mut self,
        parent: LayerId,
        index: usize,
        mut layer: Layer,
    ) -> Result<LayerId, MapError> {
        self.group_children(parent)?;
        let id = LayerId(self.layer_ids.next_raw());
        layer.id = id;
        if let LayerKind::Group { layers } = &mut layer.kind {
            layers.clear();
        }
        if let Some(source) = layer.feature_source_mut() {
            source.id = SourceId(self.source_ids.next_raw());
            for mut feature in std::mem::take(&mut source.pending) {
                feature.id = FeatureId(self.feature_ids.next_raw());
                source.features.insert(feature.id, feature);
            }
        }
        self.layers.insert(id, layer);
        self.parents.insert(id, parent);
        if let Some(Layer {
            kind: LayerKind::Group { layers },
            ..
        }) = self.layers.get_mut(&parent)
        {
            let at = index.min(layers.len());
            layers.insert(at, id);
        }
        self.events.emit(MapEvent::LayerAdded { parent, layer: id });
        Ok(id)
    }

    /// Detaches `id` and its whole subtree.
    pub fn remove_layer(&mut self, id: LayerId) -> Result<Layer, MapError> {
        if id == self.root {
            return Err(MapError::RootLayer);
        }
        let parent = self.parent(id).ok_or(MapError::UnknownLayer(id))?;
        for descendant in self.preorder(id).into_iter().skip(1) {
            self.layers.remove(&descendant);
            self.parents.remove(&descendant);
        }
        self.parents.remove(&id);
        let layer = self.layers.remove(&id).ok_or(MapError::UnknownLayer(id))?;
        if let Some(Layer {
            kind: LayerKind::Group { layers },
            ..
        }) = self.layers.get_mut(&parent)
        {
            layers.retain(|l| *l != id);
        }
        self.events.emit(MapEvent::LayerRemoved { parent, layer: id });
        Ok(layer)
    }

    pub fn set_opacity(&mut self, id: LayerId, opacity: f64) -> Result<(), MapError> {
        self.layer_mut(id)?.opacity = opacity;
        self.changed(id, LayerProperty::Opacity);
        Ok(())
    }

    pub fn set_visible(&mut self, id: LayerId, visible: bool) -> Result<(), MapError> {
        self.layer_mut(id)?.visible = visible;
        self.changed(id, LayerProperty::Visible);
        Ok(())
    }

    pub fn set_z_index(&mut self, id: LayerId, z_index: i32) -> Result<(), MapError> {
        self.layer_mut(id)?.z_index = z_index;
        self.changed(id, LayerProperty::ZIndex);
        Ok(())
    }

    pub fn set_extent(&mut self, id: LayerId, extent: Option<Extent>) -> Result<(), MapError> {
        self.layer_mut(id)?.extent = extent;
        self.changed(id, LayerProperty::Extent);
        Ok(())
    }

    /// Replaces a tile layer's source and announces a generic change.
    pub fn set_tile_source(&mut self, id: LayerId, source: TileSource) -> Result<(), MapError> {
        match &mut self.layer_mut(id)?.kind {
            LayerKind::Tile { source: s } => *s = source,
            _ => return Err(MapError::NoFeatureSource(id)),
        }
        self.changed(id, LayerProperty::Source);
        Ok(())
    }

    /// Announces a generic change without modifying anything.
    pub fn touch(&mut self, id: LayerId) -> Result<(), MapError> {
        self.layer_mut(id)?;
        self.changed(id, LayerProperty::Source);
        Ok(())
    }

    pub fn add_feature(&mut self, layer: LayerId, mut feature: Feature) -> Result<FeatureId, MapError> {
        feature.id = FeatureId(self.feature_ids.next_raw());
        let id = feature.id;
        let source = self.feature_source_mut(layer)?;
        source.features.insert(id, feature);
        let source = source.id;
        self.events.emit(MapEvent::FeatureAdded { source, feature: id });
        Ok(id)
    }

    pub fn remove_feature(&mut self, layer: LayerId, feature: FeatureId) -> Result<Feature, MapError> {
        let source = self.feature_source_mut(layer)?;
        let removed = source
            .features
            .remove(&feature)
            .ok_or(MapError::UnknownFeature(feature))?;
        let source = source.id;
        self.events.emit(MapEvent::FeatureRemoved { source, feature });
        Ok(removed)
    }

    /// Mutates a feature in place and announces the change.
    pub fn update_feature<F>(&mut self, layer: LayerId, feature: FeatureId, f: F) -> Result<(), MapError>
    where
        F: FnOnce(&mut Feature),
    {
        let source = self.feature_source_mut(layer)?;
        let target = source
            .features
            .get_mut(&feature)
            .ok_or(MapError::UnknownFeature(feature))?;
        f(target);
        let source = source.id;
        self.events.emit(MapEvent::FeatureChanged { source, feature });
        Ok(())
    }

    pub fn clear_source(&mut self, layer: LayerId) -> Result<(), MapError> {
        let source = self.feature_source_mut(layer)?;
        let features: Vec<FeatureId> = std::mem::take(&mut source.features).into_keys().collect();
        let source = source.id;
        self.events.emit(MapEvent::SourceCleared { source, features });
        Ok(())
    }

    pub fn images(&self) -> &ImageRegistry {
        &self.images
    }

    pub fn register_image(&mut self, src: impl Into<String>, loaded: bool) -> ImageId {
        self.images.register(src, loaded)
    }

    /// Marks an image loaded; the event fires only on the first call.
    pub fn image_loaded(&mut self, image: ImageId) {
        if self.images.mark_loaded(image) {
            self.events.emit(MapEvent::ImageLoaded { image });
        }
    }

    pub fn events(&self) -> &[MapEvent] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<MapEvent> {
        self.events.drain()
    }

    fn changed(&mut self, layer: LayerId, property: LayerProperty) {
        self.events.emit(MapEvent::LayerChanged { layer, property });
    }

    fn layer_mut(&mut self, id: LayerId) -> Result<&mut Layer, MapError> {
        self.layers.get_mut(&id).ok_or(MapError::UnknownLayer(id))
    }

    fn group_children(&self, id: LayerId) -> Result<&[LayerId], MapError> {
        let layer = self.layers.get(&id).ok_or(MapError::UnknownLayer(id))?;
        if !layer.is_group() {
            return Err(MapError::NotAGroup(id));
        }
        Ok(layer.children())
    }

    fn feature_source_mut(&mut self, id: LayerId) -> Result<&mut crate::source::VectorSource, MapError> {
        self.layer_mut(id)?
            .feature_source_mut()
            .ok_or(MapError::NoFeatureSource(id))
    }
}
