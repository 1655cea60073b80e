//! Generic layer-tree reconciliation.
//!
//! A [`LayerSynchronizer`] mirrors every layer of a [`Map`] into a
//! [`Scene`]. What a layer turns into is decided by a [`SyncTarget`]; the
//! engine owns the per-layer bookkeeping: which scene objects belong to
//! which layer, which subscriptions keep them current, and the paint
//! order. Subscriptions are disposed before their entry is dropped, so a
//! layer is never half torn down.

use std::collections::BTreeMap;
use std::fmt;

use foundation::{ImageId, LayerId};
use layers::{EventKind, EventTarget, LayerProperty, Map, MapEvent};
use runtime::{ListenerKey, ListenerRegistry};
use scene::Scene;
use tracing::{debug, trace};

use crate::error::SyncError;
use crate::ordering::paint_order;

/// What a subscription asks the synchronizer to do.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// A layer joined or left the group that emitted the event.
    Tree,
    /// The z-index of a tracked layer changed.
    Reorder,
    /// Opacity or visibility of the layer or one of its groups changed.
    Appearance(LayerId),
    /// The layer extent changed; extents cannot be updated in place.
    Extent(LayerId),
    /// Generic change of the layer.
    Refresh(LayerId),
    /// Feature-level change in the layer's source.
    Features(LayerId),
}

impl SyncAction {
    /// Layer whose entry handles the action, if any.
    pub fn owner(self) -> Option<LayerId> {
        match self {
            SyncAction::Tree | SyncAction::Reorder => None,
            SyncAction::Appearance(l)
            | SyncAction::Extent(l)
            | SyncAction::Refresh(l)
            | SyncAction::Features(l) => Some(l),
        }
    }
}

pub type Listeners = ListenerRegistry<EventTarget, EventKind, SyncAction>;

/// Subscriptions made while building one layer entry.
pub struct Subscriptions<'a> {
    registry: &'a mut Listeners,
    keys: Vec<ListenerKey>,
}

impl<'a> Subscriptions<'a> {
    fn new(registry: &'a mut Listeners) -> Self {
        Self {
            registry,
            keys: Vec::new(),
        }
    }

    pub fn listen(&mut self, target: EventTarget, kinds: &[EventKind], action: SyncAction) {
        let key = self.registry.listen(target, kinds, action);
        self.keys.push(key);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn into_keys(self) -> Vec<ListenerKey> {
        self.keys
    }
}

/// Scene objects and subscriptions owned by one layer.
#[derive(Debug, Clone)]
pub struct LayerEntry<H> {
    pub layer: LayerId,
    /// Enclosing groups when the entry was built, nearest first.
    pub ancestry: Vec<LayerId>,
    pub handles: Vec<H>,
    listener_keys: Vec<ListenerKey>,
}

impl<H> LayerEntry<H> {
    pub fn listener_keys(&self) -> &[ListenerKey] {
        &self.listener_keys
    }
}

#[derive(Debug)]
pub struct SynchronizerState<H> {
    entries: BTreeMap<LayerId, LayerEntry<H>>,
    listeners: Listeners,
}

impl<H> Default for SynchronizerState<H> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            listeners: Listeners::new(),
        }
    }
}

impl<H> SynchronizerState<H> {
    pub fn get(&self, layer: LayerId) -> Option<&LayerEntry<H>> {
        self.entries.get(&layer)
    }

    pub fn contains(&self, layer: LayerId) -> bool {
        self.entries.contains_key(&layer)
    }

    pub fn layers(&self) -> Vec<LayerId> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Detaches the entry of `layer`, disposing its subscriptions first.
    fn take(&mut self, layer: LayerId) -> Option<LayerEntry<H>> {
        let keys = self.entries.get(&layer)?.listener_keys.clone();
        self.listeners.unlisten_all(keys);
        self.entries.remove(&layer)
    }
}

/// Outcome of a layer-level event.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Reaction {
    Done,
    /// Tear the layer down and build it again.
    Recreate,
}

/// One kind of scene counterpart, e.g. primitives or imagery.
pub trait SyncTarget {
    type Handle: Copy + PartialEq + fmt::Debug;

    /// Builds and adds the counterparts of a non-group layer.
    ///
    /// `Ok(None)` means the layer is not mirrored by this target.
    fn create_single_layer_counterparts(
        &mut self,
        map: &Map,
        scene: &mut Scene,
        layer: LayerId,
        ancestry: &[LayerId],
        subscriptions: &mut Subscriptions<'_>,
    ) -> Result<Option<Vec<Self::Handle>>, SyncError>;

    fn remove_counterpart(&mut self, scene: &mut Scene, handle: Self::Handle, destroy: bool);

    fn raise_to_top(&mut self, scene: &mut Scene, handle: Self::Handle);

    fn handle_event(
        &mut self,
        map: &Map,
        scene: &mut Scene,
        entry: &LayerEntry<Self::Handle>,
        action: SyncAction,
        event: &MapEvent,
    ) -> Result<Reaction, SyncError>;

    /// Called once per loaded image with every tracked handle.
    fn image_loaded(&mut self, _scene: &mut Scene, _handles: &[Self::Handle], _image: ImageId) {}
}

/// Product of the opacities of `layer` and its enclosing groups.
pub fn tree_opacity(map: &Map, layer: LayerId) -> f64 {
    std::iter::once(layer)
        .chain(map.ancestry(layer))
        .filter_map(|id| map.layer(id))
        .map(|l| l.opacity)
        .product()
}

/// Whether `layer` and all its enclosing groups are visible.
pub fn tree_visible(map: &Map, layer: LayerId) -> bool {
    std::iter::once(layer)
        .chain(map.ancestry(layer))
        .filter_map(|id| map.layer(id))
        .all(|l| l.visible)
}

/// Keeps a scene in step with a map's layer tree.
#[derive(Debug)]
pub struct LayerSynchronizer<T: SyncTarget> {
    pub(crate) target: T,
    pub(crate) state: SynchronizerState<T::Handle>,
    synchronized: bool,
}

impl<T: SyncTarget> LayerSynchronizer<T> {
    pub fn new(target: T) -> Self {
        Self {
            target,
            state: SynchronizerState::default(),
            synchronized: false,
        }
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    pub fn state(&self) -> &SynchronizerState<T::Handle> {
        &self.state
    }

    pub fn is_synchronized(&self) -> bool {
        self.synchronized
    }

    /// Handles of the counterparts built for `layer`.
    pub fn handles(&self, layer: LayerId) -> &[T::Handle] {
        self.state
            .get(layer)
            .map(|e| e.handles.as_slice())
            .unwrap_or(&[])
    }

    /// Rebuilds everything: tears down all counterparts, mirrors every
    /// layer of the tree depth-first, then applies the paint order.
    ///
    /// On failure nothing built by this pass stays registered.
    pub fn synchronize(&mut self, map: &Map, scene: &mut Scene) -> Result<(), SyncError> {
        self.destroy_all(scene);
        self.synchronized = false;
        if let Err(err) = self.add_subtree(map, scene, map.root()) {
            self.destroy_all(scene);
            return Err(err);
        }
        self.synchronized = true;
        self.order_layers(map, scene);
        debug!(
            layers = self.state.len(),
            listeners = self.state.listener_count(),
            "synchronized layer tree"
        );
        Ok(())
    }

    /// Applies queued map events in order.
    pub fn process_events(
        &mut self,
        map: &Map,
        scene: &mut Scene,
        events: &[MapEvent],
    ) -> Result<(), SyncError> {
        if !self.synchronized {
            return Err(SyncError::NotSynchronized);
        }
        for event in events {
            if let MapEvent::ImageLoaded { image } = event {
                let handles: Vec<T::Handle> = self
                    .state
                    .entries
                    .values()
                    .flat_map(|e| e.handles.iter().copied())
                    .collect();
                self.target.image_loaded(scene, &handles, *image);
                continue;
            }
            for (key, action) in self.state.listeners.dispatch(&event.target(), &event.kind()) {
                // An earlier action of the same event may have dropped this one.
                if !self.state.listeners.contains(key) {
                    continue;
                }
                self.apply(map, scene, action, event)?;
            }
        }
        Ok(())
    }

    fn apply(
        &mut self,
        map: &Map,
        scene: &mut Scene,
        action: SyncAction,
        event: &MapEvent,
    ) -> Result<(), SyncError> {
        trace!(?action, ?event, "applying map event");
        match (action, event) {
            (SyncAction::Tree, MapEvent::LayerAdded { layer, .. }) => {
                if map.contains_layer(*layer) {
                    self.add_subtree(map, scene, *layer)?;
                    self.order_layers(map, scene);
                }
            }
            (SyncAction::Tree, MapEvent::LayerRemoved { layer, .. }) => {
                self.remove_subtree(scene, *layer);
            }
            (SyncAction::Reorder, _) => self.order_layers(map, scene),
            _ => {
                let Some(owner) = action.owner() else {
                    return Ok(());
                };
                let Some(entry) = self.state.entries.get(&owner) else {
                    return Ok(());
                };
                let reaction = self.target.handle_event(map, scene, entry, action, event)?;
                if reaction == Reaction::Recreate {
                    debug!(layer = %owner, "recreating layer counterparts");
                    self.remove_layer(scene, owner, true);
                    if map.contains_layer(owner) {
                        self.add_layer(map, scene, owner)?;
                        self.order_layers(map, scene);
                    }
                }
            }
        }
        Ok(())
    }

    fn add_subtree(&mut self, map: &Map, scene: &mut Scene, start: LayerId) -> Result<(), SyncError> {
        for id in map.preorder(start) {
            self.add_layer(map, scene, id)?;
        }
        Ok(())
    }

    fn add_layer(&mut self, map: &Map, scene: &mut Scene, id: LayerId) -> Result<(), SyncError> {
        let layer = map.layer(id).ok_or(SyncError::UnknownLayer(id))?;
        self.remove_layer(scene, id, true);
        let ancestry = map.ancestry(id);

        let mut subscriptions = Subscriptions::new(&mut self.state.listeners);
        let handles = if layer.is_group() {
            subscriptions.listen(
                EventTarget::Layer(id),
                &[EventKind::LayerAdded, EventKind::LayerRemoved],
                SyncAction::Tree,
            );
            Vec::new()
        } else {
            match self
                .target
                .create_single_layer_counterparts(map, scene, id, &ancestry, &mut subscriptions)
            {
                Ok(Some(handles)) => handles,
                Ok(None) => {
                    let keys = subscriptions.into_keys();
                    self.state.listeners.unlisten_all(keys);
                    trace!(layer = %id, "layer not mirrored");
                    return Ok(());
                }
                Err(err) => {
                    let keys = subscriptions.into_keys();
                    self.state.listeners.unlisten_all(keys);
                    return Err(err);
                }
            }
        };
        subscriptions.listen(
            EventTarget::Layer(id),
            &[EventKind::Changed(LayerProperty::ZIndex)],
            SyncAction::Reorder,
        );
        let listener_keys = subscriptions.into_keys();
        debug!(layer = %id, counterparts = handles.len(), "layer entry created");
        self.state.entries.insert(
            id,
            LayerEntry {
                layer: id,
                ancestry,
                handles,
                listener_keys,
            },
        );
        Ok(())
    }

    /// Drops the entry of `layer`: subscriptions first, then its scene
    /// objects. Returns `false` when the layer was not tracked.
    pub fn remove_layer(&mut self, scene: &mut Scene, layer: LayerId, destroy: bool) -> bool {
        let Some(entry) = self.state.take(layer) else {
            return false;
        };
        for handle in entry.handles {
            self.target.remove_counterpart(scene, handle, destroy);
        }
        debug!(layer = %layer, "layer entry removed");
        true
    }

    /// Removes `layer` and every tracked layer below it.
    pub fn remove_subtree(&mut self, scene: &mut Scene, layer: LayerId) -> usize {
        let doomed: Vec<LayerId> = self
            .state
            .entries
            .values()
            .filter(|e| e.layer == layer || e.ancestry.contains(&layer))
            .map(|e| e.layer)
            .collect();
        doomed
            .into_iter()
            .filter(|id| self.remove_layer(scene, *id, true))
            .count()
    }

    pub fn destroy_all(&mut self, scene: &mut Scene) {
        for layer in self.state.layers() {
            self.remove_layer(scene, layer, true);
        }
    }

    /// Raises counterparts in 2D paint order so the last painted layer
    /// ends up on top.
    pub fn order_layers(&mut self, map: &Map, scene: &mut Scene) {
        for layer in paint_order(map) {
            if let Some(entry) = self.state.entries.get(&layer) {
                for handle in &entry.handles {
                    self.target.raise_to_top(scene, *handle);
                }
            }
        }
        trace!("layer order applied");
    }
}

#[cfg(test)]
mod tests {
    use super::{
        LayerEntry, LayerSynchronizer, Reaction, Subscriptions, SyncAction, SyncTarget,
        tree_opacity, tree_visible,
    };
    use crate::error::SyncError;
    use foundation::{LayerId, Projection};
    use layers::{EventKind, EventTarget, Layer, LayerProperty, Map, MapEvent, VectorSource, View};
    use pretty_assertions::assert_eq;
    use scene::Scene;

    /// Records calls instead of touching the scene.
    #[derive(Debug, Default)]
    struct Recorder {
        next: u32,
        live: Vec<u32>,
        raised: Vec<u32>,
        refuse: Option<LayerId>,
    }

    impl SyncTarget for Recorder {
        type Handle = u32;

        fn create_single_layer_counterparts(
            &mut self,
            _map: &Map,
            _scene: &mut Scene,
            layer: LayerId,
            _ancestry: &[LayerId],
            subscriptions: &mut Subscriptions<'_>,
        ) -> Result<Option<Vec<u32>>, SyncError> {
            if self.refuse == Some(layer) {
                return Ok(None);
            }
            subscriptions.listen(
                EventTarget::Layer(layer),
                &[EventKind::Changed(LayerProperty::Extent)],
                SyncAction::Extent(layer),
            );
            self.next += 1;
            self.live.push(self.next);
            Ok(Some(vec![self.next]))
        }

        fn remove_counterpart(&mut self, _scene: &mut Scene, handle: u32, _destroy: bool) {
            self.live.retain(|h| *h != handle);
        }

        fn raise_to_top(&mut self, _scene: &mut Scene, handle: u32) {
            self.raised.push(handle);
        }

        fn handle_event(
            &mut self,
            _map: &Map,
            _scene: &mut Scene,
            _entry: &LayerEntry<u32>,
            action: SyncAction,
            _event: &MapEvent,
        ) -> Result<Reaction, SyncError> {
            Ok(match action {
                SyncAction::Extent(_) => Reaction::Recreate,
                _ => Reaction::Done,
            })
        }
    }

    fn map() -> Map {
        Map::new(View::new(Projection::Epsg4326, 1.0))
    }

    fn vector() -> Layer {
        Layer::vector(VectorSource::new())
    }

    #[test]
    fn events_before_synchronize_are_rejected() {
        let map = map();
        let mut scene = Scene::default();
        let mut sync = LayerSynchronizer::new(Recorder::default());
        assert_eq!(
            sync.process_events(&map, &mut scene, &[]),
            Err(SyncError::NotSynchronized)
        );
    }

    #[test]
    fn synchronize_twice_gives_the_same_entries() {
        let mut map = map();
        let group = map.add_layer(map.root(), Layer::group()).unwrap();
        map.add_layer(group, vector()).unwrap();
        map.add_layer(map.root(), vector()).unwrap();
        let mut scene = Scene::default();
        let mut sync = LayerSynchronizer::new(Recorder::default());

        sync.synchronize(&map, &mut scene).unwrap();
        let first = (sync.state().len(), sync.state().listener_count(), sync.target().live.len());
        sync.synchronize(&map, &mut scene).unwrap();
        let second = (sync.state().len(), sync.state().listener_count(), sync.target().live.len());
        assert_eq!(first, (4, 8, 2));
        assert_eq!(first, second);
    }

    #[test]
    fn unmirrored_layers_leave_no_listeners() {
        let mut map = map();
        let skipped = map.add_layer(map.root(), vector()).unwrap();
        let mut scene = Scene::default();
        let mut sync = LayerSynchronizer::new(Recorder {
            refuse: Some(skipped),
            ..Recorder::default()
        });
        sync.synchronize(&map, &mut scene).unwrap();
        assert!(!sync.state().contains(skipped));
        assert_eq!(sync.state().listener_count(), 2);
    }

    #[test]
    fn removing_a_group_drops_its_whole_subtree() {
        let mut map = map();
        let group = map.add_layer(map.root(), Layer::group()).unwrap();
        let inner = map.add_layer(group, vector()).unwrap();
        let outer = map.add_layer(map.root(), vector()).unwrap();
        let mut scene = Scene::default();
        let mut sync = LayerSynchronizer::new(Recorder::default());
        sync.synchronize(&map, &mut scene).unwrap();
        map.drain_events();

        map.remove_layer(group).unwrap();
        let events = map.drain_events();
        sync.process_events(&map, &mut scene, &events).unwrap();
        assert!(!sync.state().contains(group));
        assert!(!sync.state().contains(inner));
        assert!(sync.state().contains(outer));
        assert_eq!(sync.target().live.len(), 1);
        assert_eq!(sync.state().listener_count(), 2 + 2);
    }

    #[test]
    fn added_layers_are_mirrored_and_ordered() {
        let mut map = map();
        let mut scene = Scene::default();
        let mut sync = LayerSynchronizer::new(Recorder::default());
        sync.synchronize(&map, &mut scene).unwrap();

        let low = map.add_layer(map.root(), vector().with_z_index(5)).unwrap();
        let high = map.add_layer(map.root(), vector().with_z_index(1)).unwrap();
        let events = map.drain_events();
        sync.process_events(&map, &mut scene, &events).unwrap();

        let raised = &sync.target().raised;
        let tail = &raised[raised.len() - 2..];
        assert_eq!(tail, &[sync.handles(high)[0], sync.handles(low)[0]]);
    }

    #[test]
    fn extent_changes_rebuild_only_that_layer() {
        let mut map = map();
        let a = map.add_layer(map.root(), vector()).unwrap();
        let b = map.add_layer(map.root(), vector()).unwrap();
        let mut scene = Scene::default();
        let mut sync = LayerSynchronizer::new(Recorder::default());
        sync.synchronize(&map, &mut scene).unwrap();
        map.drain_events();
        let before_b = sync.handles(b).to_vec();
        let before_a = sync.handles(a).to_vec();

        map.set_extent(a, Some(foundation::Extent::from_array([0.0, 0.0, 1.0, 1.0])))
            .unwrap();
        let events = map.drain_events();
        sync.process_events(&map, &mut scene, &events).unwrap();
        assert_ne!(sync.handles(a), before_a.as_slice());
        assert_eq!(sync.handles(b), before_b.as_slice());
        assert_eq!(sync.target().live.len(), 2);
    }

    #[test]
    fn tree_properties_combine_over_ancestry() {
        let mut map = map();
        let group = map.add_layer(map.root(), Layer::group().with_opacity(0.5)).unwrap();
        let layer = map.add_layer(group, vector().with_opacity(0.5)).unwrap();
        assert_eq!(tree_opacity(&map, layer), 0.25);
        assert!(tree_visible(&map, layer));
        map.set_visible(group, false).unwrap();
        assert!(!tree_visible(&map, layer));
    }

    #[test]
    fn unrelated_events_are_ignored() {
        let mut map = map();
        let mut scene = Scene::default();
        let mut sync = LayerSynchronizer::new(Recorder::default());
        sync.synchronize(&map, &mut scene).unwrap();
        let icon = map.register_image("x.png", false);
        map.image_loaded(icon);
        let events = map.drain_events();
        assert!(matches!(events[0], MapEvent::ImageLoaded { .. }));
        sync.process_events(&map, &mut scene, &events).unwrap();
        assert_eq!(sync.state().len(), 1);
    }
}
