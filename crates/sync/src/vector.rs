//! Vector, image-vector and cluster layers as scene counterparts.

use std::collections::BTreeSet;

use convert::{ClusterConverter, ClusterStyleOverride, ImageGate, LayerConverter};
use foundation::{ImageId, LayerId};
use layers::{EventKind, EventTarget, LayerKind, LayerProperty, Map, MapEvent};
use scene::{CounterpartId, LayerCounterpart, Scene, ScreenProjector};
use tracing::{debug, trace};

use crate::engine::{
    LayerEntry, LayerSynchronizer, Reaction, Subscriptions, SyncAction, SyncTarget, tree_visible,
};
use crate::error::SyncError;

pub type VectorSynchronizer = LayerSynchronizer<VectorTarget>;

#[derive(Debug)]
pub struct VectorTarget {
    converter: ClusterConverter,
    gate: ImageGate,
    /// Cluster counterparts whose entities changed since the last pass.
    recluster_pending: BTreeSet<CounterpartId>,
}

impl VectorTarget {
    pub fn new(converter: ClusterConverter) -> Self {
        Self {
            converter,
            gate: ImageGate::new(),
            recluster_pending: BTreeSet::new(),
        }
    }

    pub fn converter(&self) -> &ClusterConverter {
        &self.converter
    }

    pub fn gate(&self) -> &ImageGate {
        &self.gate
    }

    fn mark_recluster(&mut self, scene: &Scene, handle: CounterpartId) {
        let clustered = scene
            .counterparts
            .get(handle)
            .and_then(LayerCounterpart::data_source)
            .is_some_and(|ds| ds.clustering.enabled);
        if clustered {
            self.recluster_pending.insert(handle);
        }
    }

    fn feature_event(
        &mut self,
        map: &Map,
        scene: &mut Scene,
        layer_id: LayerId,
        handle: CounterpartId,
        event: &MapEvent,
    ) -> Result<(), SyncError> {
        let layer = map.layer(layer_id).ok_or(SyncError::UnknownLayer(layer_id))?;
        let Some(counterpart) = scene.counterparts.get_mut(handle) else {
            return Ok(());
        };
        match event {
            MapEvent::FeatureAdded { feature, .. } => {
                if let Some(f) = layer.feature_source().and_then(|s| s.feature(*feature)) {
                    self.converter.add_feature(
                        counterpart,
                        layer,
                        f,
                        map.view(),
                        map.images(),
                        &mut self.gate,
                    )?;
                }
            }
            MapEvent::FeatureRemoved { source, feature } => {
                self.gate.cancel(*source, *feature);
                counterpart.remove_feature(*feature);
            }
            MapEvent::FeatureChanged { source, feature } => {
                self.gate.cancel(*source, *feature);
                counterpart.remove_feature(*feature);
                if let Some(f) = layer.feature_source().and_then(|s| s.feature(*feature)) {
                    self.converter.add_feature(
                        counterpart,
                        layer,
                        f,
                        map.view(),
                        map.images(),
                        &mut self.gate,
                    )?;
                }
            }
            MapEvent::SourceCleared { source, .. } => {
                self.gate.clear(*source);
                counterpart.clear_features();
            }
            _ => return Ok(()),
        }
        trace!(layer = %layer_id, ?event, "feature change applied");
        self.mark_recluster(scene, handle);
        Ok(())
    }
}

impl SyncTarget for VectorTarget {
    type Handle = CounterpartId;

    /// Tile layers are left to the raster synchronizer. Image layers
    /// without a vector source get an empty counterpart.
    fn create_single_layer_counterparts(
        &mut self,
        map: &Map,
        scene: &mut Scene,
        layer_id: LayerId,
        ancestry: &[LayerId],
        subscriptions: &mut Subscriptions<'_>,
    ) -> Result<Option<Vec<CounterpartId>>, SyncError> {
        let layer = map.layer(layer_id).ok_or(SyncError::UnknownLayer(layer_id))?;
        if !matches!(layer.kind, LayerKind::Vector { .. } | LayerKind::Image { .. }) {
            return Ok(None);
        }
        let mut counterpart =
            self.converter
                .layer_counterpart(layer, map.view(), map.images(), &mut self.gate)?;
        counterpart.set_show(tree_visible(map, layer_id));
        let handle = scene.counterparts.add(counterpart);
        self.mark_recluster(scene, handle);

        for target in std::iter::once(layer_id).chain(ancestry.iter().copied()) {
            subscriptions.listen(
                EventTarget::Layer(target),
                &[EventKind::Changed(LayerProperty::Visible)],
                SyncAction::Appearance(layer_id),
            );
        }
        if let Some(source) = layer.feature_source() {
            subscriptions.listen(
                EventTarget::Source(source.id()),
                &[
                    EventKind::FeatureAdded,
                    EventKind::FeatureRemoved,
                    EventKind::FeatureChanged,
                    EventKind::SourceCleared,
                ],
                SyncAction::Features(layer_id),
            );
        }
        Ok(Some(vec![handle]))
    }

    fn remove_counterpart(&mut self, scene: &mut Scene, handle: CounterpartId, destroy: bool) {
        self.recluster_pending.remove(&handle);
        if let Some(mut counterpart) = scene.counterparts.remove(handle)
            && destroy
        {
            counterpart.destroy();
        }
    }

    fn raise_to_top(&mut self, scene: &mut Scene, handle: CounterpartId) {
        scene.counterparts.raise_to_top(handle);
    }

    fn handle_event(
        &mut self,
        map: &Map,
        scene: &mut Scene,
        entry: &LayerEntry<CounterpartId>,
        action: SyncAction,
        event: &MapEvent,
    ) -> Result<Reaction, SyncError> {
        match action {
            SyncAction::Appearance(layer) => {
                let show = tree_visible(map, layer);
                for handle in &entry.handles {
                    if let Some(counterpart) = scene.counterparts.get_mut(*handle) {
                        counterpart.set_show(show);
                    }
                }
            }
            SyncAction::Features(layer) => {
                for handle in &entry.handles {
                    self.feature_event(map, scene, layer, *handle, event)?;
                }
            }
            _ => {}
        }
        Ok(Reaction::Done)
    }

    fn image_loaded(&mut self, scene: &mut Scene, handles: &[CounterpartId], image: ImageId) {
        for handle in handles {
            let Some(counterpart) = scene.counterparts.get_mut(*handle) else {
                continue;
            };
            let done = counterpart.complete_image(image);
            for (feature, token) in &done.settled {
                self.gate.finish(*feature, token);
            }
            if done.created > 0 {
                debug!(%image, created = done.created, "deferred billboards created");
            }
            self.mark_recluster(scene, *handle);
        }
    }
}

impl LayerSynchronizer<VectorTarget> {
    pub fn counterpart<'s>(&self, scene: &'s Scene, layer: LayerId) -> Option<&'s LayerCounterpart> {
        let handle = self.handles(layer).first()?;
        scene.counterparts.get(*handle)
    }

    pub fn needs_recluster(&self) -> bool {
        !self.target.recluster_pending.is_empty()
    }

    /// Installs or removes the cluster styling hook of `layer` and marks
    /// its counterpart for restyling.
    pub fn set_cluster_style(
        &mut self,
        scene: &Scene,
        layer: LayerId,
        style: Option<ClusterStyleOverride>,
    ) {
        self.target.converter.set_layer_style(layer, style);
        if let Some(handle) = self.handles(layer).first().copied() {
            self.target.mark_recluster(scene, handle);
        }
    }

    /// Regroups and restyles the entities of every cluster counterpart
    /// that changed since the last pass. Returns how many were redone.
    pub fn recluster(&mut self, map: &Map, scene: &mut Scene, projector: &dyn ScreenProjector) -> usize {
        let pending = std::mem::take(&mut self.target.recluster_pending);
        let mut done = 0;
        for handle in pending {
            let Some(counterpart) = scene.counterparts.get_mut(handle) else {
                continue;
            };
            let Some(layer) = map.layer(counterpart.layer()) else {
                continue;
            };
            let Some(ds) = counterpart.data_source_mut() else {
                continue;
            };
            let mut clusters = ds.compute_clusters(projector);
            for cluster in &mut clusters {
                self.target
                    .converter
                    .style_cluster(layer, &ds.entities, cluster, map.images());
            }
            debug!(layer = %layer.id(), clusters = clusters.len(), "reclustered");
            ds.clusters = clusters;
            done += 1;
        }
        done
    }
}
