//! Tiled WMS layers as imagery layers.
//!
//! Only WMS tile sources are mirrored. An imagery layer is created hidden
//! and shown once the combined opacity and visibility of its layer and
//! enclosing groups have been applied.

use foundation::{Extent, LayerId, Projection};
use layers::{EventKind, EventTarget, LayerKind, LayerProperty, Map, MapEvent, TileSource, TileWmsSource};
use scene::{ImageryLayer, ImageryLayerId, Scene, WmsImageryProvider};
use tracing::{debug, warn};

use crate::engine::{
    LayerEntry, LayerSynchronizer, Reaction, Subscriptions, SyncAction, SyncTarget, tree_opacity,
    tree_visible,
};
use crate::error::SyncError;
use crate::lod::{LodOptions, min_max_level};

pub type RasterSynchronizer = LayerSynchronizer<RasterTarget>;

#[derive(Debug, Default)]
pub struct RasterTarget {
    lod: LodOptions,
}

impl RasterTarget {
    pub fn new(lod: LodOptions) -> Self {
        Self { lod }
    }

    pub fn lod(&self) -> &LodOptions {
        &self.lod
    }
}

/// Provider parameters for `wms`.
///
/// Bounds, tile size and zoom range are only known when the source has a
/// tile grid and both an extent and a projection are available.
pub fn wms_provider(
    wms: &TileWmsSource,
    extent: Option<&Extent>,
    projection: Option<&Projection>,
    lod: &LodOptions,
) -> WmsImageryProvider {
    let url = wms.urls.first().cloned().unwrap_or_default();
    let mut provider = WmsImageryProvider::new(url, wms.layers_param().unwrap_or_default());
    provider.parameters = wms.params.clone();
    let (Some(grid), Some(extent), Some(projection)) = (&wms.tile_grid, extent, projection) else {
        return provider;
    };
    provider.rectangle = Some(projection.extent_to_lon_lat(extent));
    provider.tile_width = Some(grid.tile_size[0]);
    provider.tile_height = Some(grid.tile_size[1]);
    if let Some([min, max]) = min_max_level(grid, extent, projection, lod) {
        provider.minimum_level = Some(min);
        provider.maximum_level = Some(max);
    }
    provider
}

fn wms_source(map: &Map, layer: LayerId) -> Option<&TileWmsSource> {
    match &map.layer(layer)?.kind {
        LayerKind::Tile {
            source: TileSource::Wms(wms),
        } => Some(wms),
        _ => None,
    }
}

fn apply_appearance(map: &Map, layer: LayerId, imagery: &mut ImageryLayer) {
    imagery.alpha = tree_opacity(map, layer);
    imagery.show = tree_visible(map, layer);
}

impl SyncTarget for RasterTarget {
    type Handle = ImageryLayerId;

    fn create_single_layer_counterparts(
        &mut self,
        map: &Map,
        scene: &mut Scene,
        layer_id: LayerId,
        ancestry: &[LayerId],
        subscriptions: &mut Subscriptions<'_>,
    ) -> Result<Option<Vec<ImageryLayerId>>, SyncError> {
        let layer = map.layer(layer_id).ok_or(SyncError::UnknownLayer(layer_id))?;
        let wms = match &layer.kind {
            LayerKind::Tile {
                source: TileSource::Wms(wms),
            } => wms,
            LayerKind::Tile { .. } => {
                warn!(layer = %layer_id, "tile source is not WMS, layer not mirrored");
                return Ok(None);
            }
            _ => return Ok(None),
        };
        let provider = wms_provider(
            wms,
            layer.extent.as_ref(),
            map.view().projection.as_ref(),
            &self.lod,
        );
        debug!(
            layer = %layer_id,
            url = %provider.url,
            levels = ?(provider.minimum_level, provider.maximum_level),
            "creating imagery layer"
        );
        let mut imagery = ImageryLayer::new(provider);
        apply_appearance(map, layer_id, &mut imagery);
        let handle = scene.imagery_layers.add(imagery);

        for target in std::iter::once(layer_id).chain(ancestry.iter().copied()) {
            subscriptions.listen(
                EventTarget::Layer(target),
                &[
                    EventKind::Changed(LayerProperty::Opacity),
                    EventKind::Changed(LayerProperty::Visible),
                ],
                SyncAction::Appearance(layer_id),
            );
        }
        subscriptions.listen(
            EventTarget::Layer(layer_id),
            &[EventKind::Changed(LayerProperty::Extent)],
            SyncAction::Extent(layer_id),
        );
        subscriptions.listen(
            EventTarget::Layer(layer_id),
            &[EventKind::Changed(LayerProperty::Source)],
            SyncAction::Refresh(layer_id),
        );
        Ok(Some(vec![handle]))
    }

    fn remove_counterpart(&mut self, scene: &mut Scene, handle: ImageryLayerId, _destroy: bool) {
        scene.imagery_layers.remove(handle);
    }

    fn raise_to_top(&mut self, scene: &mut Scene, handle: ImageryLayerId) {
        scene.imagery_layers.raise_to_top(handle);
    }

    fn handle_event(
        &mut self,
        map: &Map,
        scene: &mut Scene,
        entry: &LayerEntry<ImageryLayerId>,
        action: SyncAction,
        _event: &MapEvent,
    ) -> Result<Reaction, SyncError> {
        match action {
            SyncAction::Appearance(layer) => {
                for handle in &entry.handles {
                    if let Some(imagery) = scene.imagery_layers.get_mut(*handle) {
                        apply_appearance(map, layer, imagery);
                    }
                }
                Ok(Reaction::Done)
            }
            SyncAction::Extent(_) => Ok(Reaction::Recreate),
            SyncAction::Refresh(layer) => {
                let Some(wms) = wms_source(map, layer) else {
                    // Replaced by a source this target does not mirror.
                    return Ok(Reaction::Recreate);
                };
                let extent = map.layer(layer).and_then(|l| l.extent.as_ref());
                let provider = wms_provider(wms, extent, map.view().projection.as_ref(), &self.lod);
                for handle in &entry.handles {
                    if let Some(imagery) = scene.imagery_layers.get_mut(*handle) {
                        imagery.provider = provider.clone();
                    }
                    scene.imagery_layers.reinsert(*handle);
                }
                debug!(layer = %layer, "imagery layer reloaded");
                Ok(Reaction::Done)
            }
            _ => Ok(Reaction::Done),
        }
    }
}

impl LayerSynchronizer<RasterTarget> {
    pub fn imagery_layer<'s>(&self, scene: &'s Scene, layer: LayerId) -> Option<&'s ImageryLayer> {
        let handle = self.handles(layer).first()?;
        scene.imagery_layers.get(*handle)
    }
}

#[cfg(test)]
mod tests {
    use super::{RasterSynchronizer, RasterTarget, wms_provider};
    use crate::engine::LayerSynchronizer;
    use crate::lod::LodOptions;
    use foundation::{Extent, LayerId, Projection};
    use layers::{Layer, Map, TileGrid, TileSource, TileWmsSource, VectorSource, View};
    use pretty_assertions::assert_eq;
    use scene::Scene;

    fn synchronizer() -> RasterSynchronizer {
        LayerSynchronizer::new(RasterTarget::default())
    }

    fn wms_layer(name: &str) -> Layer {
        Layer::tile(TileSource::Wms(TileWmsSource::new("https://maps.example/wms", name)))
    }

    fn run(sync: &mut RasterSynchronizer, map: &mut Map, scene: &mut Scene) {
        let events = map.drain_events();
        sync.process_events(map, scene, &events).unwrap();
    }

    fn names(scene: &Scene) -> Vec<String> {
        scene
            .imagery_layers
            .ids()
            .into_iter()
            .filter_map(|id| scene.imagery_layers.get(id))
            .map(|l| l.provider.layers.clone())
            .collect()
    }

    #[test]
    fn provider_copies_url_and_parameters() {
        let mut wms = TileWmsSource::new("https://maps.example/wms", "roads");
        wms.params.insert("FORMAT".into(), "image/png".into());
        let provider = wms_provider(&wms, None, Some(&Projection::Epsg4326), &LodOptions::default());
        assert_eq!(provider.url, "https://maps.example/wms");
        assert_eq!(provider.layers, "roads");
        assert_eq!(provider.parameters.get("FORMAT").map(String::as_str), Some("image/png"));
        assert_eq!(provider.rectangle, None);
        assert_eq!(provider.minimum_level, None);
    }

    #[test]
    fn grid_extent_and_projection_give_bounds_and_levels() {
        let grid = TileGrid::new([-180.0, -90.0], vec![360.0 / 256.0], [256, 256]);
        let wms = TileWmsSource::new("https://maps.example/wms", "roads").with_tile_grid(grid);
        let extent = Extent::from_array([-170.0, -80.0, 170.0, 80.0]);
        let provider = wms_provider(
            &wms,
            Some(&extent),
            Some(&Projection::Epsg4326),
            &LodOptions::default(),
        );
        assert_eq!(provider.rectangle, Some(extent));
        assert_eq!((provider.tile_width, provider.tile_height), (Some(256), Some(256)));
        assert_eq!((provider.minimum_level, provider.maximum_level), (Some(0), Some(0)));
    }

    #[test]
    fn missing_projection_leaves_levels_unset() {
        let grid = TileGrid::new([-180.0, -90.0], vec![1.0], [256, 256]);
        let wms = TileWmsSource::new("u", "l").with_tile_grid(grid);
        let extent = Extent::from_array([0.0, 0.0, 1.0, 1.0]);
        let provider = wms_provider(&wms, Some(&extent), None, &LodOptions::default());
        assert_eq!(provider.rectangle, None);
        assert_eq!(provider.tile_width, None);
    }

    #[test]
    fn wms_layers_become_visible_imagery_layers() {
        let mut map = Map::new(View::new(Projection::Epsg4326, 1.0));
        let group = map.add_layer(map.root(), Layer::group().with_opacity(0.5)).unwrap();
        let id = map.add_layer(group, wms_layer("roads").with_opacity(0.5)).unwrap();
        map.add_layer(map.root(), Layer::vector(VectorSource::new())).unwrap();
        let mut scene = Scene::default();
        let mut sync = synchronizer();
        sync.synchronize(&map, &mut scene).unwrap();

        assert_eq!(scene.imagery_layers.len(), 1);
        let imagery = sync.imagery_layer(&scene, id).unwrap();
        assert_eq!(imagery.alpha, 0.25);
        assert!(imagery.show);
        assert_eq!(imagery.provider.layers, "roads");
    }

    #[test]
    fn other_tile_sources_are_skipped() {
        let mut map = Map::new(View::new(Projection::Epsg4326, 1.0));
        let id = map
            .add_layer(map.root(), Layer::tile(TileSource::Xyz { url: "https://tiles.example".into() }))
            .unwrap();
        let mut scene = Scene::default();
        let mut sync = synchronizer();
        sync.synchronize(&map, &mut scene).unwrap();
        assert!(scene.imagery_layers.is_empty());
        assert!(sync.imagery_layer(&scene, id).is_none());
    }

    #[test]
    fn imagery_follows_opacity_and_visibility_of_groups() {
        let mut map = Map::new(View::new(Projection::Epsg4326, 1.0));
        let group = map.add_layer(map.root(), Layer::group()).unwrap();
        let id = map.add_layer(group, wms_layer("roads")).unwrap();
        let mut scene = Scene::default();
        let mut sync = synchronizer();
        sync.synchronize(&map, &mut scene).unwrap();
        map.drain_events();

        map.set_opacity(group, 0.5).unwrap();
        map.set_visible(group, false).unwrap();
        run(&mut sync, &mut map, &mut scene);
        let imagery = sync.imagery_layer(&scene, id).unwrap();
        assert_eq!(imagery.alpha, 0.5);
        assert!(!imagery.show);
    }

    #[test]
    fn paint_order_follows_z_index() {
        let mut map = Map::new(View::new(Projection::Epsg4326, 1.0));
        map.add_layer(map.root(), wms_layer("a").with_z_index(3)).unwrap();
        map.add_layer(map.root(), wms_layer("b").with_z_index(1)).unwrap();
        let c = map.add_layer(map.root(), wms_layer("c").with_z_index(2)).unwrap();
        let mut scene = Scene::default();
        let mut sync = synchronizer();
        sync.synchronize(&map, &mut scene).unwrap();
        assert_eq!(names(&scene), ["b", "c", "a"]);

        map.drain_events();
        map.set_z_index(c, 9).unwrap();
        run(&mut sync, &mut map, &mut scene);
        assert_eq!(names(&scene), ["b", "a", "c"]);
    }

    #[test]
    fn extent_changes_recreate_the_imagery_layer() {
        let mut map = Map::new(View::new(Projection::Epsg4326, 1.0));
        let grid = TileGrid::new([-180.0, -90.0], vec![360.0 / 256.0], [256, 256]);
        let source = TileWmsSource::new("https://maps.example/wms", "roads").with_tile_grid(grid);
        let id: LayerId = map.add_layer(map.root(), Layer::tile(TileSource::Wms(source))).unwrap();
        let mut scene = Scene::default();
        let mut sync = synchronizer();
        sync.synchronize(&map, &mut scene).unwrap();
        map.drain_events();
        let before = sync.handles(id).to_vec();
        assert_eq!(sync.imagery_layer(&scene, id).unwrap().provider.rectangle, None);

        let extent = Extent::from_array([-170.0, -80.0, 170.0, 80.0]);
        map.set_extent(id, Some(extent)).unwrap();
        run(&mut sync, &mut map, &mut scene);
        assert_ne!(sync.handles(id), before.as_slice());
        assert_eq!(scene.imagery_layers.len(), 1);
        let imagery = sync.imagery_layer(&scene, id).unwrap();
        assert_eq!(imagery.provider.rectangle, Some(extent));
        assert_eq!(imagery.provider.maximum_level, Some(0));
    }

    #[test]
    fn source_changes_reload_in_place() {
        let mut map = Map::new(View::new(Projection::Epsg4326, 1.0));
        let below = map.add_layer(map.root(), wms_layer("roads")).unwrap();
        map.add_layer(map.root(), wms_layer("rivers")).unwrap();
        let mut scene = Scene::default();
        let mut sync = synchronizer();
        sync.synchronize(&map, &mut scene).unwrap();
        map.drain_events();
        let handle = sync.handles(below)[0];

        let replacement = TileWmsSource::new("https://maps.example/wms", "highways");
        map.set_tile_source(below, TileSource::Wms(replacement)).unwrap();
        run(&mut sync, &mut map, &mut scene);
        assert_eq!(sync.handles(below), &[handle]);
        assert_eq!(scene.imagery_layers.index_of(handle), Some(0));
        let imagery = sync.imagery_layer(&scene, below).unwrap();
        assert_eq!(imagery.reloads, 1);
        assert_eq!(imagery.provider.layers, "highways");
        assert_eq!(names(&scene), ["highways", "rivers"]);
    }
}
