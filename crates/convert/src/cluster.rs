use std::collections::BTreeMap;
use std::rc::Rc;

use foundation::LayerId;
use layers::{
    Feature, GeometryKind, ImageRegistry, ImageStyle, Layer, LayerKind, Properties, Shape, Style, TextStyle,
    VectorLayerSource, View,
};
use scene::{
    Billboard, Cluster, DataSource, Entity, EntityCollection, EntityId, Label,
    LayerCounterpart, PendingBillboard, PendingTarget, PickRef, VerticalOrigin,
};
use tracing::{debug, trace, warn};

use crate::converter::{FeatureConverter, to_ecef};
use crate::error::ConvertError;
use crate::image_gate::ImageGate;
use crate::layer::{LayerConverter, view_state};
use crate::overrides::{self, OverrideChain};
use crate::paint::compute_plain_style;
use crate::shapes::apply_text_style;

pub const DEFAULT_CLUSTER_FONT: &str = "10px sans-serif";

/// Replaces the default styling of a cluster.
pub type ClusterStyleOverride = Rc<dyn Fn(&[&Entity], &mut Cluster)>;

/// Converts clustered point layers into entity counterparts and styles the
/// clusters their data source produces.
#[derive(Clone)]
pub struct ClusterConverter {
    features: FeatureConverter,
    default_font: String,
    minimum_cluster_size: usize,
    overrides: BTreeMap<LayerId, ClusterStyleOverride>,
}

impl std::fmt::Debug for ClusterConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterConverter")
            .field("features", &self.features)
            .field("default_font", &self.default_font)
            .field("minimum_cluster_size", &self.minimum_cluster_size)
            .field("overrides", &self.overrides.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ClusterConverter {
    pub fn new(features: FeatureConverter) -> Self {
        Self {
            features,
            default_font: DEFAULT_CLUSTER_FONT.to_string(),
            minimum_cluster_size: 2,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_default_font(mut self, font: impl Into<String>) -> Self {
        self.default_font = font.into();
        self
    }

    pub fn with_minimum_cluster_size(mut self, size: usize) -> Self {
        self.minimum_cluster_size = size;
        self
    }

    pub fn features(&self) -> &FeatureConverter {
        &self.features
    }

    /// Sets or clears (`None`) the cluster style override of `layer`.
    pub fn set_layer_style(&mut self, layer: LayerId, style: Option<ClusterStyleOverride>) {
        match style {
            Some(style) => {
                self.overrides.insert(layer, style);
            }
            None => {
                self.overrides.remove(&layer);
            }
        }
    }

    pub fn has_layer_style(&self, layer: LayerId) -> bool {
        self.overrides.contains_key(&layer)
    }

    /// Builds the entity of a point feature and adds it to `counterpart`.
    ///
    /// The entity always exists; a billboard whose image is still loading
    /// is attached to it once the load completes.
    pub fn convert_entity(
        &self,
        counterpart: &mut LayerCounterpart,
        layer: &Layer,
        feature: &Feature,
        style: &Style,
        images: &ImageRegistry,
        gate: &mut ImageGate,
    ) -> Option<EntityId> {
        let geometry = feature.geometry.as_ref()?.to_lon_lat(&counterpart.context.projection);
        let Shape::Point(mut c) = geometry.shape else {
            trace!(feature = %feature.id(), "only points are clustered");
            return None;
        };
        let keys = self.features.keys();
        let above_ground = feature
            .properties
            .number(&keys.height_above_ground())
            .filter(|h| *h != 0.0)
            .or_else(|| layer.properties.number(&keys.height_above_ground()));
        if let Some(h) = above_ground {
            c.z = h;
        }

        let pick = PickRef::new(layer.id(), feature.id());
        let href = self.features.height_reference(layer, feature, &geometry);
        let mut entity = Entity::new(to_ecef(&c), pick);
        entity.id = feature.stable_id.clone();
        if let Some(text) = &style.text
            && let Some(content) = &text.text
        {
            let mut label = Label::new(entity.position, content.clone(), Some(pick));
            label.height_reference = href;
            if text.offset_x != 0.0 || text.offset_y != 0.0 {
                label.pixel_offset = Some([text.offset_x, text.offset_y]);
            }
            apply_text_style(&mut label, text);
            entity.label = Some(label);
        }

        let source = layer.feature_source().map(|s| s.id()).unwrap_or_default();
        let mut pending = None;
        if let Some(image) = &style.image
            && image.opacity > 0.0
            && let Some(entry) = images.get(image.image)
        {
            let bb = self
                .features
                .image_billboard(feature, image, entity.position, href, Some(pick));
            if entry.loaded {
                gate.cancel(source, feature.id());
                entity.billboard = Some(bb);
            } else {
                pending = Some((image.image, bb));
            }
        }

        let id = counterpart.add_entity(feature.id(), entity)?;
        if let Some((image, billboard)) = pending {
            let token = gate.begin(source, feature.id());
            counterpart.context.defer(PendingBillboard {
                feature: feature.id(),
                image,
                token,
                billboard,
                target: PendingTarget::Entity(id),
            });
        }
        Some(id)
    }

    fn add_styled(
        &self,
        counterpart: &mut LayerCounterpart,
        layer: &Layer,
        feature: &Feature,
        resolution: f64,
        images: &ImageRegistry,
        gate: &mut ImageGate,
    ) -> bool {
        let Some(style) = compute_plain_style(feature, layer.fallback_style(), resolution) else {
            warn!(layer = %layer.id(), feature = %feature.id(), "feature has no style, not drawn");
            return false;
        };
        self.convert_entity(counterpart, layer, feature, &style, images, gate)
            .is_some()
    }

    /// Restyles one cluster after a clustering pass.
    ///
    /// The aggregate's own label is hidden and the layer's eye offset and
    /// altitude mode are applied. A layer override then takes over; by
    /// default a single member keeps its own feature style while larger
    /// clusters ask the layer style about a feature wrapping all members.
    pub fn style_cluster(
        &self,
        layer: &Layer,
        entities: &EntityCollection,
        cluster: &mut Cluster,
        images: &ImageRegistry,
    ) {
        let keys = self.features.keys();
        cluster.label.show = false;
        let dz = layer.properties.number(&keys.z_eye_offset()).unwrap_or(0.0);
        cluster.billboard.eye_offset = [0.0, 0.0, dz];
        cluster.label.eye_offset = Some([0.0, 0.0, dz]);
        let none = Properties::default();
        let layer_only = OverrideChain::new(None, &none, &layer.properties);
        let href = overrides::height_reference(keys, layer_only, GeometryKind::Point);
        cluster.billboard.height_reference = href;
        cluster.label.height_reference = href;
        cluster.billboard.vertical_origin = VerticalOrigin::Bottom;

        let members: Vec<&Entity> = cluster
            .entities
            .iter()
            .filter_map(|id| entities.get(*id))
            .collect();
        if let Some(custom) = self.overrides.get(&layer.id()) {
            custom(&members, cluster);
            return;
        }
        let Some(source) = layer.feature_source() else {
            return;
        };
        let style = match members.as_slice() {
            [single] => source
                .feature(single.pick_ref().feature)
                .and_then(|f| compute_plain_style(f, layer.fallback_style(), 1.0)),
            _ => {
                let features = members
                    .iter()
                    .filter_map(|e| source.feature(e.pick_ref().feature))
                    .cloned()
                    .collect();
                let wrapper = Feature::cluster(features);
                layer
                    .fallback_style()
                    .and_then(|s| s.call(&wrapper, 1.0).into_iter().next())
            }
        };
        let Some(style) = style else {
            return;
        };
        if let Some(image) = &style.image {
            cluster_image(image, &mut cluster.billboard, images);
        }
        if let Some(text) = &style.text {
            self.cluster_text(text, &mut cluster.label);
        }
    }

    fn cluster_text(&self, text: &TextStyle, label: &mut Label) {
        if let Some(content) = &text.text {
            label.text = content.clone();
        }
        label.show = true;
        if text.offset_x != 0.0 || text.offset_y != 0.0 {
            label.pixel_offset = Some([text.offset_x, text.offset_y]);
        }
        label.font = Some(self.default_font.clone());
        apply_text_style(label, text);
    }
}

/// Shows the cluster billboard once its image is available; until then
/// it stays hidden and the next clustering pass tries again.
fn cluster_image(image: &ImageStyle, billboard: &mut Billboard, images: &ImageRegistry) {
    if !images.is_loaded(image.image) {
        return;
    }
    billboard.image = Some(image.image);
    billboard.color = [1.0, 1.0, 1.0, image.opacity as f32];
    billboard.scale = image.scale;
    billboard.show = true;
}

impl LayerConverter for ClusterConverter {
    /// Non-cluster layers are handed to the plain converter.
    fn layer_counterpart(
        &self,
        layer: &Layer,
        view: &View,
        images: &ImageRegistry,
        gate: &mut ImageGate,
    ) -> Result<LayerCounterpart, ConvertError> {
        let LayerKind::Vector {
            source: VectorLayerSource::Cluster(cluster),
        } = &layer.kind
        else {
            return self.features.layer_counterpart(layer, view, images, gate);
        };
        let (projection, resolution) = view_state(view)?;

        let mut data_source = DataSource::new(format!("cluster-{}", layer.id()));
        data_source.clustering.pixel_range = cluster.distance;
        data_source.clustering.minimum_cluster_size = self.minimum_cluster_size;
        let mut counterpart = LayerCounterpart::new_entities(layer.id(), projection, data_source);
        for feature in cluster.source.features() {
            self.add_styled(&mut counterpart, layer, feature, resolution, images, gate);
        }
        if let Some(ds) = counterpart.data_source_mut() {
            ds.clustering.enabled = true;
        }
        debug!(
            layer = %layer.id(),
            entities = counterpart.object_count(),
            "converted cluster layer"
        );
        Ok(counterpart)
    }

    fn add_feature(
        &self,
        counterpart: &mut LayerCounterpart,
        layer: &Layer,
        feature: &Feature,
        view: &View,
        images: &ImageRegistry,
        gate: &mut ImageGate,
    ) -> Result<bool, ConvertError> {
        if !layer.is_cluster() {
            return self
                .features
                .add_feature(counterpart, layer, feature, view, images, gate);
        }
        let (projection, resolution) = view_state(view)?;
        counterpart.context.projection = projection;
        Ok(self.add_styled(counterpart, layer, feature, resolution, images, gate))
    }
}
