use foundation::{Extent, LayerId};

use crate::properties::Properties;
use crate::source::{
    ClusterSource, ImageLayerSource, ImageVectorSource, TileSource, VectorLayerSource,
    VectorSource,
};
use crate::style::StyleFn;

#[derive(Debug, Clone)]
pub enum LayerKind {
    Group { layers: Vec<LayerId> },
    Vector { source: VectorLayerSource },
    Image { source: ImageLayerSource },
    Tile { source: TileSource },
}

/// A node of the 2D layer tree.
///
/// Fields are read freely; mutations go through [`crate::Map`] so that
/// every change is announced on the map's event bus.
#[derive(Debug, Clone)]
pub struct Layer {
    pub(crate) id: LayerId,
    pub kind: LayerKind,
    pub properties: Properties,
    pub opacity: f64,
    pub visible: bool,
    pub z_index: i32,
    pub extent: Option<Extent>,
    /// Fallback style for features without their own style function.
    pub style: Option<StyleFn>,
}

impl Layer {
    pub fn new(kind: LayerKind) -> Self {
        Self {
            id: LayerId(0),
            kind,
            properties: Properties::new(),
            opacity: 1.0,
            visible: true,
            z_index: 0,
            extent: None,
            style: None,
        }
    }

    pub fn group() -> Self {
        Self::new(LayerKind::Group { layers: Vec::new() })
    }

    pub fn vector(source: VectorSource) -> Self {
        Self::new(LayerKind::Vector {
            source: VectorLayerSource::Plain(source),
        })
    }

    pub fn cluster(source: ClusterSource) -> Self {
        Self::new(LayerKind::Vector {
            source: VectorLayerSource::Cluster(source),
        })
    }

    pub fn image_vector(source: VectorSource, style: Option<StyleFn>) -> Self {
        Self::new(LayerKind::Image {
            source: ImageLayerSource::Vector(ImageVectorSource { source, style }),
        })
    }

    pub fn tile(source: TileSource) -> Self {
        Self::new(LayerKind::Tile { source })
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn with_style(mut self, style: StyleFn) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn with_extent(mut self, extent: Extent) -> Self {
        self.extent = Some(extent);
        self
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, LayerKind::Group { .. })
    }

    /// Direct children of a group; empty for leaf layers.
    pub fn children(&self) -> &[LayerId] {
        match &self.kind {
            LayerKind::Group { layers } => layers,
            _ => &[],
        }
    }

    pub fn is_cluster(&self) -> bool {
        matches!(
            self.kind,
            LayerKind::Vector {
                source: VectorLayerSource::Cluster(_)
            }
        )
    }

    /// The feature source behind this layer, unwrapping cluster and
    /// image-vector wrappers by one level.
    pub fn feature_source(&self) -> Option<&VectorSource> {
        match &self.kind {
            LayerKind::Vector {
                source: VectorLayerSource::Plain(s),
            } => Some(s),
            LayerKind::Vector {
                source: VectorLayerSource::Cluster(c),
            } => Some(&c.source),
            LayerKind::Image {
                source: ImageLayerSource::Vector(iv),
            } => Some(&iv.source),
            _ => None,
        }
    }

    pub(crate) fn feature_source_mut(&mut self) -> Option<&mut VectorSource> {
        match &mut self.kind {
            LayerKind::Vector {
                source: VectorLayerSource::Plain(s),
            } => Some(s),
            LayerKind::Vector {
                source: VectorLayerSource::Cluster(c),
            } => Some(&mut c.source),
            LayerKind::Image {
                source: ImageLayerSource::Vector(iv),
            } => Some(&mut iv.source),
            _ => None,
        }
    }

    /// Style function used when a feature has none: the image-vector
    /// source's own style, else the layer style.
    pub fn fallback_style(&self) -> Option<&StyleFn> {
        match &self.kind {
            LayerKind::Image {
                source: ImageLayerSource::Vector(iv),
            } => iv.style.as_ref().or(self.style.as_ref()),
            _ => self.style.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Layer;
    use crate::source::{ClusterSource, VectorSource};
    use crate::style::{Style, StyleFn};

    #[test]
    fn cluster_layer_unwraps_to_inner_source() {
        let layer = Layer::cluster(ClusterSource::new(40.0, VectorSource::new()));
        assert!(layer.is_cluster());
        assert!(layer.feature_source().is_some());
        assert!(Layer::group().feature_source().is_none());
    }

    #[test]
    fn image_vector_style_wins_over_layer_style() {
        let inner = StyleFn::fixed(Style::new());
        let layer = Layer::image_vector(VectorSource::new(), Some(inner))
            .with_style(StyleFn::fixed(Style::new()));
        assert!(layer.fallback_style().is_some());
        assert!(Layer::group().fallback_style().is_none());
    }
}
