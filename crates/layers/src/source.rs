use std::collections::BTreeMap;

use foundation::{Extent, FeatureId, SourceId};

use crate::feature::Feature;
use crate::style::StyleFn;

/// Feature container. Iteration follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct VectorSource {
    pub(crate) id: SourceId,
    pub(crate) features: BTreeMap<FeatureId, Feature>,
    /// Features handed in before the source joined a map.
    pub(crate) pending: Vec<Feature>,
}

impl VectorSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_features(features: Vec<Feature>) -> Self {
        Self {
            pending: features,
            ..Self::default()
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn feature(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(&id)
    }

    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.features.values()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Point clustering wrapper around a vector source.
#[derive(Debug, Clone)]
pub struct ClusterSource {
    /// Cluster radius in pixels.
    pub distance: f64,
    pub source: VectorSource,
}

impl ClusterSource {
    pub fn new(distance: f64, source: VectorSource) -> Self {
        Self { distance, source }
    }
}

/// Vector source rendered into an image, with its own style function.
#[derive(Debug, Clone)]
pub struct ImageVectorSource {
    pub source: VectorSource,
    pub style: Option<StyleFn>,
}

#[derive(Debug, Clone)]
pub enum VectorLayerSource {
    Plain(VectorSource),
    Cluster(ClusterSource),
}

#[derive(Debug, Clone)]
pub enum ImageLayerSource {
    Vector(ImageVectorSource),
    Static { url: String, extent: Extent },
}

/// Tile pyramid description. Resolutions run from coarsest to finest.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    pub origin: [f64; 2],
    pub resolutions: Vec<f64>,
    pub tile_size: [u32; 2],
}

impl TileGrid {
    pub fn new(origin: [f64; 2], resolutions: Vec<f64>, tile_size: [u32; 2]) -> Self {
        Self {
            origin,
            resolutions,
            tile_size,
        }
    }

    pub fn coarsest_resolution(&self) -> Option<f64> {
        self.resolutions.first().copied()
    }

    pub fn finest_resolution(&self) -> Option<f64> {
        self.resolutions.last().copied()
    }

    /// Column/row of the tile containing `coord` at `resolution`.
    pub fn tile_coord_for_coord_and_resolution(&self, coord: [f64; 2], resolution: f64) -> [i64; 2] {
        let x = (coord[0] - self.origin[0]) / (resolution * f64::from(self.tile_size[0]));
        let y = (coord[1] - self.origin[1]) / (resolution * f64::from(self.tile_size[1]));
        [x.floor() as i64, y.floor() as i64]
    }
}

/// Tiled WMS endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct TileWmsSource {
    pub urls: Vec<String>,
    pub params: BTreeMap<String, String>,
    pub tile_grid: Option<TileGrid>,
}

impl TileWmsSource {
    pub fn new(url: impl Into<String>, layers: impl Into<String>) -> Self {
        let mut params = BTreeMap::new();
        params.insert("LAYERS".to_string(), layers.into());
        Self {
            urls: vec![url.into()],
            params,
            tile_grid: None,
        }
    }

    pub fn with_tile_grid(mut self, grid: TileGrid) -> Self {
        self.tile_grid = Some(grid);
        self
    }

    pub fn layers_param(&self) -> Option<&str> {
        self.params.get("LAYERS").map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TileSource {
    Wms(TileWmsSource),
    Xyz { url: String },
}

#[cfg(test)]
mod tests {
    use super::{TileGrid, TileWmsSource};

    #[test]
    fn tile_coords_floor_toward_origin() {
        let grid = TileGrid::new([-180.0, -90.0], vec![0.703125, 0.3515625], [256, 256]);
        assert_eq!(grid.tile_coord_for_coord_and_resolution([-180.0, -90.0], 0.703125), [0, 0]);
        assert_eq!(grid.tile_coord_for_coord_and_resolution([179.9, 89.9], 0.703125), [1, 0]);
        assert_eq!(grid.tile_coord_for_coord_and_resolution([0.0, 0.0], 0.3515625), [2, 1]);
        assert_eq!(grid.coarsest_resolution(), Some(0.703125));
        assert_eq!(grid.finest_resolution(), Some(0.3515625));
    }

    #[test]
    fn wms_source_carries_layers_param() {
        let src = TileWmsSource::new("https://wms.example/ows", "roads");
        assert_eq!(src.layers_param(), Some("roads"));
    }
}
