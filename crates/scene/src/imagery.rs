use std::collections::BTreeMap;

use foundation::Extent;

/// Parameters of a WMS tile provider. Requests themselves are built by the
/// renderer; this only carries what it needs.
#[derive(Debug, Clone, PartialEq)]
pub struct WmsImageryProvider {
    pub url: String,
    pub parameters: BTreeMap<String, String>,
    pub layers: String,
    /// Geographic bounds in degrees.
    pub rectangle: Option<Extent>,
    pub tile_width: Option<u32>,
    pub tile_height: Option<u32>,
    pub minimum_level: Option<u32>,
    pub maximum_level: Option<u32>,
}

impl WmsImageryProvider {
    pub fn new(url: impl Into<String>, layers: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            parameters: BTreeMap::new(),
            layers: layers.into(),
            rectangle: None,
            tile_width: None,
            tile_height: None,
            minimum_level: None,
            maximum_level: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageryLayer {
    pub provider: WmsImageryProvider,
    pub alpha: f64,
    pub show: bool,
    /// Incremented every time the layer is re-inserted to force a reload.
    pub reloads: u32,
}

impl ImageryLayer {
    /// New layers start hidden until their properties are applied.
    pub fn new(provider: WmsImageryProvider) -> Self {
        Self {
            provider,
            alpha: 1.0,
            show: false,
            reloads: 0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageryLayerId(pub u64);

/// Imagery stack, bottom first.
#[derive(Debug, Clone, Default)]
pub struct ImageryLayerCollection {
    next: u64,
    layers: Vec<(ImageryLayerId, ImageryLayer)>,
}

impl ImageryLayerCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, layer: ImageryLayer) -> ImageryLayerId {
        self.next += 1;
        let id = ImageryLayerId(self.next);
        self.layers.push((id, layer));
        id
    }

    pub fn remove(&mut self, id: ImageryLayerId) -> Option<ImageryLayer> {
        let idx = self.index_of(id)?;
        Some(self.layers.remove(idx).1)
    }

    pub fn index_of(&self, id: ImageryLayerId) -> Option<usize> {
        self.layers.iter().position(|(i, _)| *i == id)
    }

    pub fn get(&self, id: ImageryLayerId) -> Option<&ImageryLayer> {
        self.layers.iter().find(|(i, _)| *i == id).map(|(_, l)| l)
    }

    pub fn get_mut(&mut self, id: ImageryLayerId) -> Option<&mut ImageryLayer> {
        self.layers.iter_mut().find(|(i, _)| *i == id).map(|(_, l)| l)
    }

    pub fn raise_to_top(&mut self, id: ImageryLayerId) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        let entry = self.layers.remove(idx);
        self.layers.push(entry);
        true
    }

    /// Removes and re-inserts a layer at its current index.
    pub fn reinsert(&mut self, id: ImageryLayerId) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        let (id, mut layer) = self.layers.remove(idx);
        layer.reloads += 1;
        self.layers.insert(idx, (id, layer));
        true
    }

    pub fn ids(&self) -> Vec<ImageryLayerId> {
        self.layers.iter().map(|(i, _)| *i).collect()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{ImageryLayer, ImageryLayerCollection, WmsImageryProvider};

    fn layer(name: &str) -> ImageryLayer {
        ImageryLayer::new(WmsImageryProvider::new("https://wms.example", name))
    }

    #[test]
    fn raise_to_top_moves_to_end() {
        let mut c = ImageryLayerCollection::new();
        let a = c.add(layer("a"));
        let b = c.add(layer("b"));
        assert!(c.raise_to_top(a));
        assert_eq!(c.ids(), vec![b, a]);
    }

    #[test]
    fn reinsert_keeps_position_and_counts_reloads() {
        let mut c = ImageryLayerCollection::new();
        let a = c.add(layer("a"));
        let b = c.add(layer("b"));
        assert!(c.reinsert(a));
        assert_eq!(c.ids(), vec![a, b]);
        assert_eq!(c.get(a).map(|l| l.reloads), Some(1));
        assert!(!c.get(b).is_some_and(|l| l.show));
    }
}
