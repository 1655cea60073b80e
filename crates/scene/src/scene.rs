use crate::counterpart::LayerCounterpart;
use crate::imagery::ImageryLayerCollection;

/// Optional engine features; converters fall back when one is missing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Capabilities {
    pub ground_polylines: bool,
    pub classification_primitives: bool,
    pub ground_primitive_materials: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            ground_polylines: true,
            classification_primitives: true,
            ground_primitive_materials: true,
        }
    }
}

impl Capabilities {
    /// An engine without any of the optional features.
    pub fn minimal() -> Self {
        Self {
            ground_polylines: false,
            classification_primitives: false,
            ground_primitive_materials: false,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CounterpartId(pub u64);

/// Layer counterparts in paint order, bottom first.
#[derive(Debug, Clone)]
pub struct CounterpartStack {
    next: u64,
    items: Vec<(CounterpartId, LayerCounterpart)>,
}

impl Default for CounterpartStack {
    fn default() -> Self {
        Self {
            next: 1,
            items: Vec::new(),
        }
    }
}

impl CounterpartStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, counterpart: LayerCounterpart) -> CounterpartId {
        let id = CounterpartId(self.next);
        self.next += 1;
        self.items.push((id, counterpart));
        id
    }

    pub fn remove(&mut self, id: CounterpartId) -> Option<LayerCounterpart> {
        let idx = self.items.iter().position(|(i, _)| *i == id)?;
        Some(self.items.remove(idx).1)
    }

    pub fn get(&self, id: CounterpartId) -> Option<&LayerCounterpart> {
        self.items.iter().find(|(i, _)| *i == id).map(|(_, c)| c)
    }

    pub fn get_mut(&mut self, id: CounterpartId) -> Option<&mut LayerCounterpart> {
        self.items.iter_mut().find(|(i, _)| *i == id).map(|(_, c)| c)
    }

    /// Moves `id` to the top of the stack.
    pub fn raise_to_top(&mut self, id: CounterpartId) -> bool {
        let Some(idx) = self.items.iter().position(|(i, _)| *i == id) else {
            return false;
        };
        let item = self.items.remove(idx);
        self.items.push(item);
        true
    }

    pub fn ids(&self) -> Vec<CounterpartId> {
        self.items.iter().map(|(i, _)| *i).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CounterpartId, &LayerCounterpart)> {
        self.items.iter().map(|(i, c)| (*i, c))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The 3D scene the synchronizers write into.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub capabilities: Capabilities,
    pub counterparts: CounterpartStack,
    pub imagery_layers: ImageryLayerCollection,
}

impl Scene {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            ..Self::default()
        }
    }
}
