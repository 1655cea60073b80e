use std::collections::BTreeMap;

use foundation::{IdGen, ImageId};

#[derive(Debug, Clone, PartialEq)]
pub struct ImageEntry {
    pub src: String,
    pub loaded: bool,
}

/// Icon images referenced by styles, with their load state.
#[derive(Debug, Clone, Default)]
pub struct ImageRegistry {
    ids: IdGen,
    images: BTreeMap<ImageId, ImageEntry>,
}

impl ImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, src: impl Into<String>, loaded: bool) -> ImageId {
        let id = ImageId(self.ids.next_raw());
        self.images.insert(
            id,
            ImageEntry {
                src: src.into(),
                loaded,
            },
        );
        id
    }

    pub fn get(&self, id: ImageId) -> Option<&ImageEntry> {
        self.images.get(&id)
    }

    /// Unknown images count as not loaded.
    pub fn is_loaded(&self, id: ImageId) -> bool {
        self.get(id).is_some_and(|e| e.loaded)
    }

    /// Returns `true` on the transition to loaded.
    pub(crate) fn mark_loaded(&mut self, id: ImageId) -> bool {
        match self.images.get_mut(&id) {
            Some(entry) if !entry.loaded => {
                entry.loaded = true;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ImageRegistry;

    #[test]
    fn load_transition_fires_once() {
        let mut reg = ImageRegistry::new();
        let icon = reg.register("icon.png", false);
        assert!(!reg.is_loaded(icon));
        assert!(reg.mark_loaded(icon));
        assert!(!reg.mark_loaded(icon));
        assert!(reg.is_loaded(icon));
    }
}
