use foundation::FeatureId;

use crate::geometry::Geometry;
use crate::properties::Properties;
use crate::style::StyleFn;

/// A vector feature. Ids are assigned when the feature enters a map.
#[derive(Debug, Clone)]
pub struct Feature {
    pub(crate) id: FeatureId,
    /// Optional application id, copied onto billboards.
    pub stable_id: Option<String>,
    pub geometry: Option<Geometry>,
    pub properties: Properties,
    pub style: Option<StyleFn>,
    /// Members of a synthetic cluster feature; empty otherwise.
    pub members: Vec<Feature>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry: Some(geometry),
            ..Self::empty()
        }
    }

    /// Feature without geometry.
    pub fn empty() -> Self {
        Self {
            id: FeatureId(0),
            stable_id: None,
            geometry: None,
            properties: Properties::new(),
            style: None,
            members: Vec::new(),
        }
    }

    /// Synthetic feature standing for a group of clustered features.
    pub fn cluster(members: Vec<Feature>) -> Self {
        Self {
            members,
            ..Self::empty()
        }
    }

    pub fn id(&self) -> FeatureId {
        self.id
    }

    pub fn with_id(mut self, stable_id: impl Into<String>) -> Self {
        self.stable_id = Some(stable_id.into());
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_style(mut self, style: StyleFn) -> Self {
        self.style = Some(style);
        self
    }
}
