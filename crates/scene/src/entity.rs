use foundation::Ecef;

use crate::billboard::Billboard;
use crate::collection::{CollectionKey, Keyed};
use crate::label::Label;
use crate::picking::PickRef;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u64);

impl CollectionKey for EntityId {
    fn from_raw(raw: u64) -> Self {
        EntityId(raw)
    }
}

/// Declarative point object carrying an optional billboard and label.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Application id of the source feature.
    pub id: Option<String>,
    pub position: Ecef,
    pub billboard: Option<Billboard>,
    pub label: Option<Label>,
    pub show: bool,
    pick: PickRef,
}

impl Entity {
    pub fn new(position: Ecef, pick: PickRef) -> Self {
        Self {
            id: None,
            position,
            billboard: None,
            label: None,
            show: true,
            pick,
        }
    }

    pub fn pick_ref(&self) -> PickRef {
        self.pick
    }
}

pub type EntityCollection = Keyed<EntityId, Entity>;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Clustering {
    pub enabled: bool,
    /// Screen-space radius in pixels.
    pub pixel_range: f64,
    pub minimum_cluster_size: usize,
}

impl Default for Clustering {
    fn default() -> Self {
        Self {
            enabled: false,
            pixel_range: 80.0,
            minimum_cluster_size: 2,
        }
    }
}

/// Maps world positions to screen pixels; `None` when off screen.
pub trait ScreenProjector {
    fn to_screen(&self, position: Ecef) -> Option<[f64; 2]>;
}

/// One aggregate produced by a clustering pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub entities: Vec<EntityId>,
    pub position: Ecef,
    pub billboard: Billboard,
    pub label: Label,
}

/// Named entity container with screen-space clustering.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSource {
    pub name: String,
    pub entities: EntityCollection,
    pub clustering: Clustering,
    /// Result of the last clustering pass, after styling.
    pub clusters: Vec<Cluster>,
    pub show: bool,
}

impl DataSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: EntityCollection::new(),
            clustering: Clustering::default(),
            clusters: Vec::new(),
            show: true,
        }
    }

    /// Groups visible entities lying within `pixel_range` of a seed entity.
    ///
    /// Seeds are taken in entity order; groups smaller than the minimum
    /// size leave their members to be drawn individually. Returns nothing
    /// while clustering is disabled.
    pub fn compute_clusters(&self, projector: &dyn ScreenProjector) -> Vec<Cluster> {
        if !self.clustering.enabled {
            return Vec::new();
        }
        let points: Vec<(EntityId, Ecef, [f64; 2])> = self
            .entities
            .iter()
            .filter(|(_, e)| e.show)
            .filter_map(|(id, e)| projector.to_screen(e.position).map(|p| (id, e.position, p)))
            .collect();

        let range = self.clustering.pixel_range;
        let mut taken = vec![false; points.len()];
        let mut clusters = Vec::new();
        for i in 0..points.len() {
            if taken[i] {
                continue;
            }
            let seed = points[i].2;
            let group: Vec<usize> = (i..points.len())
                .filter(|&j| !taken[j])
                .filter(|&j| {
                    let p = points[j].2;
                    (p[0] - seed[0]).abs() <= range && (p[1] - seed[1]).abs() <= range
                })
                .collect();
            taken[i] = true;
            if group.len() < self.clustering.minimum_cluster_size.max(2) {
                continue;
            }
            let n = group.len() as f64;
            let (mut x, mut y, mut z) = (0.0, 0.0, 0.0);
            for &j in &group {
                taken[j] = true;
                x += points[j].1.x;
                y += points[j].1.y;
                z += points[j].1.z;
            }
            let position = Ecef::new(x / n, y / n, z / n);
            let mut billboard = Billboard::new(position, None);
            billboard.show = false;
            clusters.push(Cluster {
                entities: group.iter().map(|&j| points[j].0).collect(),
                position,
                billboard,
                label: Label::new(position, group.len().to_string(), None),
            });
        }
        clusters
    }
}
