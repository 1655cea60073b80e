use foundation::{Ecef, ImageId};

use crate::collection::{CollectionKey, Keyed};
use crate::picking::PickRef;
use crate::types::{Color, HeightReference, NearFarScalar, VerticalOrigin};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BillboardId(pub u64);

impl CollectionKey for BillboardId {
    fn from_raw(raw: u64) -> Self {
        BillboardId(raw)
    }
}

/// Screen-aligned icon.
#[derive(Debug, Clone, PartialEq)]
pub struct Billboard {
    pub position: Ecef,
    pub image: Option<ImageId>,
    pub color: Color,
    pub scale: f64,
    pub height_reference: HeightReference,
    pub vertical_origin: VerticalOrigin,
    /// Application id of the source feature.
    pub id: Option<String>,
    pub eye_offset: [f64; 3],
    pub pixel_offset: Option<[f64; 2]>,
    pub scale_by_distance: Option<NearFarScalar>,
    pub show: bool,
    pick: Option<PickRef>,
}

impl Billboard {
    pub fn new(position: Ecef, pick: Option<PickRef>) -> Self {
        Self {
            position,
            image: None,
            color: [1.0, 1.0, 1.0, 1.0],
            scale: 1.0,
            height_reference: HeightReference::None,
            vertical_origin: VerticalOrigin::Center,
            id: None,
            eye_offset: [0.0; 3],
            pixel_offset: None,
            scale_by_distance: None,
            show: true,
            pick,
        }
    }

    pub fn pick_ref(&self) -> Option<PickRef> {
        self.pick
    }
}

pub type BillboardCollection = Keyed<BillboardId, Billboard>;
