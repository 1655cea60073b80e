use foundation::Ecef;

use crate::collection::{CollectionKey, Keyed};
use crate::picking::PickRef;
use crate::types::{Color, HeightReference, HorizontalOrigin, LabelStyle, VerticalOrigin};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LabelId(pub u64);

impl CollectionKey for LabelId {
    fn from_raw(raw: u64) -> Self {
        LabelId(raw)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub position: Ecef,
    pub text: String,
    pub font: Option<String>,
    pub height_reference: HeightReference,
    pub pixel_offset: Option<[f64; 2]>,
    pub fill_color: Option<Color>,
    pub outline_color: Option<Color>,
    pub outline_width: Option<f64>,
    pub style: Option<LabelStyle>,
    pub horizontal_origin: HorizontalOrigin,
    pub vertical_origin: Option<VerticalOrigin>,
    pub eye_offset: Option<[f64; 3]>,
    pub show: bool,
    pick: Option<PickRef>,
}

impl Label {
    pub fn new(position: Ecef, text: impl Into<String>, pick: Option<PickRef>) -> Self {
        Self {
            position,
            text: text.into(),
            font: None,
            height_reference: HeightReference::None,
            pixel_offset: None,
            fill_color: None,
            outline_color: None,
            outline_width: None,
            style: None,
            horizontal_origin: HorizontalOrigin::Center,
            vertical_origin: None,
            eye_offset: None,
            show: true,
            pick,
        }
    }

    pub fn pick_ref(&self) -> Option<PickRef> {
        self.pick
    }
}

pub type LabelCollection = Keyed<LabelId, Label>;
