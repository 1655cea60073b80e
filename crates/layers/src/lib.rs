pub mod feature;
pub mod geometry;
pub mod image;
pub mod layer;
pub mod map;
pub mod properties;
pub mod source;
pub mod style;

pub use feature::*;
pub use geometry::*;
pub use image::*;
pub use layer::*;
pub use map::*;
pub use properties::*;
pub use source::*;
pub use style::*;
