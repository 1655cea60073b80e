pub mod cluster;
pub mod converter;
pub mod error;
pub mod height;
pub mod image_gate;
pub mod layer;
pub mod overrides;
pub mod paint;
pub mod shapes;

pub use cluster::*;
pub use converter::*;
pub use error::*;
pub use height::*;
pub use image_gate::*;
pub use layer::*;
pub use overrides::*;
pub use paint::*;
pub use shapes::*;
