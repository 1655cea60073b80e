pub mod appearance;
pub mod billboard;
pub mod collection;
pub mod counterpart;
pub mod entity;
pub mod geometry;
pub mod imagery;
pub mod label;
pub mod picking;
pub mod primitive;
pub mod scene;
pub mod types;

pub use appearance::*;
pub use billboard::*;
pub use collection::*;
pub use counterpart::*;
pub use entity::*;
pub use geometry::*;
pub use imagery::*;
pub use label::*;
pub use picking::*;
pub use primitive::*;
pub use scene::*;
pub use types::*;
