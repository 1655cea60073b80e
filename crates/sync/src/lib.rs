pub mod config;
pub mod engine;
pub mod error;
pub mod lod;
pub mod ordering;
pub mod raster;
pub mod vector;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use lod::*;
pub use ordering::*;
pub use raster::*;
pub use vector::*;
