pub mod ecef;
pub mod geodesy;
pub mod projection;

pub use ecef::*;
pub use geodesy::*;
pub use projection::*;
