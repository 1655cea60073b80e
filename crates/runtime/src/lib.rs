pub mod cancel;
pub mod event_bus;
pub mod listeners;

pub use cancel::*;
pub use event_bus::*;
pub use listeners::*;
