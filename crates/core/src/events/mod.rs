pub mod event;
pub mod observer;

pub use event::*;
pub use observer::*;
