pub mod observer;
pub mod resolve;

pub use observer::*;
pub use resolve::*;
