pub mod errors;
pub mod fso;
pub mod mount;
pub mod report;
pub mod unit;

pub use errors::*;
pub use fso::*;
pub use mount::*;
pub use report::*;
pub use unit::*;
