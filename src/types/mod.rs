//! Common data types

pub mod detection;
pub mod motion;
pub mod range;
pub mod target;
pub mod zone;

pub use detection::*;
pub use motion::*;
pub use range::*;
pub use target::*;
pub use zone::*;
