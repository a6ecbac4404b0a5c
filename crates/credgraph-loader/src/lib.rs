pub mod fetch;
pub mod source;

pub use fetch::*;
pub use source::*;
