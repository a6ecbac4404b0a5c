pub mod accessor;
pub mod export;
pub mod prefix;

pub use accessor::*;
pub use export::*;
pub use prefix::*;
