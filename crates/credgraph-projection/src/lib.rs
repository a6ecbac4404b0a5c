pub mod flow;
pub mod projection;
pub mod ranking;
pub mod rows;
pub mod series;

pub use projection::*;
pub use rows::*;

// Re-export the input types callers need to build a projection
pub use credgraph_graph::{AccountsExport, CredResult, NodeRecord};
