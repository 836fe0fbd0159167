pub mod formulas;
pub mod merge;
pub mod sources;
pub mod tree;
pub mod types;

pub use formulas::*;
pub use merge::*;
pub use sources::*;
pub use tree::*;
pub use types::*;
