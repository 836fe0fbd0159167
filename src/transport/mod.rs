pub mod cost;
pub mod job;
pub mod route;

pub use cost::*;
pub use job::*;
pub use route::*;
