pub mod files;
pub mod market;

pub use files::*;
pub use market::*;
