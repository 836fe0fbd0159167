pub mod database;
pub mod tables;

pub use database::*;
pub use tables::{generate_create_table, REQUIRED_TABLES};
