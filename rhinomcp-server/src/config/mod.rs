//! Configuration management

mod loader;
mod schema;

pub use loader::ConfigLoader;
pub use schema::*;
