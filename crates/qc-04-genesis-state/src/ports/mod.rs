pub mod api;
pub mod context;
pub mod database;

pub use api::*;
pub use context::*;
pub use database::*;
