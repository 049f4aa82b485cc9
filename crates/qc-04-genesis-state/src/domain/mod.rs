pub mod config;
pub mod entities;
pub mod errors;
pub mod replay;
pub mod summary;

pub use config::*;
pub use entities::*;
pub use errors::*;
pub use replay::{ReplayOutcome, SkippedAccount};
pub use summary::*;
