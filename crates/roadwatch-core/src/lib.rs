//! Shared models, judgment parsing and prompt building for the roadwatch
//! hazard verification pipeline.

pub mod error;
pub mod judgment;
pub mod model;
pub mod prompt;
pub mod time;

pub use error::*;
pub use judgment::*;
pub use model::*;
pub use prompt::*;
pub use time::*;
