pub mod config;
pub mod corpus;
pub mod error;
pub mod traits;
pub mod types;

pub use corpus::CorpusStore;
pub use error::{Error, Result};
