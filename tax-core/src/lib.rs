pub mod calculations;
pub mod engine;
pub mod error;
pub mod models;
pub mod repository;
pub mod scenario;

#[cfg(test)]
mod test_support;

pub use engine::TaxEngine;
pub use error::{ConfigError, EngineError};
pub use models::*;
pub use repository::{InMemoryRepository, RepositoryError, TaxRulesRepository};
