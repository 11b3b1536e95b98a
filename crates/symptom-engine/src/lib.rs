pub mod aggregate;
pub mod classifier;
pub mod context;
pub mod corpus;
pub mod error;
pub mod overrides;
pub mod reference;
pub mod rules;
pub mod scorer;
pub mod symptoms;
pub mod vocabulary;

pub use context::{DataPaths, EngineContext};
pub use error::EngineError;
pub use symptoms::SymptomSet;
