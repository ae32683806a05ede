//! Index construction: normalization of raw content and the orchestration of
//! full and incremental builds

mod config;
mod error;
mod normalizer;
mod orchestrator;

pub use config::IndexerConfig;
pub use error::{IndexerError, IndexerResult};
pub use normalizer::ContentNormalizer;
pub use orchestrator::{
    EngineStatus, Indexer, IndexingError, IndexingReport, IndexingStatus, RefreshOutcome,
};
