pub mod catalog;
pub mod interactions;
pub mod providers;
pub mod recommendations;
pub mod reranker;
pub mod signal_store;

pub use catalog::Catalog;
pub use reranker::{partition_and_rerank, rerank, ScoringPolicy};
pub use signal_store::{SignalRepository, SignalStore};
