//! HTTP Engine (C1) — concurrency-bounded fetch layer and trainer.

pub mod engine;
pub mod trainer;

pub use engine::{EngineStats, FetchHint, HttpEngine};
pub use trainer::Trainer;
