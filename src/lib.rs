// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod execution;
pub mod extract;
pub mod ingest;
pub mod lexicon;
pub mod pipeline;
pub mod sector;
pub mod source_trust;
pub mod store;
pub mod telemetry;
pub mod worldview;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::Aggregator;
pub use crate::config::{DataPaths, SynthesisConfig};
pub use crate::error::SynthesisError;
pub use crate::extract::{Direction, ExtractedSignal, SignalExtractor};
pub use crate::ingest::types::{FeedEntry, RawItem};
pub use crate::lexicon::Lexicon;
pub use crate::pipeline::{run_synthesis, CycleReport};
pub use crate::sector::{classify, Sector};
pub use crate::source_trust::SourceTrustTable;
pub use crate::worldview::{Stance, Thesis, ThesisStatus, Worldview};
