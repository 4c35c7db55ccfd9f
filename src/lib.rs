// SPDX-License-Identifier: Apache-2.0

//! Event-sourcing projection engine for a Cosmos chain indexer.
//!
//! An external ingester delivers `(height, events)` batches in strictly
//! increasing height order to every [`projections::Projection`] that
//! declared interest. Each projection applies the batch to its own view
//! tables and advances its checkpoint inside one unit of work, so a crash
//! at any point resumes cleanly from the last committed height.

pub mod coin;
pub mod config;
pub mod decoder;
pub mod events;
pub mod models;
pub mod projections;
pub mod schema;
pub mod storage;
pub mod utils;

pub use coin::Coin;
pub use config::IndexerConfig;
pub use decoder::TxDecoder;
pub use events::{ChainEvent, EventRegistry};
pub use projections::Projection;
