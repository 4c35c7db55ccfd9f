// SPDX-License-Identifier: Apache-2.0

//! The projection engine contract.
//!
//! A projection consumes one block's worth of ordered events at a time and
//! maintains its own view tables plus a resumable checkpoint. All writes for
//! a height happen inside a single unit of work: either every view row and
//! the checkpoint advance commit together, or none of them do. The driver
//! must present heights to a projection in strictly increasing order and
//! must not interleave two `handle_events` calls for the same projection.

pub mod block;
pub mod chain_stats;
pub mod checkpoint;

pub use block::BlockProjection;
pub use chain_stats::ChainStatsProjection;
pub use checkpoint::ProjectionCheckpoint;

use crate::coin::CoinError;
use crate::events::ChainEvent;
use crate::storage::{StoreError, UnitOfWork};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    /// An event outside the projection's declared interest reached it. This
    /// is a wiring defect in the driver, not a recoverable condition.
    #[error("received unexpected event {name}V{version}({uuid}) at height {height}")]
    UnexpectedEvent {
        name: String,
        version: i32,
        uuid: String,
        height: i64,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("coin arithmetic failed at height {height}: {source}")]
    Coin {
        height: i64,
        #[source]
        source: CoinError,
    },
    #[error("invalid chain stats value for metric {metric}: {reason}")]
    MalformedStat { metric: String, reason: String },
}

impl ProjectionError {
    pub(crate) fn unexpected_event(event: &ChainEvent, height: i64) -> Self {
        Self::UnexpectedEvent {
            name: event.name().to_string(),
            version: event.version(),
            uuid: event.uuid().to_string(),
            height,
        }
    }
}

/// Capability set every concrete projection implements. The driver routes
/// events by `events_to_listen`, calls `on_init` once before feeding
/// anything, and resumes from `last_handled_event_height` after a restart.
#[async_trait]
pub trait Projection: Send + Sync {
    fn name(&self) -> &'static str;

    fn events_to_listen(&self) -> &'static [&'static str];

    async fn on_init(&self) -> Result<(), ProjectionError> {
        Ok(())
    }

    /// Applies one height's ordered events and advances the checkpoint,
    /// atomically. An empty batch still advances the checkpoint. On error
    /// nothing is persisted and the identical call may be retried.
    async fn handle_events(&self, height: i64, events: &[ChainEvent])
        -> Result<(), ProjectionError>;

    async fn last_handled_event_height(&self) -> Result<Option<i64>, ProjectionError>;
}

pub(crate) async fn rollback_quietly<U: UnitOfWork>(uow: U, projection_name: &str) {
    if let Err(e) = uow.rollback().await {
        tracing::warn!(
            projection_name,
            error = %e,
            "failed to roll back unit of work",
        );
    }
}
