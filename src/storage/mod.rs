// SPDX-License-Identifier: Apache-2.0

//! Storage abstraction for projections.
//!
//! A [`Store`] hands out one [`UnitOfWork`] per `handle_events` call. All
//! view writes and the checkpoint bump for a height go through the same unit
//! of work and become visible only on `commit`; dropping a unit of work
//! without committing discards everything it buffered.

pub mod memory;
pub mod postgres;

use crate::models::BlockRow;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("connection pool error: {0}")]
    Pool(String),
    #[error("a block row already exists at height {0}")]
    DuplicateBlock(i64),
    #[error("error serializing view row: {0}")]
    Serialize(String),
}

#[async_trait]
pub trait Store: Send + Sync + 'static {
    type Uow: UnitOfWork;

    /// Opens a new transactional unit of work.
    async fn begin(&self) -> Result<Self::Uow, StoreError>;

    /// Last committed checkpoint height for a projection, `None` if the
    /// projection has never handled anything.
    async fn last_handled_height(&self, projection_name: &str)
        -> Result<Option<i64>, StoreError>;
}

/// The write surface available inside one atomic scope. Methods cover the
/// view tables owned by the projections in this crate; reads observe the
/// unit's own uncommitted writes.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn insert_block(&mut self, block: &BlockRow) -> Result<(), StoreError>;

    async fn stat(&mut self, metric: &str) -> Result<Option<String>, StoreError>;

    async fn put_stat(&mut self, metric: &str, value: &str) -> Result<(), StoreError>;

    /// Writes the checkpoint row. Never moves an existing checkpoint
    /// backwards.
    async fn advance_checkpoint(
        &mut self,
        projection_name: &str,
        height: i64,
    ) -> Result<(), StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}
