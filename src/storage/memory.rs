// SPDX-License-Identifier: Apache-2.0

//! In-memory store for tests and fast dev runs. Writes are buffered in the
//! unit of work and applied under one lock at commit, so partially applied
//! batches are never observable.

use super::{Store, StoreError, UnitOfWork};
use crate::models::BlockRow;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct MemoryState {
    blocks: BTreeMap<i64, BlockRow>,
    stats: BTreeMap<String, String>,
    checkpoints: BTreeMap<String, i64>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block_count(&self) -> usize {
        self.lock().blocks.len()
    }

    pub fn block(&self, height: i64) -> Option<BlockRow> {
        self.lock().blocks.get(&height).cloned()
    }

    pub fn stat(&self, metric: &str) -> Option<String> {
        self.lock().stats.get(metric).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().expect("memory store lock poisoned")
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Uow = MemoryUnitOfWork;

    async fn begin(&self) -> Result<MemoryUnitOfWork, StoreError> {
        Ok(MemoryUnitOfWork {
            state: Arc::clone(&self.state),
            pending: Vec::new(),
        })
    }

    async fn last_handled_height(
        &self,
        projection_name: &str,
    ) -> Result<Option<i64>, StoreError> {
        Ok(self.lock().checkpoints.get(projection_name).copied())
    }
}

#[derive(Debug)]
enum PendingWrite {
    Block(BlockRow),
    Stat(String, String),
    Checkpoint(String, i64),
}

pub struct MemoryUnitOfWork {
    state: Arc<Mutex<MemoryState>>,
    pending: Vec<PendingWrite>,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn insert_block(&mut self, block: &BlockRow) -> Result<(), StoreError> {
        let committed_duplicate = {
            let state = self.state.lock().expect("memory store lock poisoned");
            state.blocks.contains_key(&block.height)
        };
        let pending_duplicate = self.pending.iter().any(|write| {
            matches!(write, PendingWrite::Block(pending) if pending.height == block.height)
        });
        if committed_duplicate || pending_duplicate {
            return Err(StoreError::DuplicateBlock(block.height));
        }
        self.pending.push(PendingWrite::Block(block.clone()));
        Ok(())
    }

    async fn stat(&mut self, metric: &str) -> Result<Option<String>, StoreError> {
        // Our own uncommitted write wins over the committed value.
        let pending = self.pending.iter().rev().find_map(|write| match write {
            PendingWrite::Stat(name, value) if name == metric => Some(value.clone()),
            _ => None,
        });
        if pending.is_some() {
            return Ok(pending);
        }
        let state = self.state.lock().expect("memory store lock poisoned");
        Ok(state.stats.get(metric).cloned())
    }

    async fn put_stat(&mut self, metric: &str, value: &str) -> Result<(), StoreError> {
        self.pending
            .push(PendingWrite::Stat(metric.to_string(), value.to_string()));
        Ok(())
    }

    async fn advance_checkpoint(
        &mut self,
        projection_name: &str,
        height: i64,
    ) -> Result<(), StoreError> {
        self.pending
            .push(PendingWrite::Checkpoint(projection_name.to_string(), height));
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        let mut state = self.state.lock().expect("memory store lock poisoned");
        // Validate before applying anything: a unit of work that raced
        // another commit on the same height must fail without leaving any
        // of its writes behind.
        for write in &self.pending {
            if let PendingWrite::Block(block) = write {
                if state.blocks.contains_key(&block.height) {
                    return Err(StoreError::DuplicateBlock(block.height));
                }
            }
        }
        for write in self.pending {
            match write {
                PendingWrite::Block(block) => {
                    state.blocks.insert(block.height, block);
                }
                PendingWrite::Stat(metric, value) => {
                    state.stats.insert(metric, value);
                }
                PendingWrite::Checkpoint(projection_name, height) => {
                    let entry = state.checkpoints.entry(projection_name).or_insert(height);
                    *entry = (*entry).max(height);
                }
            }
        }
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}
