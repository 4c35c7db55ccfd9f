// SPDX-License-Identifier: Apache-2.0

//! The Block projection: one denormalized `blocks` row per `BlockCreated`
//! event. This is the template every other projection follows — single unit
//! of work, events applied in order, checkpoint bumped last.

use super::{rollback_quietly, Projection, ProjectionCheckpoint, ProjectionError};
use crate::events::{self, BlockCreated, ChainEvent};
use crate::models::{BlockRow, CommittedCouncilNode};
use crate::storage::{Store, UnitOfWork};
use crate::utils::counters::{
    PROJECTION_ERROR_COUNT, PROJECTION_HANDLED_EVENTS_COUNT, PROJECTION_LAST_HANDLED_HEIGHT,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

pub const NAME: &str = "Block";

pub struct BlockProjection<S: Store> {
    store: Arc<S>,
    checkpoint: ProjectionCheckpoint,
}

impl<S: Store> BlockProjection<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            checkpoint: ProjectionCheckpoint::new(NAME),
        }
    }

    async fn apply_events(
        &self,
        uow: &mut S::Uow,
        height: i64,
        events: &[ChainEvent],
    ) -> Result<(), ProjectionError> {
        for event in events {
            match event {
                ChainEvent::BlockCreated(block_created) => {
                    self.apply_block_created(uow, block_created).await?
                }
                other => return Err(ProjectionError::unexpected_event(other, height)),
            }
        }
        self.checkpoint.advance(uow, height).await?;
        Ok(())
    }

    async fn apply_block_created(
        &self,
        uow: &mut S::Uow,
        event: &BlockCreated,
    ) -> Result<(), ProjectionError> {
        let committed_council_nodes = event
            .block
            .signatures
            .iter()
            .map(|signature| CommittedCouncilNode {
                address: signature.validator_address.clone(),
                time: signature.timestamp,
                signature: signature.signature.clone(),
                is_proposer: event.block.proposer_address == signature.validator_address,
            })
            .collect();

        uow.insert_block(&BlockRow {
            height: event.block.height,
            hash: event.block.hash.clone(),
            time: event.block.time,
            app_hash: event.block.app_hash.clone(),
            transaction_count: event.block.txs.len() as i64,
            committed_council_nodes,
        })
        .await?;
        Ok(())
    }
}

#[async_trait]
impl<S: Store> Projection for BlockProjection<S> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn events_to_listen(&self) -> &'static [&'static str] {
        &[events::BLOCK_CREATED]
    }

    async fn handle_events(
        &self,
        height: i64,
        events: &[ChainEvent],
    ) -> Result<(), ProjectionError> {
        let mut uow = self.store.begin().await?;
        match self.apply_events(&mut uow, height, events).await {
            Ok(()) => {
                uow.commit().await.map_err(|e| {
                    PROJECTION_ERROR_COUNT.with_label_values(&[NAME]).inc();
                    ProjectionError::from(e)
                })?;
                PROJECTION_LAST_HANDLED_HEIGHT
                    .with_label_values(&[NAME])
                    .set(height);
                PROJECTION_HANDLED_EVENTS_COUNT
                    .with_label_values(&[NAME])
                    .inc_by(events.len() as u64);
                info!(projection_name = NAME, height, event_count = events.len(), "handled events");
                Ok(())
            }
            Err(err) => {
                PROJECTION_ERROR_COUNT.with_label_values(&[NAME]).inc();
                warn!(projection_name = NAME, height, error = %err, "rolling back unit of work");
                rollback_quietly(uow, NAME).await;
                Err(err)
            }
        }
    }

    async fn last_handled_event_height(&self) -> Result<Option<i64>, ProjectionError> {
        Ok(self.checkpoint.last_handled_height(&*self.store).await?)
    }
}
