// SPDX-License-Identifier: Apache-2.0

//! Running chain-wide totals. Unlike Block this projection listens to more
//! than one event type and reads back its own state, so later heights depend
//! on what earlier heights committed.

use super::{rollback_quietly, Projection, ProjectionCheckpoint, ProjectionError};
use crate::coin::Coin;
use crate::events::{self, ChainEvent, TransactionCreated};
use crate::storage::{Store, UnitOfWork};
use crate::utils::counters::{
    PROJECTION_ERROR_COUNT, PROJECTION_HANDLED_EVENTS_COUNT, PROJECTION_LAST_HANDLED_HEIGHT,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

pub const NAME: &str = "ChainStats";

pub const TOTAL_BLOCK_COUNT: &str = "total_block_count";
pub const TOTAL_TRANSACTION_COUNT: &str = "total_transaction_count";
pub const TOTAL_FEE: &str = "total_fee";

pub struct ChainStatsProjection<S: Store> {
    store: Arc<S>,
    checkpoint: ProjectionCheckpoint,
}

impl<S: Store> ChainStatsProjection<S> {
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
                ChainEvent::BlockCreated(_) => {
                    self.increment_stat(uow, TOTAL_BLOCK_COUNT, 1).await?
                }
                ChainEvent::TransactionCreated(transaction_created) => {
                    self.apply_transaction_created(uow, height, transaction_created)
                        .await?
                }
                other => return Err(ProjectionError::unexpected_event(other, height)),
            }
        }
        self.checkpoint.advance(uow, height).await?;
        Ok(())
    }

    async fn apply_transaction_created(
        &self,
        uow: &mut S::Uow,
        height: i64,
        event: &TransactionCreated,
    ) -> Result<(), ProjectionError> {
        self.increment_stat(uow, TOTAL_TRANSACTION_COUNT, 1).await?;
        self.accumulate_fee(uow, height, &event.fee).await?;
        Ok(())
    }

    async fn increment_stat(
        &self,
        uow: &mut S::Uow,
        metric: &str,
        delta: i64,
    ) -> Result<(), ProjectionError> {
        let current = match uow.stat(metric).await? {
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|e| ProjectionError::MalformedStat {
                    metric: metric.to_string(),
                    reason: e.to_string(),
                })?,
            None => 0,
        };
        uow.put_stat(metric, &(current + delta).to_string()).await?;
        Ok(())
    }

    async fn accumulate_fee(
        &self,
        uow: &mut S::Uow,
        height: i64,
        fee: &Coin,
    ) -> Result<(), ProjectionError> {
        let total = match uow.stat(TOTAL_FEE).await? {
            Some(raw) => {
                serde_json::from_str::<Coin>(&raw).map_err(|e| ProjectionError::MalformedStat {
                    metric: TOTAL_FEE.to_string(),
                    reason: e.to_string(),
                })?
            }
            None => Coin::zero(fee.denom()),
        };
        let total = total
            .add(fee)
            .map_err(|source| ProjectionError::Coin { height, source })?;
        let encoded =
            serde_json::to_string(&total).map_err(|e| ProjectionError::MalformedStat {
                metric: TOTAL_FEE.to_string(),
                reason: e.to_string(),
            })?;
        uow.put_stat(TOTAL_FEE, &encoded).await?;
        Ok(())
    }
}

#[async_trait]
impl<S: Store> Projection for ChainStatsProjection<S> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn events_to_listen(&self) -> &'static [&'static str] {
        &[events::BLOCK_CREATED, events::TRANSACTION_CREATED]
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
