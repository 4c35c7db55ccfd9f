// SPDX-License-Identifier: Apache-2.0

use crate::storage::{Store, StoreError, UnitOfWork};

/// Per-projection checkpoint handle. Every projection holds one and
/// delegates to it, so checkpoint persistence lives in exactly one place.
pub struct ProjectionCheckpoint {
    projection_name: &'static str,
}

impl ProjectionCheckpoint {
    pub fn new(projection_name: &'static str) -> Self {
        Self { projection_name }
    }

    pub fn projection_name(&self) -> &'static str {
        self.projection_name
    }

    pub async fn last_handled_height<S: Store>(
        &self,
        store: &S,
    ) -> Result<Option<i64>, StoreError> {
        store.last_handled_height(self.projection_name).await
    }

    /// Must be called inside the same unit of work as the view writes it
    /// checkpoints.
    pub async fn advance<U: UnitOfWork>(&self, uow: &mut U, height: i64) -> Result<(), StoreError> {
        uow.advance_checkpoint(self.projection_name, height).await
    }
}
