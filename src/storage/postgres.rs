// SPDX-License-Identifier: Apache-2.0

//! Postgres-backed store. Each unit of work owns a pooled connection with an
//! open transaction; `commit`/`rollback` close it out explicitly.

use super::{Store, StoreError, UnitOfWork};
use crate::models::BlockRow;
use crate::schema::{blocks, chain_stats, projection_checkpoints};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::query_builder::{AstPass, Query, QueryFragment, QueryId};
use diesel::upsert::excluded;
use diesel::{AsChangeset, ExpressionMethods, Insertable, OptionalExtension, QueryDsl, QueryResult};
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::{
    AnsiTransactionManager, AsyncPgConnection, RunQueryDsl, SimpleAsyncConnection,
    TransactionManager,
};

pub const DEFAULT_POOL_SIZE: u32 = 16;

pub type DbPool = Pool<AsyncPgConnection>;
pub type DbPoolConnection = PooledConnection<'static, AsyncPgConnection>;

const BOOTSTRAP_SQL: &str = include_str!("../../migrations/schema.sql");

pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_pool_size: Option<u32>) -> Result<Self, StoreError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(max_pool_size.unwrap_or(DEFAULT_POOL_SIZE))
            .build(manager)
            .await
            .map_err(|e| StoreError::Pool(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Applies the idempotent bootstrap DDL. Safe to run on every startup.
    pub async fn bootstrap_schema(&self) -> Result<(), StoreError> {
        let mut conn = self.get_conn().await?;
        conn.batch_execute(BOOTSTRAP_SQL).await?;
        Ok(())
    }

    async fn get_conn(&self) -> Result<DbPoolConnection, StoreError> {
        self.pool
            .get_owned()
            .await
            .map_err(|e| StoreError::Pool(e.to_string()))
    }
}

#[async_trait]
impl Store for PgStore {
    type Uow = PgUnitOfWork;

    async fn begin(&self) -> Result<PgUnitOfWork, StoreError> {
        let mut conn = self.get_conn().await?;
        AnsiTransactionManager::begin_transaction(&mut *conn).await?;
        Ok(PgUnitOfWork { conn })
    }

    async fn last_handled_height(
        &self,
        projection_name: &str,
    ) -> Result<Option<i64>, StoreError> {
        let mut conn = self.get_conn().await?;
        let height = projection_checkpoints::table
            .filter(projection_checkpoints::projection_name.eq(projection_name))
            .select(projection_checkpoints::last_handled_height)
            .first::<i64>(&mut *conn)
            .await
            .optional()?;
        Ok(height)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = blocks)]
struct NewBlock {
    height: i64,
    hash: String,
    time: DateTime<Utc>,
    app_hash: String,
    transaction_count: i64,
    committed_council_nodes: serde_json::Value,
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = projection_checkpoints)]
struct CheckpointRow {
    projection_name: String,
    last_handled_height: i64,
    last_updated: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = chain_stats)]
struct StatRow {
    metric: String,
    value: String,
}

pub struct PgUnitOfWork {
    conn: DbPoolConnection,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn insert_block(&mut self, block: &BlockRow) -> Result<(), StoreError> {
        let row = NewBlock {
            height: block.height,
            hash: block.hash.clone(),
            time: block.time,
            app_hash: block.app_hash.clone(),
            transaction_count: block.transaction_count,
            committed_council_nodes: serde_json::to_value(&block.committed_council_nodes)
                .map_err(|e| StoreError::Serialize(e.to_string()))?,
        };
        diesel::insert_into(blocks::table)
            .values(&row)
            .execute(&mut *self.conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(
                    diesel::result::DatabaseErrorKind::UniqueViolation,
                    _,
                ) => StoreError::DuplicateBlock(block.height),
                other => StoreError::Database(other),
            })?;
        Ok(())
    }

    async fn stat(&mut self, metric: &str) -> Result<Option<String>, StoreError> {
        let value = chain_stats::table
            .filter(chain_stats::metric.eq(metric))
            .select(chain_stats::value)
            .first::<String>(&mut *self.conn)
            .await
            .optional()?;
        Ok(value)
    }

    async fn put_stat(&mut self, metric: &str, value: &str) -> Result<(), StoreError> {
        let row = StatRow {
            metric: metric.to_string(),
            value: value.to_string(),
        };
        diesel::insert_into(chain_stats::table)
            .values(&row)
            .on_conflict(chain_stats::metric)
            .do_update()
            .set(chain_stats::value.eq(excluded(chain_stats::value)))
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }

    async fn advance_checkpoint(
        &mut self,
        projection_name: &str,
        height: i64,
    ) -> Result<(), StoreError> {
        let row = CheckpointRow {
            projection_name: projection_name.to_string(),
            last_handled_height: height,
            last_updated: Utc::now(),
        };
        let upsert = diesel::insert_into(projection_checkpoints::table)
            .values(&row)
            .on_conflict(projection_checkpoints::projection_name)
            .do_update()
            .set((
                projection_checkpoints::last_handled_height
                    .eq(excluded(projection_checkpoints::last_handled_height)),
                projection_checkpoints::last_updated
                    .eq(excluded(projection_checkpoints::last_updated)),
            ));
        GuardedUpsertQuery {
            query: upsert,
            where_clause:
                " WHERE projection_checkpoints.last_handled_height <= EXCLUDED.last_handled_height ",
        }
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        AnsiTransactionManager::commit_transaction(&mut *self.conn).await?;
        Ok(())
    }

    async fn rollback(mut self) -> Result<(), StoreError> {
        AnsiTransactionManager::rollback_transaction(&mut *self.conn).await?;
        Ok(())
    }
}

/// Appends a raw guard clause to an upsert. Diesel has no native
/// `ON CONFLICT ... DO UPDATE ... WHERE`, and the checkpoint update must not
/// move an existing checkpoint backwards.
struct GuardedUpsertQuery<T> {
    query: T,
    where_clause: &'static str,
}

impl<T: Query> Query for GuardedUpsertQuery<T> {
    type SqlType = T::SqlType;
}

impl<T> QueryId for GuardedUpsertQuery<T> {
    type QueryId = ();
    const HAS_STATIC_QUERY_ID: bool = false;
}

impl<T> QueryFragment<Pg> for GuardedUpsertQuery<T>
where
    T: QueryFragment<Pg>,
{
    fn walk_ast<'b>(&'b self, mut out: AstPass<'_, 'b, Pg>) -> QueryResult<()> {
        self.query.walk_ast(out.reborrow())?;
        out.push_sql(self.where_clause);
        Ok(())
    }
}
