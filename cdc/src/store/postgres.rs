use std::fmt::Write;

use config::shared::PgConnectionConfig;
use pg_escape::quote_identifier;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions};
use sqlx::query::Query;
use sqlx::{Executor, Postgres};
use tracing::debug;

use crate::error::CdcResult;
use crate::store::base::{TargetClient, TargetConnector};
use crate::types::Cell;

/// Maximum connections held by the target pool.
///
/// Events within a batch are applied sequentially, so a single connection is
/// enough; the pool exists for its health checking and reconnect-on-checkout
/// behavior.
const MAX_POOL_CONNECTIONS: u32 = 1;

/// Relational target store backed by Postgres through sqlx.
///
/// Upserts use `INSERT … ON CONFLICT (key) DO UPDATE`, so applying the same
/// operation twice leaves the row identical to applying it once. Deletes by
/// key succeed whether or not the row exists.
#[derive(Debug, Clone)]
pub struct PgTargetClient {
    pool: PgPool,
}

impl PgTargetClient {
    /// Wraps an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn upsert_statement(table: &str, key: &[(String, Cell)], columns: &[(String, Cell)]) -> String {
        let mut statement = String::new();

        let quoted_columns = key
            .iter()
            .chain(columns.iter())
            .map(|(name, _)| quote_identifier(name).to_string())
            .collect::<Vec<_>>();
        let placeholders = (1..=quoted_columns.len())
            .map(|index| format!("${index}"))
            .collect::<Vec<_>>();
        let conflict_target = key
            .iter()
            .map(|(name, _)| quote_identifier(name).to_string())
            .collect::<Vec<_>>();

        let _ = write!(
            statement,
            "insert into {} ({}) values ({}) on conflict ({})",
            quote_identifier(table),
            quoted_columns.join(", "),
            placeholders.join(", "),
            conflict_target.join(", "),
        );

        if columns.is_empty() {
            statement.push_str(" do nothing");
        } else {
            let assignments = columns
                .iter()
                .map(|(name, _)| {
                    let quoted = quote_identifier(name).to_string();
                    format!("{quoted} = excluded.{quoted}")
                })
                .collect::<Vec<_>>();
            let _ = write!(statement, " do update set {}", assignments.join(", "));
        }

        statement
    }

    fn delete_statement(table: &str, key: &[(String, Cell)]) -> String {
        let conditions = key
            .iter()
            .enumerate()
            .map(|(index, (name, _))| {
                format!("{} = ${}", quote_identifier(name), index + 1)
            })
            .collect::<Vec<_>>();

        format!(
            "delete from {} where {}",
            quote_identifier(table),
            conditions.join(" and "),
        )
    }
}

/// Binds a cell value as the next query parameter.
fn bind_cell<'q>(
    query: Query<'q, Postgres, PgArguments>,
    cell: &'q Cell,
) -> Query<'q, Postgres, PgArguments> {
    match cell {
        Cell::Null => query.bind(Option::<String>::None),
        Cell::Bool(value) => query.bind(*value),
        Cell::I64(value) => query.bind(*value),
        Cell::F64(value) => query.bind(*value),
        Cell::String(value) => query.bind(value.as_str()),
        Cell::Timestamp(value) => query.bind(*value),
        Cell::Uuid(value) => query.bind(*value),
        Cell::Json(value) => query.bind(sqlx::types::Json(value)),
    }
}

impl TargetClient for PgTargetClient {
    async fn upsert(
        &self,
        table: &str,
        key: &[(String, Cell)],
        columns: &[(String, Cell)],
    ) -> CdcResult<()> {
        let statement = Self::upsert_statement(table, key, columns);
        debug!(table, statement, "executing upsert");

        let mut query = sqlx::query(&statement);
        for (_, cell) in key.iter().chain(columns.iter()) {
            query = bind_cell(query, cell);
        }

        self.pool.execute(query).await?;

        Ok(())
    }

    async fn delete(&self, table: &str, key: &[(String, Cell)]) -> CdcResult<()> {
        let statement = Self::delete_statement(table, key);
        debug!(table, statement, "executing delete");

        let mut query = sqlx::query(&statement);
        for (_, cell) in key.iter() {
            query = bind_cell(query, cell);
        }

        self.pool.execute(query).await?;

        Ok(())
    }
}

/// Connector establishing Postgres pools from configuration.
#[derive(Debug, Clone)]
pub struct PgConnector {
    config: PgConnectionConfig,
}

impl PgConnector {
    /// Creates a connector for the given target connection settings.
    pub fn new(config: PgConnectionConfig) -> Self {
        Self { config }
    }
}

impl TargetConnector for PgConnector {
    type Client = PgTargetClient;

    async fn connect(&self) -> CdcResult<PgTargetClient> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_POOL_CONNECTIONS)
            .test_before_acquire(true)
            .connect_with(self.config.with_db())
            .await?;

        Ok(PgTargetClient::new(pool))
    }
}
