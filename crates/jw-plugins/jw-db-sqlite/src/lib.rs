//! # jw-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `jw-core` order document. Embedded collections are kept as JSON text.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jw_core::models::{Order, OrderQuery, OrderStatus, SortDirection, SortField};
use jw_core::traits::OrderRepo;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS orders (
        id                BLOB PRIMARY KEY,
        owner             BLOB NOT NULL,
        line_items        TEXT NOT NULL,
        shipping_address  TEXT NOT NULL,
        payment_method    TEXT NOT NULL,
        payment_reference TEXT,
        payment_metadata  TEXT,
        total_amount      REAL NOT NULL,
        is_paid           BOOLEAN NOT NULL DEFAULT 0,
        paid_at           TEXT,
        is_delivered      BOOLEAN NOT NULL DEFAULT 0,
        delivered_at      TEXT,
        status            TEXT NOT NULL,
        status_history    TEXT NOT NULL,
        tracking          TEXT,
        admin_notes       TEXT NOT NULL DEFAULT '',
        created_at        TEXT NOT NULL,
        updated_at        TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_orders_owner ON orders (owner, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_orders_status ON orders (status)",
];

// Bind order shared by INSERT and UPDATE: every column but `id`, then `id`.
const INSERT_ORDER: &str = "INSERT INTO orders (owner, line_items, shipping_address, payment_method, \
    payment_reference, payment_metadata, total_amount, is_paid, paid_at, is_delivered, delivered_at, \
    status, status_history, tracking, admin_notes, created_at, updated_at, id) \
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

const UPDATE_ORDER: &str = "UPDATE orders SET owner = ?, line_items = ?, shipping_address = ?, \
    payment_method = ?, payment_reference = ?, payment_metadata = ?, total_amount = ?, is_paid = ?, \
    paid_at = ?, is_delivered = ?, delivered_at = ?, status = ?, status_history = ?, tracking = ?, \
    admin_notes = ?, created_at = ?, updated_at = ? WHERE id = ?";

pub struct SqliteOrderRepo {
    pool: SqlitePool,
}

impl SqliteOrderRepo {
    /// Connects to `url` (e.g. `sqlite:jewel_orders.db` or `sqlite::memory:`)
    /// and makes sure the schema exists.
    ///
    /// An in-memory database lives and dies with its connection, so the pool
    /// is pinned to a single connection that never expires.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new().connect_with(options).await?
        };

        let repo = Self { pool };
        repo.migrate().await?;
        log::info!("SQLite order store ready at {}", url);
        Ok(repo)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

// Helper for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> anyhow::Result<Uuid> {
    Ok(Uuid::from_slice(blob)?)
}

fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::CreatedAt => "created_at",
        SortField::UpdatedAt => "updated_at",
        SortField::TotalAmount => "total_amount",
        SortField::Status => "status",
    }
}

fn sort_keyword(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    }
}

/// Logs a failed statement before it travels up as an `anyhow` error.
fn logged(op: &'static str) -> impl Fn(sqlx::Error) -> sqlx::Error {
    move |err| {
        log::error!("{}: {}", op, err);
        err
    }
}

fn bind_order<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    order: &Order,
) -> anyhow::Result<Query<'q, Sqlite, SqliteArguments<'q>>> {
    let payment_metadata = order
        .payment_metadata
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let tracking = order.tracking.as_ref().map(serde_json::to_string).transpose()?;

    Ok(query
        .bind(uuid_to_blob(order.owner))
        .bind(serde_json::to_string(&order.line_items)?)
        .bind(serde_json::to_string(&order.shipping_address)?)
        .bind(order.payment_method.clone())
        .bind(order.payment_reference.clone())
        .bind(payment_metadata)
        .bind(order.total_amount)
        .bind(order.is_paid)
        .bind(order.paid_at)
        .bind(order.is_delivered)
        .bind(order.delivered_at)
        .bind(order.status.as_str())
        .bind(serde_json::to_string(&order.status_history)?)
        .bind(tracking)
        .bind(order.admin_notes.clone())
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(uuid_to_blob(order.id)))
}

/// Maps a row back to the domain model.
fn row_to_order(row: &SqliteRow) -> anyhow::Result<Order> {
    let payment_metadata: Option<String> = row.try_get("payment_metadata")?;
    let tracking: Option<String> = row.try_get("tracking")?;

    Ok(Order {
        id: blob_to_uuid(row.try_get::<Vec<u8>, _>("id")?.as_slice())?,
        owner: blob_to_uuid(row.try_get::<Vec<u8>, _>("owner")?.as_slice())?,
        line_items: serde_json::from_str(&row.try_get::<String, _>("line_items")?)?,
        shipping_address: serde_json::from_str(&row.try_get::<String, _>("shipping_address")?)?,
        payment_method: row.try_get("payment_method")?,
        payment_reference: row.try_get("payment_reference")?,
        payment_metadata: payment_metadata.as_deref().map(serde_json::from_str).transpose()?,
        total_amount: row.try_get("total_amount")?,
        is_paid: row.try_get("is_paid")?,
        paid_at: row.try_get::<Option<DateTime<Utc>>, _>("paid_at")?,
        is_delivered: row.try_get("is_delivered")?,
        delivered_at: row.try_get::<Option<DateTime<Utc>>, _>("delivered_at")?,
        status: OrderStatus::from_str(&row.try_get::<String, _>("status")?)?,
        status_history: serde_json::from_str(&row.try_get::<String, _>("status_history")?)?,
        tracking: tracking.as_deref().map(serde_json::from_str).transpose()?,
        admin_notes: row.try_get("admin_notes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl OrderRepo for SqliteOrderRepo {
    async fn insert_order(&self, mut order: Order) -> anyhow::Result<Order> {
        let now = Utc::now();
        order.created_at = now;
        order.updated_at = now;

        bind_order(sqlx::query(INSERT_ORDER), &order)?
            .execute(&self.pool)
            .await
            .map_err(logged("insert_order"))?;
        Ok(order)
    }

    async fn get_order(&self, id: Uuid) -> anyhow::Result<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(logged("get_order"))?;

        row.as_ref().map(row_to_order).transpose()
    }

    /// Whole-document overwrite. No version check: the last writer wins.
    async fn save_order(&self, mut order: Order) -> anyhow::Result<Order> {
        order.updated_at = Utc::now();

        let result = bind_order(sqlx::query(UPDATE_ORDER), &order)?
            .execute(&self.pool)
            .await
            .map_err(logged("save_order"))?;
        if result.rows_affected() == 0 {
            log::error!("save_order: order {} is not in the store", order.id);
            anyhow::bail!("order {} is not in the store", order.id);
        }
        Ok(order)
    }

    async fn list_by_owner(&self, owner: Uuid) -> anyhow::Result<Vec<Order>> {
        let rows = sqlx::query("SELECT * FROM orders WHERE owner = ? ORDER BY created_at DESC, id DESC")
            .bind(uuid_to_blob(owner))
            .fetch_all(&self.pool)
            .await
            .map_err(logged("list_by_owner"))?;

        rows.iter().map(row_to_order).collect()
    }

    async fn list_orders(&self, query: &OrderQuery) -> anyhow::Result<(Vec<Order>, u64)> {
        let filter = if query.status.is_some() { "WHERE status = ?" } else { "" };
        let direction = sort_keyword(query.direction);
        // Column and keyword come from closed matches, never from the request.
        let select = format!(
            "SELECT * FROM orders {} ORDER BY {} {}, id {} LIMIT ? OFFSET ?",
            filter,
            sort_column(query.sort_by),
            direction,
            direction
        );
        let count = format!("SELECT COUNT(*) FROM orders {}", filter);

        let mut select_query = sqlx::query(&select);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count);
        if let Some(status) = query.status {
            select_query = select_query.bind(status.as_str());
            count_query = count_query.bind(status.as_str());
        }

        let rows = select_query
            .bind(i64::from(query.limit))
            .bind(i64::try_from(query.offset())?)
            .fetch_all(&self.pool)
            .await
            .map_err(logged("list_orders"))?;
        let total = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(logged("list_orders count"))?;

        let orders = rows.iter().map(row_to_order).collect::<anyhow::Result<Vec<_>>>()?;
        Ok((orders, u64::try_from(total)?))
    }
}
