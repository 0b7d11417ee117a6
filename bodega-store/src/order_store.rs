use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use bodega_order::models::{Order, OrderLine, OrderStatus};
use bodega_order::store::{OrderStore, StoreError};

/// Postgres-backed order store. Header and line rows are written in one
/// transaction so a partially inserted order is never visible.
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lines_of(&self, order_id: Uuid) -> Result<Vec<OrderLine>, StoreError> {
        let rows = sqlx::query_as::<_, OrderLineRow>(
            "SELECT category_name, item_name, quantity, price_per_unit, total_price \
             FROM order_lines WHERE order_id = $1 ORDER BY position",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(OrderLine::from).collect())
    }

    fn assemble(row: OrderRow, items: Vec<OrderLine>) -> Result<Order, StoreError> {
        let status: OrderStatus = row
            .status
            .parse()
            .map_err(|_| -> StoreError { format!("unknown order status: {}", row.status).into() })?;

        Ok(Order {
            id: row.id,
            name: row.name,
            mobile_number: row.mobile_number,
            address: row.address,
            google_maps_location: row.google_maps_location,
            items,
            total_order_value: row.total_order_value,
            status,
            ordered_date: row.ordered_date,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    name: String,
    mobile_number: String,
    address: String,
    google_maps_location: Option<String>,
    total_order_value: Decimal,
    status: String,
    ordered_date: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderLineRow {
    category_name: String,
    item_name: String,
    quantity: i64,
    price_per_unit: Decimal,
    total_price: Decimal,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        OrderLine {
            category_name: row.category_name,
            item_name: row.item_name,
            quantity: row.quantity,
            price_per_unit: row.price_per_unit,
            total_price: row.total_price,
        }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert(&self, order: &Order) -> Result<Uuid, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (id, name, mobile_number, address, google_maps_location, \
                                 total_order_value, status, ordered_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(order.id)
        .bind(&order.name)
        .bind(&order.mobile_number)
        .bind(&order.address)
        .bind(&order.google_maps_location)
        .bind(order.total_order_value)
        .bind(order.status.as_str())
        .bind(order.ordered_date)
        .execute(&mut *tx)
        .await?;

        for (position, line) in order.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_lines (id, order_id, category_name, item_name, quantity, \
                                          price_per_unit, total_price, position) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(Uuid::new_v4())
            .bind(order.id)
            .bind(&line.category_name)
            .bind(&line.item_name)
            .bind(line.quantity)
            .bind(line.price_per_unit)
            .bind(line.total_price)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(order.id)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(
            "SELECT id, name, mobile_number, address, google_maps_location, \
                    total_order_value, status, ordered_date \
             FROM orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = self.lines_of(row.id).await?;
        Ok(Some(Self::assemble(row, items)?))
    }

    async fn find_by_customer(&self, mobile_number: &str) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, name, mobile_number, address, google_maps_location, \
                    total_order_value, status, ordered_date \
             FROM orders WHERE mobile_number = $1 ORDER BY ordered_date DESC",
        )
        .bind(mobile_number)
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.lines_of(row.id).await?;
            orders.push(Self::assemble(row, items)?);
        }
        Ok(orders)
    }

    async fn list_all(&self) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, name, mobile_number, address, google_maps_location, \
                    total_order_value, status, ordered_date \
             FROM orders ORDER BY ordered_date DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.lines_of(row.id).await?;
            orders.push(Self::assemble(row, items)?);
        }
        Ok(orders)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        // Lines go with the order via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
