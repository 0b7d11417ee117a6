use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use bodega_catalog::models::{Category, Item, ItemPatch};
use bodega_catalog::store::{CatalogStore, ItemUpdate, StoreError};

/// Postgres-backed catalog. Stock movement is a single conditional UPDATE;
/// the `stock_available >= amount` predicate on the updated row is what
/// keeps concurrent orders from overselling.
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn category_id(&self, name: &str) -> Result<Option<Uuid>, StoreError> {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM categories WHERE category_name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn items_of(&self, category_id: Uuid) -> Result<Vec<Item>, StoreError> {
        let rows = sqlx::query_as::<_, ItemRow>(
            "SELECT id, item_name, description, quantity, price, stock_available \
             FROM items WHERE category_id = $1 ORDER BY position",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Item::from).collect())
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    category_name: String,
    description: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: Uuid,
    item_name: String,
    description: String,
    quantity: Decimal,
    price: Decimal,
    stock_available: i64,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            id: row.id,
            item_name: row.item_name,
            description: row.description,
            quantity: row.quantity,
            price: row.price,
            stock_available: row.stock_available,
        }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn find_category(&self, name: &str) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, category_name, description, created_at \
             FROM categories WHERE category_name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = self.items_of(row.id).await?;
        Ok(Some(Category {
            id: row.id,
            category_name: row.category_name,
            description: row.description,
            items,
            created_at: row.created_at,
        }))
    }

    async fn find_item(
        &self,
        category_name: &str,
        item_name: &str,
    ) -> Result<Option<Item>, StoreError> {
        let row = sqlx::query_as::<_, ItemRow>(
            "SELECT i.id, i.item_name, i.description, i.quantity, i.price, i.stock_available \
             FROM items i JOIN categories c ON i.category_id = c.id \
             WHERE c.category_name = $1 AND i.item_name = $2 \
             ORDER BY i.position LIMIT 1",
        )
        .bind(category_name)
        .bind(item_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Item::from))
    }

    async fn decrement_stock(
        &self,
        category_name: &str,
        item_name: &str,
        amount: i64,
    ) -> Result<bool, StoreError> {
        // The outer stock predicate is re-evaluated against the current row
        // version under READ COMMITTED, so two racing decrements cannot both
        // take the last units.
        let result = sqlx::query(
            "UPDATE items SET stock_available = stock_available - $3 \
             WHERE id = ( \
                 SELECT i.id FROM items i JOIN categories c ON i.category_id = c.id \
                 WHERE c.category_name = $1 AND i.item_name = $2 \
                 ORDER BY i.position LIMIT 1 \
             ) AND stock_available >= $3",
        )
        .bind(category_name)
        .bind(item_name)
        .bind(amount)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_stock(
        &self,
        category_name: &str,
        item_name: &str,
        amount: i64,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE items SET stock_available = stock_available + $3 \
             WHERE id = ( \
                 SELECT i.id FROM items i JOIN categories c ON i.category_id = c.id \
                 WHERE c.category_name = $1 AND i.item_name = $2 \
                 ORDER BY i.position LIMIT 1 \
             )",
        )
        .bind(category_name)
        .bind(item_name)
        .bind(amount)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_category(&self, category: Category) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO categories (id, category_name, description, created_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (category_name) DO NOTHING",
        )
        .bind(category.id)
        .bind(&category.category_name)
        .bind(&category.description)
        .bind(category.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_category(&self, name: &str) -> Result<bool, StoreError> {
        // Items go with the category via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM categories WHERE category_name = $1")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_item(&self, category_name: &str, item: Item) -> Result<Option<Item>, StoreError> {
        let Some(category_id) = self.category_id(category_name).await? else {
            return Ok(None);
        };

        sqlx::query(
            "INSERT INTO items (id, category_id, item_name, description, quantity, price, stock_available) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(item.id)
        .bind(category_id)
        .bind(&item.item_name)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.price)
        .bind(item.stock_available)
        .execute(&self.pool)
        .await?;

        Ok(Some(item))
    }

    async fn update_item(
        &self,
        category_name: &str,
        item_id: Uuid,
        patch: ItemPatch,
    ) -> Result<ItemUpdate, StoreError> {
        if patch.is_empty() {
            return Ok(ItemUpdate::NothingToUpdate);
        }

        let Some(category_id) = self.category_id(category_name).await? else {
            return Ok(ItemUpdate::CategoryMissing);
        };

        let result = sqlx::query(
            "UPDATE items SET \
                 item_name = COALESCE($3, item_name), \
                 description = COALESCE($4, description), \
                 quantity = COALESCE($5, quantity), \
                 price = COALESCE($6, price), \
                 stock_available = COALESCE($7, stock_available) \
             WHERE id = $1 AND category_id = $2",
        )
        .bind(item_id)
        .bind(category_id)
        .bind(patch.item_name)
        .bind(patch.description)
        .bind(patch.quantity)
        .bind(patch.price)
        .bind(patch.stock_available)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            Ok(ItemUpdate::Updated)
        } else {
            Ok(ItemUpdate::ItemMissing)
        }
    }

    async fn delete_item(&self, item_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, category_name, description, created_at \
             FROM categories ORDER BY category_name",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut categories = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.items_of(row.id).await?;
            categories.push(Category {
                id: row.id,
                category_name: row.category_name,
                description: row.description,
                items,
                created_at: row.created_at,
            });
        }
        Ok(categories)
    }
}
