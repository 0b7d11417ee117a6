use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Category, Item, ItemPatch};

pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a partial item update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemUpdate {
    Updated,
    CategoryMissing,
    ItemMissing,
    NothingToUpdate,
}

/// Catalog access consumed by the order workflow and the catalog routes.
///
/// `decrement_stock` is the one operation with a concurrency contract: it is
/// a single conditional read-modify-write per item. Two orders racing for
/// the same item serialize at the store; stock never goes negative.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_category(&self, name: &str) -> Result<Option<Category>, StoreError>;

    /// First item named `item_name` within `category_name`, insertion order.
    async fn find_item(
        &self,
        category_name: &str,
        item_name: &str,
    ) -> Result<Option<Item>, StoreError>;

    /// Conditionally subtract `amount` from the item's stock. Returns false
    /// when the item is missing or has less than `amount` available, in
    /// which case nothing changes.
    async fn decrement_stock(
        &self,
        category_name: &str,
        item_name: &str,
        amount: i64,
    ) -> Result<bool, StoreError>;

    /// Compensating add-back for a decrement that must be unwound.
    async fn increment_stock(
        &self,
        category_name: &str,
        item_name: &str,
        amount: i64,
    ) -> Result<(), StoreError>;

    /// Rejects a duplicate `category_name`.
    async fn insert_category(&self, category: Category) -> Result<bool, StoreError>;

    /// Removes the category and every item it owns.
    async fn delete_category(&self, name: &str) -> Result<bool, StoreError>;

    /// Appends the item to the named category; None when the category is
    /// missing.
    async fn add_item(&self, category_name: &str, item: Item) -> Result<Option<Item>, StoreError>;

    async fn update_item(
        &self,
        category_name: &str,
        item_id: Uuid,
        patch: ItemPatch,
    ) -> Result<ItemUpdate, StoreError>;

    /// Deletes by item id, searching across categories.
    async fn delete_item(&self, item_id: Uuid) -> Result<bool, StoreError>;

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Category already exists")]
    DuplicateCategory(String),

    #[error("Category not found")]
    CategoryNotFound(String),

    #[error("Item not found")]
    ItemNotFound(String),

    #[error("No fields to update")]
    NothingToUpdate,

    #[error("Stock available must be a non-negative number")]
    NegativeStock,

    #[error("storage failure: {0}")]
    Storage(String),
}

impl CatalogError {
    pub fn storage(err: StoreError) -> Self {
        Self::Storage(err.to_string())
    }
}
