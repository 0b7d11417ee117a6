use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Order, OrderStatus};

pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Order persistence consumed by the workflow engine.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: &Order) -> Result<Uuid, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, StoreError>;

    /// All orders for a mobile number, newest first. Empty is a normal
    /// result, not an error.
    async fn find_by_customer(&self, mobile_number: &str) -> Result<Vec<Order>, StoreError>;

    /// Every order, sorted by `ordered_date` descending.
    async fn list_all(&self) -> Result<Vec<Order>, StoreError>;

    /// Returns false when no such order exists.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Returns false when no such order exists.
    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<bool, StoreError>;
}
