use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Order, OrderStatus};
use crate::store::{OrderStore, StoreError};

/// In-memory order store.
#[derive(Default)]
pub struct MemoryOrders {
    orders: RwLock<HashMap<Uuid, Order>>,
}

impl MemoryOrders {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for MemoryOrders {
    async fn insert(&self, order: &Order) -> Result<Uuid, StoreError> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(order.id)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn find_by_customer(&self, mobile_number: &str) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().await;
        let mut matched: Vec<Order> = orders
            .values()
            .filter(|o| o.mobile_number == mobile_number)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.ordered_date.cmp(&a.ordered_date));
        Ok(matched)
    }

    async fn list_all(&self) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().await;
        let mut all: Vec<Order> = orders.values().cloned().collect();
        all.sort_by(|a, b| b.ordered_date.cmp(&a.ordered_date));
        Ok(all)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.orders.write().await.remove(&id).is_some())
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<bool, StoreError> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&id) {
            Some(order) => {
                order.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
