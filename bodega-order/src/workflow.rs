use std::sync::Arc;

use bodega_catalog::store::CatalogStore;
use bodega_shared::models::events::{OrderDeletedEvent, OrderPlacedEvent, OrderStatusChangedEvent};
use bodega_shared::Masked;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{Order, OrderLine, OrderStatus};
use crate::store::{OrderStore, StoreError};

/// A requested order, before validation. Absent fields deserialize to their
/// empty defaults and are rejected by the precondition checks, matching the
/// 400 responses of the HTTP surface.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrder {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mobile_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub google_maps_location: Option<String>,
    #[serde(default)]
    pub items: Vec<RequestedLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestedLine {
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub quantity: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("{0}")]
    Validation(String),

    #[error("Category '{0}' not found")]
    CategoryNotFound(String),

    #[error("Item '{item}' not found in category '{category}'")]
    ItemNotFound { item: String, category: String },

    #[error("Insufficient stock for item '{0}'")]
    InsufficientStock(String),

    #[error("Invalid status")]
    InvalidStatus(String),

    #[error("Order not found")]
    OrderNotFound(Uuid),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl WorkflowError {
    fn storage(err: StoreError) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Drives order placement and the status lifecycle against injected stores.
///
/// Placement is two-phase: every line is validated against the catalog
/// before any stock moves, then each line's stock is reserved with an
/// atomic conditional decrement. A decrement that fails mid-commit (stock
/// raced away since validation) unwinds the lines already reserved before
/// the error is returned, so a failed order never holds stock.
pub struct OrderWorkflow {
    catalog: Arc<dyn CatalogStore>,
    orders: Arc<dyn OrderStore>,
}

impl OrderWorkflow {
    pub fn new(catalog: Arc<dyn CatalogStore>, orders: Arc<dyn OrderStore>) -> Self {
        Self { catalog, orders }
    }

    pub async fn place_order(&self, request: PlaceOrder) -> Result<Order, WorkflowError> {
        if request.name.is_empty()
            || request.mobile_number.is_empty()
            || request.address.is_empty()
            || request.items.is_empty()
        {
            return Err(WorkflowError::Validation(
                "Name, mobile_number, address, and items are required".to_string(),
            ));
        }

        // Phase one: resolve and price every line before touching stock.
        let mut lines = Vec::with_capacity(request.items.len());
        for requested in &request.items {
            if requested.category_name.is_empty()
                || requested.item_name.is_empty()
                || requested.quantity <= 0
            {
                return Err(WorkflowError::Validation(
                    "Each item must have category_name, item_name, and positive quantity"
                        .to_string(),
                ));
            }

            let category = self
                .catalog
                .find_category(&requested.category_name)
                .await
                .map_err(WorkflowError::storage)?
                .ok_or_else(|| {
                    WorkflowError::CategoryNotFound(requested.category_name.clone())
                })?;

            let item = category.find_item(&requested.item_name).ok_or_else(|| {
                WorkflowError::ItemNotFound {
                    item: requested.item_name.clone(),
                    category: requested.category_name.clone(),
                }
            })?;

            if item.stock_available < requested.quantity {
                return Err(WorkflowError::InsufficientStock(requested.item_name.clone()));
            }

            lines.push(OrderLine::new(
                requested.category_name.clone(),
                requested.item_name.clone(),
                requested.quantity,
                item.price,
            ));
        }

        // Phase two: reserve stock line by line. Validation ran on a
        // snapshot, so a decrement can still come up short here; unwind
        // whatever this request already reserved before reporting it.
        for (committed, line) in lines.iter().enumerate() {
            let reserved = match self
                .catalog
                .decrement_stock(&line.category_name, &line.item_name, line.quantity)
                .await
            {
                Ok(reserved) => reserved,
                Err(err) => {
                    self.release_lines(&lines[..committed]).await;
                    return Err(WorkflowError::storage(err));
                }
            };

            if !reserved {
                self.release_lines(&lines[..committed]).await;
                return Err(WorkflowError::InsufficientStock(line.item_name.clone()));
            }
        }

        let order = Order::new(
            request.name,
            request.mobile_number,
            request.address,
            request.google_maps_location,
            lines,
        );

        if let Err(err) = self.orders.insert(&order).await {
            self.release_lines(&order.items).await;
            return Err(WorkflowError::storage(err));
        }

        let event = OrderPlacedEvent {
            order_id: order.id,
            mobile_number: order.mobile_number.clone(),
            line_count: order.items.len(),
            total_order_value: order.total_order_value,
            timestamp: Utc::now().timestamp(),
        };
        tracing::info!(
            target: "bodega::events",
            order_id = %order.id,
            customer = %Masked(&order.mobile_number),
            total = %order.total_order_value,
            payload = %serde_json::to_string(&event).unwrap_or_default(),
            "order placed"
        );

        Ok(order)
    }

    /// Compensating increments for lines already reserved by a failed
    /// request. A failed add-back is logged; stock ends low, never negative.
    async fn release_lines(&self, lines: &[OrderLine]) {
        for line in lines {
            if let Err(err) = self
                .catalog
                .increment_stock(&line.category_name, &line.item_name, line.quantity)
                .await
            {
                tracing::error!(
                    item = %line.item_name,
                    category = %line.category_name,
                    quantity = line.quantity,
                    error = %err,
                    "failed to release reserved stock"
                );
            }
        }
    }

    pub async fn update_status(
        &self,
        order_id: Uuid,
        new_status: &str,
    ) -> Result<Order, WorkflowError> {
        let status: OrderStatus = new_status
            .parse()
            .map_err(|_| WorkflowError::InvalidStatus(new_status.to_string()))?;

        let mut order = self
            .orders
            .find_by_id(order_id)
            .await
            .map_err(WorkflowError::storage)?
            .ok_or(WorkflowError::OrderNotFound(order_id))?;

        let updated = self
            .orders
            .update_status(order_id, status)
            .await
            .map_err(WorkflowError::storage)?;
        if !updated {
            return Err(WorkflowError::OrderNotFound(order_id));
        }

        let event = OrderStatusChangedEvent {
            order_id,
            previous_status: order.status.to_string(),
            new_status: status.to_string(),
            timestamp: Utc::now().timestamp(),
        };
        tracing::info!(
            target: "bodega::events",
            order_id = %order_id,
            from = %order.status,
            to = %status,
            payload = %serde_json::to_string(&event).unwrap_or_default(),
            "order status changed"
        );

        order.status = status;
        Ok(order)
    }

    pub async fn orders_for_customer(
        &self,
        mobile_number: &str,
    ) -> Result<Vec<Order>, WorkflowError> {
        self.orders
            .find_by_customer(mobile_number)
            .await
            .map_err(WorkflowError::storage)
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, WorkflowError> {
        self.orders.list_all().await.map_err(WorkflowError::storage)
    }

    pub async fn delete_order(&self, order_id: Uuid) -> Result<(), WorkflowError> {
        let deleted = self
            .orders
            .delete(order_id)
            .await
            .map_err(WorkflowError::storage)?;
        if !deleted {
            return Err(WorkflowError::OrderNotFound(order_id));
        }

        let event = OrderDeletedEvent {
            order_id,
            timestamp: Utc::now().timestamp(),
        };
        tracing::info!(
            target: "bodega::events",
            order_id = %order_id,
            payload = %serde_json::to_string(&event).unwrap_or_default(),
            "order deleted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bodega_catalog::models::{Category, Item, ItemPatch};
    use bodega_catalog::store::ItemUpdate;
    use bodega_catalog::MemoryCatalog;
    use crate::memory::MemoryOrders;
    use rust_decimal_macros::dec;

    fn item(name: &str, price: rust_decimal::Decimal, stock: i64) -> Item {
        Item::new(name.to_string(), String::new(), dec!(1), price, stock)
    }

    async fn seeded_catalog() -> Arc<MemoryCatalog> {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog
            .seed(
                "Beverages",
                "Cold drinks",
                vec![item("Cola", dec!(2.50), 10)],
            )
            .await;
        catalog
            .seed("Snacks", "Shelf snacks", vec![item("Chips", dec!(1.25), 4)])
            .await;
        catalog
    }

    fn workflow(catalog: Arc<MemoryCatalog>) -> (OrderWorkflow, Arc<MemoryOrders>) {
        let orders = Arc::new(MemoryOrders::new());
        (
            OrderWorkflow::new(catalog, orders.clone()),
            orders,
        )
    }

    fn request(items: Vec<RequestedLine>) -> PlaceOrder {
        PlaceOrder {
            name: "Asha".into(),
            mobile_number: "9876543210".into(),
            address: "12 Harbour Road".into(),
            google_maps_location: None,
            items,
        }
    }

    fn line(category: &str, item: &str, quantity: i64) -> RequestedLine {
        RequestedLine {
            category_name: category.into(),
            item_name: item.into(),
            quantity,
        }
    }

    async fn stock_of(catalog: &MemoryCatalog, category: &str, item: &str) -> i64 {
        catalog
            .find_item(category, item)
            .await
            .unwrap()
            .unwrap()
            .stock_available
    }

    #[tokio::test]
    async fn multi_item_order_prices_and_reserves() {
        let catalog = seeded_catalog().await;
        let (workflow, orders) = workflow(catalog.clone());

        let order = workflow
            .place_order(request(vec![
                line("Beverages", "Cola", 3),
                line("Snacks", "Chips", 2),
            ]))
            .await
            .unwrap();

        assert_eq!(order.total_order_value, dec!(10.00));
        assert_eq!(order.items[0].price_per_unit, dec!(2.50));
        assert_eq!(order.items[0].total_price, dec!(7.50));
        assert_eq!(order.status, OrderStatus::OrderPlaced);

        assert_eq!(stock_of(&catalog, "Beverages", "Cola").await, 7);
        assert_eq!(stock_of(&catalog, "Snacks", "Chips").await, 2);

        let persisted = orders.find_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(persisted.total_order_value, dec!(10.00));
    }

    #[tokio::test]
    async fn snapshot_prices_survive_catalog_edits() {
        let catalog = seeded_catalog().await;
        let (workflow, orders) = workflow(catalog.clone());

        let order = workflow
            .place_order(request(vec![line("Beverages", "Cola", 2)]))
            .await
            .unwrap();

        let cola_id = catalog
            .find_item("Beverages", "Cola")
            .await
            .unwrap()
            .unwrap()
            .id;
        catalog
            .update_item(
                "Beverages",
                cola_id,
                ItemPatch {
                    price: Some(dec!(9.99)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let persisted = orders.find_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(persisted.items[0].price_per_unit, dec!(2.50));
        assert_eq!(persisted.total_order_value, dec!(5.00));
    }

    #[tokio::test]
    async fn missing_address_is_rejected_without_writes() {
        let catalog = seeded_catalog().await;
        let (workflow, orders) = workflow(catalog.clone());

        let mut req = request(vec![line("Beverages", "Cola", 3)]);
        req.address = String::new();

        let err = workflow.place_order(req).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
        assert_eq!(stock_of(&catalog, "Beverages", "Cola").await, 10);
        assert!(orders.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_quantity_line_is_rejected() {
        let catalog = seeded_catalog().await;
        let (workflow, _) = workflow(catalog);

        let err = workflow
            .place_order(request(vec![line("Beverages", "Cola", 0)]))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
    }

    #[tokio::test]
    async fn empty_item_list_is_rejected() {
        let catalog = seeded_catalog().await;
        let (workflow, _) = workflow(catalog);

        let err = workflow.place_order(request(vec![])).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
    }

    #[tokio::test]
    async fn bad_later_line_leaves_earlier_lines_untouched() {
        let catalog = seeded_catalog().await;
        let (workflow, orders) = workflow(catalog.clone());

        // Second line fails validation; the valid first line must not have
        // reserved anything.
        let err = workflow
            .place_order(request(vec![
                line("Beverages", "Cola", 3),
                line("Beverages", "Fanta", 1),
            ]))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::ItemNotFound { .. }));
        assert_eq!(stock_of(&catalog, "Beverages", "Cola").await, 10);
        assert!(orders.list_all().await.unwrap().is_empty());

        let err = workflow
            .place_order(request(vec![
                line("Beverages", "Cola", 3),
                line("Produce", "Apples", 1),
            ]))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::CategoryNotFound(_)));
        assert_eq!(stock_of(&catalog, "Beverages", "Cola").await, 10);
    }

    #[tokio::test]
    async fn insufficient_stock_fails_whole_request() {
        let catalog = seeded_catalog().await;
        let (workflow, orders) = workflow(catalog.clone());

        workflow
            .place_order(request(vec![line("Beverages", "Cola", 3)]))
            .await
            .unwrap();
        assert_eq!(stock_of(&catalog, "Beverages", "Cola").await, 7);

        let err = workflow
            .place_order(request(vec![line("Beverages", "Cola", 8)]))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InsufficientStock(_)));
        assert_eq!(stock_of(&catalog, "Beverages", "Cola").await, 7);
        assert_eq!(orders.list_all().await.unwrap().len(), 1);
    }

    /// Delegates to a real catalog but refuses to decrement one item,
    /// simulating stock racing away between validation and commit.
    struct RacingCatalog {
        inner: Arc<MemoryCatalog>,
        contested_item: String,
    }

    #[async_trait]
    impl CatalogStore for RacingCatalog {
        async fn find_category(
            &self,
            name: &str,
        ) -> Result<Option<Category>, bodega_catalog::store::StoreError> {
            self.inner.find_category(name).await
        }

        async fn find_item(
            &self,
            category_name: &str,
            item_name: &str,
        ) -> Result<Option<Item>, bodega_catalog::store::StoreError> {
            self.inner.find_item(category_name, item_name).await
        }

        async fn decrement_stock(
            &self,
            category_name: &str,
            item_name: &str,
            amount: i64,
        ) -> Result<bool, bodega_catalog::store::StoreError> {
            if item_name == self.contested_item {
                return Ok(false);
            }
            self.inner
                .decrement_stock(category_name, item_name, amount)
                .await
        }

        async fn increment_stock(
            &self,
            category_name: &str,
            item_name: &str,
            amount: i64,
        ) -> Result<(), bodega_catalog::store::StoreError> {
            self.inner
                .increment_stock(category_name, item_name, amount)
                .await
        }

        async fn insert_category(
            &self,
            category: Category,
        ) -> Result<bool, bodega_catalog::store::StoreError> {
            self.inner.insert_category(category).await
        }

        async fn delete_category(
            &self,
            name: &str,
        ) -> Result<bool, bodega_catalog::store::StoreError> {
            self.inner.delete_category(name).await
        }

        async fn add_item(
            &self,
            category_name: &str,
            item: Item,
        ) -> Result<Option<Item>, bodega_catalog::store::StoreError> {
            self.inner.add_item(category_name, item).await
        }

        async fn update_item(
            &self,
            category_name: &str,
            item_id: Uuid,
            patch: ItemPatch,
        ) -> Result<ItemUpdate, bodega_catalog::store::StoreError> {
            self.inner.update_item(category_name, item_id, patch).await
        }

        async fn delete_item(
            &self,
            item_id: Uuid,
        ) -> Result<bool, bodega_catalog::store::StoreError> {
            self.inner.delete_item(item_id).await
        }

        async fn list_categories(
            &self,
        ) -> Result<Vec<Category>, bodega_catalog::store::StoreError> {
            self.inner.list_categories().await
        }
    }

    #[tokio::test]
    async fn commit_failure_rolls_back_reserved_lines() {
        let inner = seeded_catalog().await;
        let catalog = Arc::new(RacingCatalog {
            inner: inner.clone(),
            contested_item: "Chips".to_string(),
        });
        let orders = Arc::new(MemoryOrders::new());
        let workflow = OrderWorkflow::new(catalog, orders.clone());

        // Both lines validate; the Chips decrement is refused at commit, so
        // the Cola reservation must be released.
        let err = workflow
            .place_order(request(vec![
                line("Beverages", "Cola", 3),
                line("Snacks", "Chips", 2),
            ]))
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::InsufficientStock(ref name) if name == "Chips"));
        assert_eq!(stock_of(&inner, "Beverages", "Cola").await, 10);
        assert_eq!(stock_of(&inner, "Snacks", "Chips").await, 4);
        assert!(orders.list_all().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_demand_never_oversells() {
        let catalog = seeded_catalog().await;
        let orders = Arc::new(MemoryOrders::new());
        let workflow = Arc::new(OrderWorkflow::new(catalog.clone(), orders.clone()));

        // Eight orders of 3 against a stock of 10: at most 3 can succeed.
        let mut handles = Vec::new();
        for _ in 0..8 {
            let workflow = workflow.clone();
            handles.push(tokio::spawn(async move {
                workflow
                    .place_order(request(vec![line("Beverages", "Cola", 3)]))
                    .await
                    .is_ok()
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap() {
                succeeded += 1;
            }
        }

        let remaining = stock_of(&catalog, "Beverages", "Cola").await;
        assert_eq!(succeeded, 3);
        assert_eq!(remaining, 10 - 3 * succeeded);
        assert!(remaining >= 0);
        assert_eq!(orders.list_all().await.unwrap().len(), succeeded as usize);
    }

    #[tokio::test]
    async fn status_updates_accept_the_full_set_in_any_direction() {
        let catalog = seeded_catalog().await;
        let (workflow, _) = workflow(catalog);

        let order = workflow
            .place_order(request(vec![line("Beverages", "Cola", 1)]))
            .await
            .unwrap();

        let order = workflow.update_status(order.id, "Delivered").await.unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);

        // Flat set: moving "backwards" is allowed.
        let order = workflow.update_status(order.id, "Processing").await.unwrap();
        assert_eq!(order.status, OrderStatus::Processing);
    }

    #[tokio::test]
    async fn unknown_status_and_unknown_order_are_rejected() {
        let catalog = seeded_catalog().await;
        let (workflow, _) = workflow(catalog);

        let order = workflow
            .place_order(request(vec![line("Beverages", "Cola", 1)]))
            .await
            .unwrap();

        let err = workflow.update_status(order.id, "Packed").await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidStatus(_)));

        let err = workflow
            .update_status(Uuid::new_v4(), "Shipped")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::OrderNotFound(_)));
    }

    #[tokio::test]
    async fn customer_and_global_listings_tolerate_empty_stores() {
        let catalog = seeded_catalog().await;
        let (workflow, _) = workflow(catalog);

        assert!(workflow.list_orders().await.unwrap().is_empty());
        assert!(workflow
            .orders_for_customer("0000000000")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn deleting_a_missing_order_reports_not_found() {
        let catalog = seeded_catalog().await;
        let (workflow, orders) = workflow(catalog);

        let order = workflow
            .place_order(request(vec![line("Beverages", "Cola", 1)]))
            .await
            .unwrap();

        let err = workflow.delete_order(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::OrderNotFound(_)));
        assert_eq!(orders.list_all().await.unwrap().len(), 1);

        workflow.delete_order(order.id).await.unwrap();
        assert!(orders.list_all().await.unwrap().is_empty());
    }
}
