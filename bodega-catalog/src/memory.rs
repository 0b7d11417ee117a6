use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Category, Item, ItemPatch};
use crate::store::{CatalogStore, ItemUpdate, StoreError};

/// In-memory catalog. The exclusive write lock is what makes the
/// conditional decrement atomic: check and mutation happen under one guard,
/// so two orders racing for the last units of an item serialize here.
#[derive(Default)]
pub struct MemoryCatalog {
    categories: RwLock<Vec<Category>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test/bootstrap convenience: seed a category with items in one call.
    pub async fn seed(&self, category_name: &str, description: &str, items: Vec<Item>) {
        let mut category = Category::new(category_name.to_string(), description.to_string());
        category.items = items;
        self.categories.write().await.push(category);
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn find_category(&self, name: &str) -> Result<Option<Category>, StoreError> {
        let categories = self.categories.read().await;
        Ok(categories.iter().find(|c| c.category_name == name).cloned())
    }

    async fn find_item(
        &self,
        category_name: &str,
        item_name: &str,
    ) -> Result<Option<Item>, StoreError> {
        let categories = self.categories.read().await;
        Ok(categories
            .iter()
            .find(|c| c.category_name == category_name)
            .and_then(|c| c.find_item(item_name))
            .cloned())
    }

    async fn decrement_stock(
        &self,
        category_name: &str,
        item_name: &str,
        amount: i64,
    ) -> Result<bool, StoreError> {
        let mut categories = self.categories.write().await;
        let item = categories
            .iter_mut()
            .find(|c| c.category_name == category_name)
            .and_then(|c| c.items.iter_mut().find(|i| i.item_name == item_name));

        match item {
            Some(item) if item.stock_available >= amount => {
                item.stock_available -= amount;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn increment_stock(
        &self,
        category_name: &str,
        item_name: &str,
        amount: i64,
    ) -> Result<(), StoreError> {
        let mut categories = self.categories.write().await;
        if let Some(item) = categories
            .iter_mut()
            .find(|c| c.category_name == category_name)
            .and_then(|c| c.items.iter_mut().find(|i| i.item_name == item_name))
        {
            item.stock_available += amount;
        }
        Ok(())
    }

    async fn insert_category(&self, category: Category) -> Result<bool, StoreError> {
        let mut categories = self.categories.write().await;
        if categories
            .iter()
            .any(|c| c.category_name == category.category_name)
        {
            return Ok(false);
        }
        categories.push(category);
        Ok(true)
    }

    async fn delete_category(&self, name: &str) -> Result<bool, StoreError> {
        let mut categories = self.categories.write().await;
        let before = categories.len();
        categories.retain(|c| c.category_name != name);
        Ok(categories.len() < before)
    }

    async fn add_item(&self, category_name: &str, item: Item) -> Result<Option<Item>, StoreError> {
        let mut categories = self.categories.write().await;
        match categories
            .iter_mut()
            .find(|c| c.category_name == category_name)
        {
            Some(category) => {
                category.items.push(item.clone());
                Ok(Some(item))
            }
            None => Ok(None),
        }
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

        let mut categories = self.categories.write().await;
        let Some(category) = categories
            .iter_mut()
            .find(|c| c.category_name == category_name)
        else {
            return Ok(ItemUpdate::CategoryMissing);
        };

        match category.items.iter_mut().find(|i| i.id == item_id) {
            Some(item) => {
                patch.apply(item);
                Ok(ItemUpdate::Updated)
            }
            None => Ok(ItemUpdate::ItemMissing),
        }
    }

    async fn delete_item(&self, item_id: Uuid) -> Result<bool, StoreError> {
        let mut categories = self.categories.write().await;
        for category in categories.iter_mut() {
            let before = category.items.len();
            category.items.retain(|i| i.id != item_id);
            if category.items.len() < before {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        Ok(self.categories.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn cola(stock: i64) -> Item {
        Item::new(
            "Cola".to_string(),
            "330ml can".to_string(),
            dec!(0.33),
            dec!(2.50),
            stock,
        )
    }

    #[tokio::test]
    async fn decrement_is_conditional() {
        let catalog = MemoryCatalog::new();
        catalog.seed("Beverages", "Cold drinks", vec![cola(10)]).await;

        assert!(catalog.decrement_stock("Beverages", "Cola", 3).await.unwrap());
        let item = catalog.find_item("Beverages", "Cola").await.unwrap().unwrap();
        assert_eq!(item.stock_available, 7);

        // More than remains: refused, stock untouched
        assert!(!catalog.decrement_stock("Beverages", "Cola", 8).await.unwrap());
        let item = catalog.find_item("Beverages", "Cola").await.unwrap().unwrap();
        assert_eq!(item.stock_available, 7);
    }

    #[tokio::test]
    async fn decrement_unknown_item_refused() {
        let catalog = MemoryCatalog::new();
        catalog.seed("Beverages", "Cold drinks", vec![cola(10)]).await;

        assert!(!catalog.decrement_stock("Beverages", "Fanta", 1).await.unwrap());
        assert!(!catalog.decrement_stock("Snacks", "Cola", 1).await.unwrap());
    }

    #[tokio::test]
    async fn increment_restores_stock() {
        let catalog = MemoryCatalog::new();
        catalog.seed("Beverages", "Cold drinks", vec![cola(10)]).await;

        catalog.decrement_stock("Beverages", "Cola", 4).await.unwrap();
        catalog.increment_stock("Beverages", "Cola", 4).await.unwrap();

        let item = catalog.find_item("Beverages", "Cola").await.unwrap().unwrap();
        assert_eq!(item.stock_available, 10);
    }

    #[tokio::test]
    async fn duplicate_item_names_resolve_to_first_match() {
        let catalog = MemoryCatalog::new();
        let first = cola(5);
        let mut second = cola(99);
        second.price = dec!(1.00);
        let first_id = first.id;
        catalog
            .seed("Beverages", "Cold drinks", vec![first, second])
            .await;

        let found = catalog.find_item("Beverages", "Cola").await.unwrap().unwrap();
        assert_eq!(found.id, first_id);
        assert_eq!(found.price, dec!(2.50));
    }

    #[tokio::test]
    async fn duplicate_category_rejected() {
        let catalog = MemoryCatalog::new();
        let ok = catalog
            .insert_category(Category::new("Beverages".into(), "".into()))
            .await
            .unwrap();
        assert!(ok);
        let dup = catalog
            .insert_category(Category::new("Beverages".into(), "again".into()))
            .await
            .unwrap();
        assert!(!dup);
    }

    #[tokio::test]
    async fn delete_category_cascades_items() {
        let catalog = MemoryCatalog::new();
        catalog.seed("Beverages", "Cold drinks", vec![cola(10)]).await;

        assert!(catalog.delete_category("Beverages").await.unwrap());
        assert!(catalog.find_item("Beverages", "Cola").await.unwrap().is_none());
        assert!(!catalog.delete_category("Beverages").await.unwrap());
    }

    #[tokio::test]
    async fn patch_updates_only_provided_fields() {
        let catalog = MemoryCatalog::new();
        let item = cola(10);
        let item_id = item.id;
        catalog.seed("Beverages", "Cold drinks", vec![item]).await;

        let outcome = catalog
            .update_item(
                "Beverages",
                item_id,
                ItemPatch {
                    price: Some(dec!(2.75)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome, ItemUpdate::Updated);

        let item = catalog.find_item("Beverages", "Cola").await.unwrap().unwrap();
        assert_eq!(item.price, dec!(2.75));
        assert_eq!(item.stock_available, 10);

        let empty = catalog
            .update_item("Beverages", item_id, ItemPatch::default())
            .await
            .unwrap();
        assert_eq!(empty, ItemUpdate::NothingToUpdate);
    }
}
