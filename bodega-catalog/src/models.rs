use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Named grouping of purchasable items.
///
/// `category_name` is the unique lookup key; items are embedded and keep
/// their insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub category_name: String,
    pub description: String,
    pub items: Vec<Item>,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(category_name: String, description: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            category_name,
            description,
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// First item matching `item_name`, in insertion order. Item names are
    /// not unique within a category; callers get the earliest match.
    pub fn find_item(&self, item_name: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.item_name == item_name)
    }
}

/// A purchasable product owned by a category.
///
/// `quantity` is a free-form pack-size figure carried through from intake;
/// `stock_available` is the sellable count and must stay non-negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub item_name: String,
    pub description: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub stock_available: i64,
}

impl Item {
    pub fn new(
        item_name: String,
        description: String,
        quantity: Decimal,
        price: Decimal,
        stock_available: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_name,
            description,
            quantity,
            price,
            stock_available,
        }
    }
}

/// Partial item update; only the provided fields change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemPatch {
    pub item_name: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    pub stock_available: Option<i64>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.item_name.is_none()
            && self.description.is_none()
            && self.quantity.is_none()
            && self.price.is_none()
            && self.stock_available.is_none()
    }

    pub fn apply(&self, item: &mut Item) {
        if let Some(name) = &self.item_name {
            item.item_name = name.clone();
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(quantity) = self.quantity {
            item.quantity = quantity;
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(stock) = self.stock_available {
            item.stock_available = stock;
        }
    }
}
