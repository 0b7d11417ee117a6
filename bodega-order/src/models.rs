use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Order status. A flat set: any status may replace any other; there is no
/// transition graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    #[serde(rename = "Order Placed")]
    OrderPlaced,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::OrderPlaced,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::OrderPlaced => "Order Placed",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or(())
    }
}

/// A customer purchase. Immutable once placed, except for `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub name: String,
    pub mobile_number: String,
    pub address: String,
    pub google_maps_location: Option<String>,
    pub items: Vec<OrderLine>,
    pub total_order_value: Decimal,
    pub status: OrderStatus,
    pub ordered_date: DateTime<Utc>,
}

impl Order {
    /// Builds a placed order from committed line snapshots. The total is
    /// derived from the lines, never supplied by the caller.
    pub fn new(
        name: String,
        mobile_number: String,
        address: String,
        google_maps_location: Option<String>,
        items: Vec<OrderLine>,
    ) -> Self {
        let total_order_value = items.iter().map(|line| line.total_price).sum();
        Self {
            id: Uuid::new_v4(),
            name,
            mobile_number,
            address,
            google_maps_location,
            items,
            total_order_value,
            status: OrderStatus::OrderPlaced,
            ordered_date: Utc::now(),
        }
    }
}

/// Price-and-quantity snapshot of one ordered item, captured at validation
/// time. Later catalog edits do not touch it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub category_name: String,
    pub item_name: String,
    pub quantity: i64,
    pub price_per_unit: Decimal,
    pub total_price: Decimal,
}

impl OrderLine {
    pub fn new(
        category_name: String,
        item_name: String,
        quantity: i64,
        price_per_unit: Decimal,
    ) -> Self {
        let total_price = price_per_unit * Decimal::from(quantity);
        Self {
            category_name,
            item_name,
            quantity,
            price_per_unit,
            total_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn status_round_trips_through_wire_strings() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        assert_eq!(
            serde_json::to_string(&OrderStatus::OrderPlaced).unwrap(),
            "\"Order Placed\""
        );
        assert!("order placed".parse::<OrderStatus>().is_err());
        assert!("Returned".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn total_is_derived_from_lines() {
        let lines = vec![
            OrderLine::new("Beverages".into(), "Cola".into(), 3, dec!(2.50)),
            OrderLine::new("Snacks".into(), "Chips".into(), 2, dec!(1.25)),
        ];
        let order = Order::new(
            "Asha".into(),
            "9876543210".into(),
            "12 Harbour Road".into(),
            None,
            lines,
        );
        assert_eq!(order.total_order_value, dec!(10.00));
        assert_eq!(order.status, OrderStatus::OrderPlaced);
        assert_eq!(order.items[0].total_price, dec!(7.50));
    }
}
