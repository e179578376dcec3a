use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::cart::CustomFields;
use crate::models::EntityId;
use crate::pricing::{Money, RateBreakdown};

/// Order status enum representing the lifecycle of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(format!("Invalid order status: {}", s)),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A frozen order line
///
/// Deep copy of the cart line at checkout. Nothing here is ever
/// recomputed from live rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    #[schema(value_type = String)]
    pub product_id: EntityId,
    pub quantity: u32,
    #[schema(value_type = String)]
    pub base_price: Money,
    #[schema(value_type = String)]
    pub price: Money,
    pub breakdown: RateBreakdown,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub custom_fields: Option<CustomFields>,
    /// price × quantity at checkout
    #[schema(value_type = String)]
    pub line_total: Money,
}

/// Domain model representing a stored order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    #[schema(example = "ORD-20240115-3F2A9C1B")]
    pub order_number: String,
    #[schema(value_type = String)]
    pub client_id: EntityId,
    #[schema(value_type = Option<String>)]
    pub agent_id: Option<EntityId>,
    pub items: Vec<OrderLineItem>,
    #[schema(value_type = String)]
    pub subtotal: Money,
    #[schema(value_type = String)]
    pub total: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything a repository needs to store a new order
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub client_id: EntityId,
    pub agent_id: Option<EntityId>,
    pub items: Vec<OrderLineItem>,
    pub subtotal: Money,
    pub total: Money,
}

impl Order {
    /// Materialize a new pending order with a fresh id and order number
    pub fn from_new(new_order: NewOrder, now: DateTime<Utc>) -> Self {
        let id = Uuid::new_v4();
        Self {
            order_number: order_number(&id, now),
            id,
            client_id: new_order.client_id,
            agent_id: new_order.agent_id,
            items: new_order.items,
            subtotal: new_order.subtotal,
            total: new_order.total,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// `ORD-YYYYMMDD-XXXXXXXX` using the first 8 hex digits of the id
pub fn order_number(id: &Uuid, created_at: DateTime<Utc>) -> String {
    let simple = id.simple().to_string().to_uppercase();
    format!("ORD-{}-{}", created_at.format("%Y%m%d"), &simple[..8])
}

/// Request DTO for POST /api/orders
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate(custom = "crate::validation::validate_entity_id")]
    pub client_id: String,
}

/// Request DTO for PATCH /api/orders/:id/status
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_order_status_round_trip_strings() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("preparing".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_order_number_format() {
        let id = Uuid::parse_str("3f2a9c1b-0000-4000-8000-000000000000").unwrap();
        let created_at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(order_number(&id, created_at), "ORD-20240115-3F2A9C1B");
    }

    #[test]
    fn test_new_order_starts_pending() {
        let now = Utc::now();
        let order = Order::from_new(
            NewOrder {
                client_id: EntityId::parse("c1").unwrap(),
                agent_id: None,
                items: Vec::new(),
                subtotal: Money::ZERO,
                total: Money::ZERO,
            },
            now,
        );
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.created_at, order.updated_at);
        assert!(order.order_number.starts_with("ORD-"));
    }
}
