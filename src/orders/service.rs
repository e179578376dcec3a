use std::sync::Arc;
use uuid::Uuid;

use crate::models::EntityId;
use crate::orders::{NewOrder, Order, OrderError, OrderStatus, OrderTotals, StatusMachine};
use crate::pricing::PriceSnapshotStore;
use crate::repository::{CartRepository, OrderRepository, StatusUpdate};

/// Service for checkout and order reads
#[derive(Clone)]
pub struct OrderService {
    carts: Arc<dyn CartRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl OrderService {
    pub fn new(carts: Arc<dyn CartRepository>, orders: Arc<dyn OrderRepository>) -> Self {
        Self { carts, orders }
    }

    /// Turn the client's cart into a pending order
    ///
    /// Line prices and breakdowns are copied from the cart as they are; no
    /// rate is resolved and nothing is recalculated. The emptied cart is
    /// stored before the order, and its lines are put back if the order
    /// cannot be stored, so a failed checkout never leaves an order behind
    /// a still-full cart.
    ///
    /// # Errors
    /// * `EmptyCart` when the client has no cart or no items
    pub async fn checkout(&self, client_id: &str) -> Result<Order, OrderError> {
        let client_id = EntityId::parse(client_id)?;

        let mut cart = match self.carts.find_by_client_id(&client_id).await? {
            Some(cart) if !cart.items.is_empty() => cart,
            _ => return Err(OrderError::EmptyCart(client_id.to_string())),
        };

        let items = PriceSnapshotStore::freeze_for_order(&cart.items)?;
        let line_totals: Vec<_> = items.iter().map(|item| item.line_total).collect();
        let subtotal = OrderTotals::subtotal(&line_totals)?;

        let cart_lines = std::mem::take(&mut cart.items);
        cart.touch();
        self.carts.save(&cart).await?;

        let created = self
            .orders
            .create(NewOrder {
                client_id: client_id.clone(),
                agent_id: cart.agent_id.clone(),
                items,
                subtotal,
                total: subtotal,
            })
            .await;

        let order = match created {
            Ok(order) => order,
            Err(err) => {
                cart.items = cart_lines;
                cart.touch();
                if let Err(restore_err) = self.carts.save(&cart).await {
                    tracing::error!(
                        client_id = %client_id,
                        error = %restore_err,
                        "Failed to restore cart after order could not be stored"
                    );
                }
                return Err(err.into());
            }
        };

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            client_id = %client_id,
            items = order.items.len(),
            total = %order.total,
            "Order created from cart"
        );
        Ok(order)
    }

    /// Orders for a client, newest first
    pub async fn list_for_client(&self, client_id: &str) -> Result<Vec<Order>, OrderError> {
        let client_id = EntityId::parse(client_id)?;
        Ok(self.orders.find_by_client_id(&client_id).await?)
    }

    /// A stored order exactly as it was frozen
    pub async fn get_order(&self, order_id: Uuid) -> Result<Order, OrderError> {
        self.orders
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))
    }

    /// Move an order along the shipping status machine
    ///
    /// Only the status and `updated_at` change.
    pub async fn update_status(&self, order_id: Uuid, to: OrderStatus) -> Result<Order, OrderError> {
        match self.orders.update_status(order_id, to).await? {
            StatusUpdate::Updated(order) => {
                tracing::info!(order_id = %order_id, status = %order.status, "Order status updated");
                Ok(order)
            }
            StatusUpdate::NotFound => Err(OrderError::NotFound(order_id)),
            StatusUpdate::Rejected { current } => {
                let message = StatusMachine::transition(current, to)
                    .err()
                    .unwrap_or_else(|| format!("Invalid status transition from {} to {}", current, to));
                Err(OrderError::InvalidTransition(message))
            }
        }
    }
}
