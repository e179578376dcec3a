// Price Snapshot Store
//
// Attaches computed prices to cart and wishlist lines and freezes cart lines
// into order lines. Freezing copies what the cart already carries; it never
// resolves rates or calls the calculator.

use std::sync::Arc;

use crate::cart::{Cart, CartLineItem, Wishlist};
use crate::models::EntityId;
use crate::orders::{OrderLineItem, OrderTotals};
use crate::pricing::{
    calculator::PriceCalculator,
    error::{PricingError, PricingResult},
    resolver::RateResolver,
    types::RateBreakdown,
};
use crate::repository::{CartRepository, ProductRepository, WishlistRepository};

/// A line that carries a cached price and the breakdown behind it
pub trait PricedLine {
    fn product_id(&self) -> &EntityId;
    fn breakdown(&self) -> &RateBreakdown;
    /// Overwrite price and breakdown, leaving every other field alone
    fn attach_pricing(&mut self, breakdown: RateBreakdown);
}

pub struct PriceSnapshotStore {
    resolver: Arc<RateResolver>,
    products: Arc<dyn ProductRepository>,
    carts: Arc<dyn CartRepository>,
    wishlists: Arc<dyn WishlistRepository>,
}

impl PriceSnapshotStore {
    pub fn new(
        resolver: Arc<RateResolver>,
        products: Arc<dyn ProductRepository>,
        carts: Arc<dyn CartRepository>,
        wishlists: Arc<dyn WishlistRepository>,
    ) -> Self {
        Self {
            resolver,
            products,
            carts,
            wishlists,
        }
    }

    /// Overwrite one cart line's price and breakdown, then persist the cart
    pub async fn attach_to_cart_item(
        &self,
        cart: &mut Cart,
        product_id: &EntityId,
        breakdown: RateBreakdown,
    ) -> PricingResult<()> {
        let item = cart
            .find_item_mut(product_id)
            .ok_or_else(|| PricingError::not_found("Cart item", product_id))?;
        item.attach_pricing(breakdown);
        cart.touch();
        self.carts.save(cart).await?;
        Ok(())
    }

    /// Overwrite one wishlist line's price and breakdown, then persist
    pub async fn attach_to_wishlist_item(
        &self,
        wishlist: &mut Wishlist,
        product_id: &EntityId,
        breakdown: RateBreakdown,
    ) -> PricingResult<()> {
        let item = wishlist
            .find_item_mut(product_id)
            .ok_or_else(|| PricingError::not_found("Wishlist item", product_id))?;
        item.attach_pricing(breakdown);
        wishlist.updated_at = chrono::Utc::now();
        self.wishlists.save(wishlist).await?;
        Ok(())
    }

    /// Deep-copy cart lines into order lines
    ///
    /// The breakdown of every returned line is exactly the cart line's
    /// breakdown; only `line_total` is derived, from the cached unit price.
    pub fn freeze_for_order(items: &[CartLineItem]) -> PricingResult<Vec<OrderLineItem>> {
        items
            .iter()
            .map(|item| -> PricingResult<OrderLineItem> {
                Ok(OrderLineItem {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                    base_price: item.base_price,
                    price: item.price,
                    breakdown: item.breakdown.clone(),
                    custom_fields: item.custom_fields.clone(),
                    line_total: OrderTotals::line_total(item.quantity, item.price)?,
                })
            })
            .collect()
    }

    /// Re-price cart lines against current rates and product prices
    ///
    /// Only called on an explicit refresh request.
    pub async fn refresh_cart_pricing(
        &self,
        client_id: &EntityId,
        agent_id: Option<&EntityId>,
        items: Vec<CartLineItem>,
    ) -> PricingResult<Vec<CartLineItem>> {
        self.refresh_lines(client_id, agent_id, items).await
    }

    /// Wishlist counterpart of `refresh_cart_pricing`
    pub async fn refresh_wishlist_pricing(
        &self,
        client_id: &EntityId,
        agent_id: Option<&EntityId>,
        items: Vec<crate::cart::WishlistItem>,
    ) -> PricingResult<Vec<crate::cart::WishlistItem>> {
        self.refresh_lines(client_id, agent_id, items).await
    }

    async fn refresh_lines<T: PricedLine>(
        &self,
        client_id: &EntityId,
        agent_id: Option<&EntityId>,
        mut items: Vec<T>,
    ) -> PricingResult<Vec<T>> {
        let rates = self.resolver.resolve_ids(Some(client_id), agent_id).await?;

        for item in items.iter_mut() {
            let Some(product) = self.products.find_by_id(item.product_id()).await? else {
                tracing::warn!(
                    product_id = %item.product_id(),
                    "Product no longer exists, keeping previous price"
                );
                continue;
            };

            let (pair, _) = rates.rates_for(&product.category);
            match PriceCalculator::calculate_raw(product.base_price, pair) {
                Ok(breakdown) => item.attach_pricing(breakdown),
                Err(err) => {
                    tracing::warn!(
                        product_id = %product.id,
                        error = %err,
                        "Product could not be re-priced, keeping previous price"
                    );
                }
            }
        }

        Ok(items)
    }
}
