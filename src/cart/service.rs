use std::sync::Arc;

use crate::cart::{
    AddToCartRequest, AddToWishlistRequest, Cart, CartLineItem, RefreshPricingRequest,
    UpdateCartItemRequest, Wishlist, WishlistItem, MAX_LINE_QUANTITY,
};
use crate::models::EntityId;
use crate::pricing::{PriceCalculator, PriceSnapshotStore, PricingError, PricingResult, RateBreakdown, RateResolver};
use crate::repository::{CartRepository, ProductRepository, WishlistRepository};

/// Service for cart and wishlist business logic
///
/// Lines are priced when they are added and when a refresh is requested.
/// Nothing else in this service touches a cached price.
#[derive(Clone)]
pub struct CartService {
    products: Arc<dyn ProductRepository>,
    carts: Arc<dyn CartRepository>,
    wishlists: Arc<dyn WishlistRepository>,
    resolver: Arc<RateResolver>,
    snapshots: Arc<PriceSnapshotStore>,
}

impl CartService {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        carts: Arc<dyn CartRepository>,
        wishlists: Arc<dyn WishlistRepository>,
        resolver: Arc<RateResolver>,
        snapshots: Arc<PriceSnapshotStore>,
    ) -> Self {
        Self {
            products,
            carts,
            wishlists,
            resolver,
            snapshots,
        }
    }

    /// Price a product for a client and agent
    ///
    /// An unknown product is a hard `NotFound`; a product whose price cannot
    /// be parsed is `InvalidArgument`.
    async fn price_for(
        &self,
        product_id: &EntityId,
        client_id: &EntityId,
        agent_id: Option<&EntityId>,
    ) -> PricingResult<RateBreakdown> {
        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| PricingError::not_found("Product", product_id))?;

        let rates = self.resolver.resolve_ids(Some(client_id), agent_id).await?;
        let (pair, _) = rates.rates_for(&product.category);
        PriceCalculator::calculate_raw(product.base_price, pair)
    }

    async fn load_cart(&self, client_id: &EntityId) -> PricingResult<Cart> {
        Ok(self
            .carts
            .find_by_client_id(client_id)
            .await?
            .unwrap_or_else(|| Cart::empty(client_id.clone())))
    }

    async fn load_wishlist(&self, client_id: &EntityId) -> PricingResult<Wishlist> {
        Ok(self
            .wishlists
            .find_by_client_id(client_id)
            .await?
            .unwrap_or_else(|| Wishlist::empty(client_id.clone())))
    }

    /// Add a product to the client's cart and price the line
    ///
    /// Adding a product that is already in the cart increases its quantity
    /// and re-prices that line only. Without an `agentId` the line is priced
    /// with the agent the cart already carries.
    pub async fn add_to_cart(&self, request: AddToCartRequest) -> PricingResult<CartLineItem> {
        let product_id = EntityId::parse(&request.product_id)?;
        let client_id = EntityId::parse(&request.client_id)?;
        let requested_agent = EntityId::parse_optional(request.agent_id.as_deref())?;

        let mut cart = self.load_cart(&client_id).await?;
        let has_other_lines = cart.items.iter().any(|item| item.product_id != product_id);
        let agent_id = pricing_agent(cart.agent_id.as_ref(), requested_agent, has_other_lines)?;

        let breakdown = self.price_for(&product_id, &client_id, agent_id.as_ref()).await?;
        cart.agent_id = agent_id;

        match cart.find_item_mut(&product_id) {
            Some(item) => {
                item.quantity = combined_quantity(item.quantity, request.quantity, &product_id)?;
                if request.custom_fields.is_some() {
                    item.custom_fields = request.custom_fields;
                }
            }
            None => cart.items.push(CartLineItem::new(
                product_id.clone(),
                request.quantity,
                breakdown.clone(),
                request.custom_fields,
            )),
        }

        self.snapshots
            .attach_to_cart_item(&mut cart, &product_id, breakdown)
            .await?;

        tracing::debug!(client_id = %client_id, product_id = %product_id, "Cart line priced");
        cart.find_item(&product_id)
            .cloned()
            .ok_or_else(|| PricingError::not_found("Cart item", &product_id))
    }

    /// The client's cart; a client without one gets an empty cart
    pub async fn get_cart(&self, client_id: &str) -> PricingResult<Cart> {
        let client_id = EntityId::parse(client_id)?;
        self.load_cart(&client_id).await
    }

    /// Change quantity and/or custom fields of a line without re-pricing it
    pub async fn update_item(
        &self,
        product_id: &str,
        request: UpdateCartItemRequest,
    ) -> PricingResult<CartLineItem> {
        let product_id = EntityId::parse(product_id)?;
        let client_id = EntityId::parse(&request.client_id)?;

        let mut cart = self.load_cart(&client_id).await?;
        let item = cart
            .find_item_mut(&product_id)
            .ok_or_else(|| PricingError::not_found("Cart item", &product_id))?;

        if let Some(quantity) = request.quantity {
            item.quantity = quantity;
        }
        if request.custom_fields.is_some() {
            item.custom_fields = request.custom_fields;
        }
        let updated = item.clone();

        cart.touch();
        self.carts.save(&cart).await?;
        Ok(updated)
    }

    pub async fn remove_item(&self, product_id: &str, client_id: &str) -> PricingResult<Cart> {
        let product_id = EntityId::parse(product_id)?;
        let client_id = EntityId::parse(client_id)?;

        let mut cart = self.load_cart(&client_id).await?;
        if !cart.remove_item(&product_id) {
            return Err(PricingError::not_found("Cart item", &product_id));
        }
        self.carts.save(&cart).await?;
        Ok(cart)
    }

    /// Re-price every cart line against current rates
    ///
    /// Without an agent in the request the agent the cart was last priced
    /// with is used.
    pub async fn refresh_cart(&self, request: RefreshPricingRequest) -> PricingResult<Vec<CartLineItem>> {
        let client_id = EntityId::parse(&request.client_id)?;
        let requested_agent = EntityId::parse_optional(request.agent_id.as_deref())?;

        let mut cart = self.load_cart(&client_id).await?;
        let agent_id = requested_agent.or_else(|| cart.agent_id.clone());

        let items = std::mem::take(&mut cart.items);
        cart.items = self
            .snapshots
            .refresh_cart_pricing(&client_id, agent_id.as_ref(), items)
            .await?;
        cart.agent_id = agent_id;
        cart.touch();
        self.carts.save(&cart).await?;

        tracing::info!(client_id = %client_id, items = cart.items.len(), "Cart pricing refreshed");
        Ok(cart.items)
    }

    pub async fn get_wishlist(&self, client_id: &str) -> PricingResult<Wishlist> {
        let client_id = EntityId::parse(client_id)?;
        self.load_wishlist(&client_id).await
    }

    /// Add a product to the wishlist, or re-price it when already present
    ///
    /// Agent selection follows `add_to_cart`.
    pub async fn add_to_wishlist(&self, request: AddToWishlistRequest) -> PricingResult<WishlistItem> {
        let product_id = EntityId::parse(&request.product_id)?;
        let client_id = EntityId::parse(&request.client_id)?;
        let requested_agent = EntityId::parse_optional(request.agent_id.as_deref())?;

        let mut wishlist = self.load_wishlist(&client_id).await?;
        let has_other_lines = wishlist.items.iter().any(|item| item.product_id != product_id);
        let agent_id = pricing_agent(wishlist.agent_id.as_ref(), requested_agent, has_other_lines)?;

        let breakdown = self.price_for(&product_id, &client_id, agent_id.as_ref()).await?;
        wishlist.agent_id = agent_id;
        if wishlist.find_item(&product_id).is_none() {
            wishlist
                .items
                .push(WishlistItem::new(product_id.clone(), breakdown.clone()));
        }

        self.snapshots
            .attach_to_wishlist_item(&mut wishlist, &product_id, breakdown)
            .await?;

        wishlist
            .find_item(&product_id)
            .cloned()
            .ok_or_else(|| PricingError::not_found("Wishlist item", &product_id))
    }

    pub async fn remove_from_wishlist(&self, product_id: &str, client_id: &str) -> PricingResult<Wishlist> {
        let product_id = EntityId::parse(product_id)?;
        let client_id = EntityId::parse(client_id)?;

        let mut wishlist = self.load_wishlist(&client_id).await?;
        if !wishlist.remove_item(&product_id) {
            return Err(PricingError::not_found("Wishlist item", &product_id));
        }
        self.wishlists.save(&wishlist).await?;
        Ok(wishlist)
    }

    pub async fn refresh_wishlist(&self, request: RefreshPricingRequest) -> PricingResult<Vec<WishlistItem>> {
        let client_id = EntityId::parse(&request.client_id)?;
        let requested_agent = EntityId::parse_optional(request.agent_id.as_deref())?;

        let mut wishlist = self.load_wishlist(&client_id).await?;
        let agent_id = requested_agent.or_else(|| wishlist.agent_id.clone());

        let items = std::mem::take(&mut wishlist.items);
        wishlist.items = self
            .snapshots
            .refresh_wishlist_pricing(&client_id, agent_id.as_ref(), items)
            .await?;
        wishlist.agent_id = agent_id;
        wishlist.updated_at = chrono::Utc::now();
        self.wishlists.save(&wishlist).await?;

        Ok(wishlist.items)
    }
}

/// Agent a new or re-priced line is priced with
///
/// Every line of a cart carries the cart's agent. A different agent is only
/// accepted while no other line exists; otherwise the caller refreshes the
/// whole cart with the new agent.
fn pricing_agent(
    stored: Option<&EntityId>,
    requested: Option<EntityId>,
    has_other_lines: bool,
) -> PricingResult<Option<EntityId>> {
    match requested {
        None => Ok(stored.cloned()),
        Some(agent) if !has_other_lines || stored == Some(&agent) => Ok(Some(agent)),
        Some(agent) => Err(PricingError::invalid(format!(
            "Lines are priced with agent {}; refresh pricing with agent {} before adding",
            stored.map(EntityId::as_str).unwrap_or("none"),
            agent
        ))),
    }
}

/// Quantity after adding `added` units to an existing line
fn combined_quantity(current: u32, added: u32, product_id: &EntityId) -> PricingResult<u32> {
    current
        .checked_add(added)
        .filter(|quantity| *quantity <= MAX_LINE_QUANTITY)
        .ok_or_else(|| {
            PricingError::invalid(format!(
                "Quantity for {} cannot exceed {}",
                product_id, MAX_LINE_QUANTITY
            ))
        })
}
