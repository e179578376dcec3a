use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::EntityId;
use crate::pricing::{Money, PricedLine, PricingError, PricingResult, RateBreakdown};

/// Largest quantity a single cart line may hold
pub const MAX_LINE_QUANTITY: u32 = 10_000;

/// Free-form per-line fields (finish, thickness, notes...)
pub type CustomFields = BTreeMap<String, serde_json::Value>;

/// A product in a client's cart, carrying the price it was last priced at
///
/// `price` and `breakdown` only change on add-to-cart or an explicit
/// refresh; quantity and custom fields are edited freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    #[schema(value_type = String)]
    pub product_id: EntityId,
    pub quantity: u32,
    #[schema(value_type = String, example = "1000.00")]
    pub base_price: Money,
    #[schema(value_type = String, example = "1150.00")]
    pub price: Money,
    pub breakdown: RateBreakdown,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub custom_fields: Option<CustomFields>,
    pub priced_at: DateTime<Utc>,
}

impl CartLineItem {
    pub fn new(
        product_id: EntityId,
        quantity: u32,
        breakdown: RateBreakdown,
        custom_fields: Option<CustomFields>,
    ) -> Self {
        Self {
            product_id,
            quantity,
            base_price: breakdown.base_price,
            price: breakdown.final_price,
            breakdown,
            custom_fields,
            priced_at: Utc::now(),
        }
    }

    /// price × quantity from the cached unit price
    pub fn line_total(&self) -> PricingResult<Money> {
        self.price
            .checked_mul(Money::from(self.quantity))
            .ok_or_else(|| PricingError::invalid(format!("Line total for {} overflows", self.product_id)))
    }
}

impl PricedLine for CartLineItem {
    fn product_id(&self) -> &EntityId {
        &self.product_id
    }

    fn breakdown(&self) -> &RateBreakdown {
        &self.breakdown
    }

    fn attach_pricing(&mut self, breakdown: RateBreakdown) {
        self.base_price = breakdown.base_price;
        self.price = breakdown.final_price;
        self.breakdown = breakdown;
        self.priced_at = Utc::now();
    }
}

/// A client's cart document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[schema(value_type = String)]
    pub client_id: EntityId,
    /// Agent the lines were last priced with
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub agent_id: Option<EntityId>,
    #[serde(default)]
    pub items: Vec<CartLineItem>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn empty(client_id: EntityId) -> Self {
        Self {
            client_id,
            agent_id: None,
            items: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn find_item(&self, product_id: &EntityId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    pub fn find_item_mut(&mut self, product_id: &EntityId) -> Option<&mut CartLineItem> {
        self.items.iter_mut().find(|item| &item.product_id == product_id)
    }

    /// Remove a line; returns false when the product was not in the cart
    pub fn remove_item(&mut self, product_id: &EntityId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.product_id != product_id);
        self.touch();
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.touch();
    }

    pub fn subtotal(&self) -> PricingResult<Money> {
        self.items.iter().try_fold(Money::ZERO, |sum, item| {
            sum.checked_add(item.line_total()?)
                .ok_or_else(|| PricingError::invalid("Cart subtotal overflows"))
        })
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// A wishlisted product with its last computed price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    #[schema(value_type = String)]
    pub product_id: EntityId,
    #[schema(value_type = String)]
    pub base_price: Money,
    #[schema(value_type = String)]
    pub price: Money,
    pub breakdown: RateBreakdown,
    pub added_at: DateTime<Utc>,
    pub priced_at: DateTime<Utc>,
}

impl WishlistItem {
    pub fn new(product_id: EntityId, breakdown: RateBreakdown) -> Self {
        let now = Utc::now();
        Self {
            product_id,
            base_price: breakdown.base_price,
            price: breakdown.final_price,
            breakdown,
            added_at: now,
            priced_at: now,
        }
    }
}

impl PricedLine for WishlistItem {
    fn product_id(&self) -> &EntityId {
        &self.product_id
    }

    fn breakdown(&self) -> &RateBreakdown {
        &self.breakdown
    }

    fn attach_pricing(&mut self, breakdown: RateBreakdown) {
        self.base_price = breakdown.base_price;
        self.price = breakdown.final_price;
        self.breakdown = breakdown;
        self.priced_at = Utc::now();
    }
}

/// A client's wishlist document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Wishlist {
    #[schema(value_type = String)]
    pub client_id: EntityId,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub agent_id: Option<EntityId>,
    #[serde(default)]
    pub items: Vec<WishlistItem>,
    pub updated_at: DateTime<Utc>,
}

impl Wishlist {
    pub fn empty(client_id: EntityId) -> Self {
        Self {
            client_id,
            agent_id: None,
            items: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn find_item(&self, product_id: &EntityId) -> Option<&WishlistItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    pub fn find_item_mut(&mut self, product_id: &EntityId) -> Option<&mut WishlistItem> {
        self.items.iter_mut().find(|item| &item.product_id == product_id)
    }

    pub fn remove_item(&mut self, product_id: &EntityId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.product_id != product_id);
        self.updated_at = Utc::now();
        self.items.len() != before
    }
}

/// Request DTO for POST /api/cart/items
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    #[validate(custom = "crate::validation::validate_entity_id")]
    pub product_id: String,
    #[validate(range(min = 1, max = 10000, message = "Quantity must be between 1 and 10000"))]
    pub quantity: u32,
    #[validate(custom = "crate::validation::validate_entity_id")]
    pub client_id: String,
    pub agent_id: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub custom_fields: Option<CustomFields>,
}

/// Request DTO for PATCH /api/cart/items/:product_id
///
/// Never re-prices the line.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartItemRequest {
    #[validate(custom = "crate::validation::validate_entity_id")]
    pub client_id: String,
    #[validate(range(min = 1, max = 10000, message = "Quantity must be between 1 and 10000"))]
    pub quantity: Option<u32>,
    #[schema(value_type = Option<Object>)]
    pub custom_fields: Option<CustomFields>,
}

/// Request DTO for the explicit re-price endpoints
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshPricingRequest {
    #[validate(custom = "crate::validation::validate_entity_id")]
    pub client_id: String,
    pub agent_id: Option<String>,
}

/// Request DTO for POST /api/wishlist/items
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddToWishlistRequest {
    #[validate(custom = "crate::validation::validate_entity_id")]
    pub product_id: String,
    #[validate(custom = "crate::validation::validate_entity_id")]
    pub client_id: String,
    pub agent_id: Option<String>,
}

/// Query parameters identifying the owning client
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ClientQuery {
    pub client_id: String,
}

/// Response DTO for a cart with its cached subtotal
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    #[schema(value_type = String)]
    pub client_id: EntityId,
    #[schema(value_type = Option<String>)]
    pub agent_id: Option<EntityId>,
    pub items: Vec<CartLineItem>,
    #[schema(value_type = String)]
    pub subtotal: Money,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<Cart> for CartResponse {
    type Error = PricingError;

    fn try_from(cart: Cart) -> Result<Self, Self::Error> {
        let subtotal = cart.subtotal()?;
        Ok(Self {
            client_id: cart.client_id,
            agent_id: cart.agent_id,
            items: cart.items,
            subtotal,
            updated_at: cart.updated_at,
        })
    }
}
