// HTTP handlers for cart and wishlist endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::cart::{
    AddToCartRequest, AddToWishlistRequest, CartLineItem, CartResponse, ClientQuery,
    RefreshPricingRequest, UpdateCartItemRequest, Wishlist, WishlistItem,
};
use crate::error::{ApiError, ErrorResponse};

/// Handler for GET /api/cart
#[utoipa::path(
    get,
    path = "/api/cart",
    params(ClientQuery),
    responses(
        (status = 200, description = "The client's cart with cached prices", body = CartResponse),
        (status = 400, description = "Malformed client id", body = ErrorResponse)
    ),
    tag = "cart"
)]
pub async fn get_cart_handler(
    State(state): State<crate::AppState>,
    Query(query): Query<ClientQuery>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.cart_service.get_cart(&query.client_id).await?;
    Ok(Json(CartResponse::try_from(cart)?))
}

/// Handler for POST /api/cart/items
/// Adds a product and attaches its commission breakdown
#[utoipa::path(
    post,
    path = "/api/cart/items",
    request_body = AddToCartRequest,
    responses(
        (status = 201, description = "Line added and priced", body = CartLineItem),
        (status = 400, description = "Invalid input data", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 503, description = "Data store unavailable", body = ErrorResponse)
    ),
    tag = "cart"
)]
pub async fn add_to_cart_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<AddToCartRequest>,
) -> Result<(StatusCode, Json<CartLineItem>), ApiError> {
    request.validate()?;

    let line = state.cart_service.add_to_cart(request).await?;
    Ok((StatusCode::CREATED, Json(line)))
}

/// Handler for PATCH /api/cart/items/{product_id}
/// Edits quantity or custom fields; the cached price is left alone
#[utoipa::path(
    patch,
    path = "/api/cart/items/{product_id}",
    params(("product_id" = String, Path, description = "Product ID")),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Line updated", body = CartLineItem),
        (status = 400, description = "Invalid input data", body = ErrorResponse),
        (status = 404, description = "Product not in cart", body = ErrorResponse)
    ),
    tag = "cart"
)]
pub async fn update_cart_item_handler(
    State(state): State<crate::AppState>,
    Path(product_id): Path<String>,
    Json(request): Json<UpdateCartItemRequest>,
) -> Result<Json<CartLineItem>, ApiError> {
    request.validate()?;

    let line = state.cart_service.update_item(&product_id, request).await?;
    Ok(Json(line))
}

/// Handler for DELETE /api/cart/items/{product_id}
#[utoipa::path(
    delete,
    path = "/api/cart/items/{product_id}",
    params(
        ("product_id" = String, Path, description = "Product ID"),
        ClientQuery
    ),
    responses(
        (status = 200, description = "Line removed", body = CartResponse),
        (status = 404, description = "Product not in cart", body = ErrorResponse)
    ),
    tag = "cart"
)]
pub async fn remove_cart_item_handler(
    State(state): State<crate::AppState>,
    Path(product_id): Path<String>,
    Query(query): Query<ClientQuery>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state
        .cart_service
        .remove_item(&product_id, &query.client_id)
        .await?;
    Ok(Json(CartResponse::try_from(cart)?))
}

/// Handler for POST /api/cart/refresh-pricing
/// Re-prices every line against current rates
#[utoipa::path(
    post,
    path = "/api/cart/refresh-pricing",
    request_body = RefreshPricingRequest,
    responses(
        (status = 200, description = "Re-priced cart lines", body = Vec<CartLineItem>),
        (status = 400, description = "Invalid input data", body = ErrorResponse),
        (status = 503, description = "Data store unavailable", body = ErrorResponse)
    ),
    tag = "cart"
)]
pub async fn refresh_cart_pricing_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<RefreshPricingRequest>,
) -> Result<Json<Vec<CartLineItem>>, ApiError> {
    request.validate()?;

    let items = state.cart_service.refresh_cart(request).await?;
    Ok(Json(items))
}

/// Handler for GET /api/wishlist
#[utoipa::path(
    get,
    path = "/api/wishlist",
    params(ClientQuery),
    responses(
        (status = 200, description = "The client's wishlist", body = Wishlist),
        (status = 400, description = "Malformed client id", body = ErrorResponse)
    ),
    tag = "wishlist"
)]
pub async fn get_wishlist_handler(
    State(state): State<crate::AppState>,
    Query(query): Query<ClientQuery>,
) -> Result<Json<Wishlist>, ApiError> {
    let wishlist = state.cart_service.get_wishlist(&query.client_id).await?;
    Ok(Json(wishlist))
}

/// Handler for POST /api/wishlist/items
#[utoipa::path(
    post,
    path = "/api/wishlist/items",
    request_body = AddToWishlistRequest,
    responses(
        (status = 201, description = "Product wishlisted and priced", body = WishlistItem),
        (status = 400, description = "Invalid input data", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    tag = "wishlist"
)]
pub async fn add_to_wishlist_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<AddToWishlistRequest>,
) -> Result<(StatusCode, Json<WishlistItem>), ApiError> {
    request.validate()?;

    let item = state.cart_service.add_to_wishlist(request).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Handler for DELETE /api/wishlist/items/{product_id}
#[utoipa::path(
    delete,
    path = "/api/wishlist/items/{product_id}",
    params(
        ("product_id" = String, Path, description = "Product ID"),
        ClientQuery
    ),
    responses(
        (status = 200, description = "Product removed", body = Wishlist),
        (status = 404, description = "Product not in wishlist", body = ErrorResponse)
    ),
    tag = "wishlist"
)]
pub async fn remove_wishlist_item_handler(
    State(state): State<crate::AppState>,
    Path(product_id): Path<String>,
    Query(query): Query<ClientQuery>,
) -> Result<Json<Wishlist>, ApiError> {
    let wishlist = state
        .cart_service
        .remove_from_wishlist(&product_id, &query.client_id)
        .await?;
    Ok(Json(wishlist))
}

/// Handler for POST /api/wishlist/refresh-pricing
#[utoipa::path(
    post,
    path = "/api/wishlist/refresh-pricing",
    request_body = RefreshPricingRequest,
    responses(
        (status = 200, description = "Re-priced wishlist items", body = Vec<WishlistItem>),
        (status = 400, description = "Invalid input data", body = ErrorResponse)
    ),
    tag = "wishlist"
)]
pub async fn refresh_wishlist_pricing_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<RefreshPricingRequest>,
) -> Result<Json<Vec<WishlistItem>>, ApiError> {
    request.validate()?;

    let items = state.cart_service.refresh_wishlist(request).await?;
    Ok(Json(items))
}
