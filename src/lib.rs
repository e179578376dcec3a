pub mod accounts;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod orders;
pub mod pricing;
pub mod query;
pub mod repository;
pub mod validation;

use axum::{
    extract::State,
    response::Json,
    routing::{delete, get, patch, post, put},
    Router,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use accounts::AccountService;
use cart::CartService;
use catalog::CatalogService;
use config::AppConfig;
use orders::OrderService;
use pricing::{
    cache::DEFAULT_TTL, BulkPricingPipeline, MetricsSummary, PriceSnapshotStore, PricingMetrics,
    RateCache, RateResolver,
};
use repository::Repositories;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        catalog::handlers::list_products_handler,
        catalog::handlers::get_product_handler,
        cart::handlers::get_cart_handler,
        cart::handlers::add_to_cart_handler,
        cart::handlers::update_cart_item_handler,
        cart::handlers::remove_cart_item_handler,
        cart::handlers::refresh_cart_pricing_handler,
        cart::handlers::get_wishlist_handler,
        cart::handlers::add_to_wishlist_handler,
        cart::handlers::remove_wishlist_item_handler,
        cart::handlers::refresh_wishlist_pricing_handler,
        orders::handlers::create_order_handler,
        orders::handlers::list_orders_handler,
        orders::handlers::get_order_handler,
        orders::handlers::update_order_status_handler,
        accounts::handlers::update_agent_commission_handler,
        accounts::handlers::update_consultant_level_handler,
    ),
    components(
        schemas(
            models::EntityId, models::Product, models::Agent, models::Client,
            pricing::ConsultantLevel, pricing::RateBreakdown, pricing::CommissionInfo,
            pricing::PricedProduct, pricing::PricedPage, pricing::MetricsSummary,
            cart::CartLineItem, cart::CartResponse, cart::Wishlist, cart::WishlistItem,
            cart::AddToCartRequest, cart::UpdateCartItemRequest, cart::RefreshPricingRequest,
            cart::AddToWishlistRequest,
            orders::Order, orders::OrderLineItem, orders::OrderStatus,
            orders::CreateOrderRequest, orders::UpdateStatusRequest,
            accounts::UpdateCommissionRequest, accounts::UpdateConsultantLevelRequest,
            error::ErrorResponse, HealthResponse,
        )
    ),
    tags(
        (name = "products", description = "Catalog with commission-inclusive prices"),
        (name = "cart", description = "Cart lines carrying their attached price"),
        (name = "wishlist", description = "Wishlist lines carrying their attached price"),
        (name = "orders", description = "Checkout with frozen prices and shipping status"),
        (name = "accounts", description = "Agent commission and client consultant settings"),
        (name = "health", description = "Liveness and pricing metrics")
    ),
    info(
        title = "Commission Pricing API",
        version = "0.1.0",
        description = "Commission-aware dynamic pricing for catalog, cart and orders"
    )
)]
pub struct ApiDoc;

/// Pricing knobs taken from configuration
#[derive(Debug, Clone)]
pub struct PricingSettings {
    pub rate_cache_ttl: Duration,
    pub default_agent_commission_rate: Decimal,
    pub max_page_size: u32,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            rate_cache_ttl: DEFAULT_TTL,
            default_agent_commission_rate: Decimal::ZERO,
            max_page_size: 100,
        }
    }
}

impl From<&AppConfig> for PricingSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            rate_cache_ttl: config.rate_cache_ttl,
            default_agent_commission_rate: config.default_agent_commission_rate,
            max_page_size: config.max_page_size,
        }
    }
}

/// Application state shared across handlers
///
/// One RateCache per process; every service resolves through it.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<RateCache>,
    pub metrics: PricingMetrics,
    pub catalog_service: CatalogService,
    pub cart_service: CartService,
    pub order_service: OrderService,
    pub account_service: AccountService,
}

impl AppState {
    /// Wire the pricing core and services over a set of repositories
    pub fn new(repos: Repositories, settings: PricingSettings) -> Self {
        let metrics = PricingMetrics::new();
        let cache = Arc::new(RateCache::with_ttl(settings.rate_cache_ttl).with_metrics(metrics.clone()));

        let resolver = Arc::new(
            RateResolver::new(
                repos.agents.clone(),
                repos.clients.clone(),
                repos.consultant_levels.clone(),
                cache.clone(),
            )
            .with_default_agent_rate(settings.default_agent_commission_rate),
        );
        let pipeline = Arc::new(BulkPricingPipeline::new(
            resolver.clone(),
            repos.products.clone(),
            metrics.clone(),
        ));
        let snapshots = Arc::new(PriceSnapshotStore::new(
            resolver.clone(),
            repos.products.clone(),
            repos.carts.clone(),
            repos.wishlists.clone(),
        ));

        Self {
            catalog_service: CatalogService::new(pipeline, settings.max_page_size),
            cart_service: CartService::new(
                repos.products.clone(),
                repos.carts.clone(),
                repos.wishlists.clone(),
                resolver,
                snapshots,
            ),
            order_service: OrderService::new(repos.carts.clone(), repos.orders.clone()),
            account_service: AccountService::new(repos.agents, repos.clients, cache.clone()),
            cache,
            metrics,
        }
    }
}

/// Health and pricing metrics
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub rate_cache_entries: usize,
    pub pricing: MetricsSummary,
}

/// Handler for GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "health"
)]
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        rate_cache_entries: state.cache.len().await,
        pricing: state.metrics.summary(),
    })
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS and tracing middleware
pub fn create_router(state: AppState) -> Router {
    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health_handler))
        // Catalog
        .route("/api/products", get(catalog::list_products_handler))
        .route("/api/products/:product_id", get(catalog::get_product_handler))
        // Cart
        .route("/api/cart", get(cart::get_cart_handler))
        .route("/api/cart/items", post(cart::add_to_cart_handler))
        .route(
            "/api/cart/items/:product_id",
            patch(cart::update_cart_item_handler).delete(cart::remove_cart_item_handler),
        )
        .route("/api/cart/refresh-pricing", post(cart::refresh_cart_pricing_handler))
        // Wishlist
        .route("/api/wishlist", get(cart::get_wishlist_handler))
        .route("/api/wishlist/items", post(cart::add_to_wishlist_handler))
        .route("/api/wishlist/items/:product_id", delete(cart::remove_wishlist_item_handler))
        .route("/api/wishlist/refresh-pricing", post(cart::refresh_wishlist_pricing_handler))
        // Orders
        .route(
            "/api/orders",
            post(orders::create_order_handler).get(orders::list_orders_handler),
        )
        .route("/api/orders/:order_id", get(orders::get_order_handler))
        .route("/api/orders/:order_id/status", patch(orders::update_order_status_handler))
        // Commission settings
        .route(
            "/api/agents/:agent_id/commission",
            put(accounts::update_agent_commission_handler),
        )
        .route(
            "/api/clients/:client_id/consultant-level",
            put(accounts::update_consultant_level_handler),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests;
