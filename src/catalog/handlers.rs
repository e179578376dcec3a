// HTTP handlers for the priced catalog

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{ApiError, ErrorResponse};
use crate::pricing::{PricedPage, PricedProduct};
use crate::query::ProductListParams;

/// Query parameters selecting whose commissions apply
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PricingContextQuery {
    pub client_id: Option<String>,
    pub agent_id: Option<String>,
}

/// Handler for GET /api/products
/// Supports search, filtering, sorting, and pagination
#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductListParams),
    responses(
        (status = 200, description = "Page of priced products", body = PricedPage),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 503, description = "Data store unavailable", body = ErrorResponse)
    ),
    tag = "products"
)]
pub async fn list_products_handler(
    State(state): State<crate::AppState>,
    Query(params): Query<ProductListParams>,
) -> Result<Json<PricedPage>, ApiError> {
    tracing::debug!("Listing products with query parameters: {:?}", params);

    let page = state.catalog_service.list_products(params).await?;
    Ok(Json(page))
}

/// Handler for GET /api/products/{product_id}
#[utoipa::path(
    get,
    path = "/api/products/{product_id}",
    params(
        ("product_id" = String, Path, description = "Product ID"),
        PricingContextQuery
    ),
    responses(
        (status = 200, description = "Priced product", body = PricedProduct),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    tag = "products"
)]
pub async fn get_product_handler(
    State(state): State<crate::AppState>,
    Path(product_id): Path<String>,
    Query(query): Query<PricingContextQuery>,
) -> Result<Json<PricedProduct>, ApiError> {
    let product = state
        .catalog_service
        .get_product(
            &product_id,
            query.client_id.as_deref(),
            query.agent_id.as_deref(),
        )
        .await?;
    Ok(Json(product))
}
