// Bulk Pricing Pipeline
//
// Prices a whole product page with one rate resolution. Category overrides
// come from the agent record fetched during that resolution, so pricing a
// product never does I/O of its own.

use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::models::{EntityId, Product};
use crate::pricing::{
    calculator::PriceCalculator,
    error::{PricingError, PricingResult},
    metrics::PricingMetrics,
    resolver::{RateResolver, ResolvedRates},
    types::{ConsultantLevel, Money, Percentage},
};
use crate::query::{PageRequest, ProductFilter};
use crate::repository::ProductRepository;

/// How a listed product's price was derived
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommissionInfo {
    #[schema(value_type = String)]
    pub agent_commission_rate: Percentage,
    #[schema(value_type = String)]
    pub consultant_level_rate: Percentage,
    #[schema(value_type = String)]
    pub total_rate: Percentage,
    #[schema(value_type = String)]
    pub agent_commission_amount: Money,
    #[schema(value_type = String)]
    pub consultant_commission_amount: Money,
    pub is_global_rate: bool,
    pub consultant_level: ConsultantLevel,
    pub consultant_name: String,
    /// True when an agent category rate replaced the global rate
    pub category_override: bool,
    /// Set when this product could not be priced; the price shown is an estimate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A product with its commission-inclusive price layered on top
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PricedProduct {
    #[serde(flatten)]
    pub product: Product,
    pub original_price: f64,
    pub calculated_price: f64,
    pub commission_info: CommissionInfo,
}

impl PricedProduct {
    pub fn is_estimate(&self) -> bool {
        self.commission_info.error.is_some()
    }
}

/// One page of priced products
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PricedPage {
    pub items: Vec<PricedProduct>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

pub struct BulkPricingPipeline {
    resolver: Arc<RateResolver>,
    products: Arc<dyn ProductRepository>,
    metrics: PricingMetrics,
}

impl BulkPricingPipeline {
    pub fn new(
        resolver: Arc<RateResolver>,
        products: Arc<dyn ProductRepository>,
        metrics: PricingMetrics,
    ) -> Self {
        Self {
            resolver,
            products,
            metrics,
        }
    }

    /// Price already-fetched products, keeping their order
    pub async fn price_all(
        &self,
        products: &[Product],
        client_id: Option<&str>,
        agent_id: Option<&str>,
    ) -> PricingResult<Vec<PricedProduct>> {
        let rates = self.resolver.resolve(client_id, agent_id).await?;
        Ok(self.price_with_rates(products, &rates))
    }

    /// Fetch one page of products and price it
    ///
    /// A failure to fetch the page aborts the request; a failure to price a
    /// single product does not.
    pub async fn price_page(
        &self,
        filter: &ProductFilter,
        page: &PageRequest,
        client_id: Option<&str>,
        agent_id: Option<&str>,
    ) -> PricingResult<PricedPage> {
        let _timer = self.metrics.start_listing();

        let rates = self.resolver.resolve(client_id, agent_id).await?;
        let fetched = self.products.find_many(filter, page).await?;
        let items = self.price_with_rates(&fetched.items, &rates);

        let limit = u64::from(page.limit.max(1));
        Ok(PricedPage {
            items,
            page: page.page,
            limit: page.limit,
            total: fetched.total,
            total_pages: fetched.total.div_ceil(limit),
        })
    }

    /// Price a single product by id
    pub async fn price_one(
        &self,
        product_id: &str,
        client_id: Option<&str>,
        agent_id: Option<&str>,
    ) -> PricingResult<PricedProduct> {
        let product_id = EntityId::parse(product_id)?;
        let rates = self.resolver.resolve(client_id, agent_id).await?;
        let product = self
            .products
            .find_by_id(&product_id)
            .await?
            .ok_or_else(|| PricingError::not_found("Product", &product_id))?;

        let mut priced = self.price_with_rates(std::slice::from_ref(&product), &rates);
        priced
            .pop()
            .ok_or_else(|| PricingError::not_found("Product", &product_id))
    }

    /// Map the calculator over `products` with one resolved rate set
    pub fn price_with_rates(&self, products: &[Product], rates: &ResolvedRates) -> Vec<PricedProduct> {
        let priced: Vec<PricedProduct> = products.iter().map(|p| price_product(p, rates)).collect();

        let failed = priced.iter().filter(|p| p.is_estimate()).count() as u64;
        self.metrics.record_items(priced.len() as u64 - failed, failed);
        priced
    }
}

/// Price one product; errors become an estimate flagged in `commission_info`
pub fn price_product(product: &Product, rates: &ResolvedRates) -> PricedProduct {
    let (pair, category_override) = rates.rates_for(&product.category);

    match PriceCalculator::calculate_raw(product.base_price, pair) {
        Ok(breakdown) => PricedProduct {
            product: product.clone(),
            original_price: product.base_price,
            calculated_price: breakdown.final_price.to_f64().unwrap_or(product.base_price),
            commission_info: CommissionInfo {
                agent_commission_rate: breakdown.agent_commission_rate,
                consultant_level_rate: breakdown.consultant_level_rate,
                total_rate: breakdown.total_rate,
                agent_commission_amount: breakdown.agent_commission_amount,
                consultant_commission_amount: breakdown.consultant_commission_amount,
                is_global_rate: rates.is_global_rate,
                consultant_level: rates.consultant_level,
                consultant_name: rates.consultant_name.clone(),
                category_override,
                error: None,
            },
        },
        Err(err) => {
            tracing::warn!(
                product_id = %product.id,
                base_price = product.base_price,
                error = %err,
                "Product could not be priced, showing base price"
            );
            PricedProduct {
                product: product.clone(),
                original_price: product.base_price,
                calculated_price: product.base_price,
                commission_info: CommissionInfo {
                    agent_commission_rate: pair.agent_commission_rate,
                    consultant_level_rate: pair.consultant_level_rate,
                    total_rate: pair.total(),
                    agent_commission_amount: Money::ZERO,
                    consultant_commission_amount: Money::ZERO,
                    is_global_rate: rates.is_global_rate,
                    consultant_level: rates.consultant_level,
                    consultant_name: rates.consultant_name.clone(),
                    category_override,
                    error: Some(err.to_string()),
                },
            }
        }
    }
}
