use std::sync::Arc;

use crate::error::ApiError;
use crate::pricing::{BulkPricingPipeline, PricedPage, PricedProduct};
use crate::query::{ProductListParams, QueryValidator};

/// Priced catalog reads
#[derive(Clone)]
pub struct CatalogService {
    pipeline: Arc<BulkPricingPipeline>,
    max_page_size: u32,
}

impl CatalogService {
    pub fn new(pipeline: Arc<BulkPricingPipeline>, max_page_size: u32) -> Self {
        Self {
            pipeline,
            max_page_size,
        }
    }

    /// One filtered page of products, each with its commission-inclusive price
    pub async fn list_products(&self, params: ProductListParams) -> Result<PricedPage, ApiError> {
        let (filter, page) = QueryValidator::validate(&params, self.max_page_size)?;

        let priced = self
            .pipeline
            .price_page(
                &filter,
                &page,
                params.client_id.as_deref(),
                params.agent_id.as_deref(),
            )
            .await?;

        tracing::debug!(
            page = priced.page,
            returned = priced.items.len(),
            total = priced.total,
            "Priced product page"
        );
        Ok(priced)
    }

    pub async fn get_product(
        &self,
        product_id: &str,
        client_id: Option<&str>,
        agent_id: Option<&str>,
    ) -> Result<PricedProduct, ApiError> {
        Ok(self.pipeline.price_one(product_id, client_id, agent_id).await?)
    }
}
