// Commission-aware pricing core
//
// resolver -> calculator -> snapshot for carts and orders,
// resolver -> pipeline for listings. The cache is shared by every request.

pub mod cache;
pub mod calculator;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod resolver;
pub mod snapshot;
pub mod types;

pub use cache::{CacheKey, CachedRecord, RateCache};
pub use calculator::{round2, PriceCalculator, MAX_RATE};
pub use error::{PricingError, PricingResult};
pub use metrics::{MetricsSummary, PricingMetrics};
pub use pipeline::{BulkPricingPipeline, CommissionInfo, PricedPage, PricedProduct};
pub use resolver::{RateResolver, ResolvedRates};
pub use snapshot::{PriceSnapshotStore, PricedLine};
pub use types::{CommissionRates, ConsultantLevel, Money, Percentage, RateBreakdown};
