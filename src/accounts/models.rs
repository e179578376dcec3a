use serde::Deserialize;
use std::collections::HashMap;
use utoipa::ToSchema;
use validator::Validate;

use crate::pricing::{ConsultantLevel, Percentage};

/// Request DTO for PUT /api/agents/:id/commission
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommissionRequest {
    /// Global agent commission in percent, 0 to 100
    #[validate(custom = "crate::validation::validate_commission_rate")]
    #[schema(value_type = String, example = "10")]
    pub commission_rate: Percentage,

    /// Per-category overrides; replaces the stored map when present
    #[validate(custom = "crate::validation::validate_category_commissions")]
    #[schema(value_type = Option<HashMap<String, String>>)]
    pub category_commissions: Option<HashMap<String, Percentage>>,
}

/// Request DTO for PUT /api/clients/:id/consultant-level
///
/// `null` removes the tier.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConsultantLevelRequest {
    pub consultant_level: Option<ConsultantLevel>,
}
