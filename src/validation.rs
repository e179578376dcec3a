// Validation utilities module
// Provides custom validation functions for domain-specific rules

use regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;
use validator::ValidationError;

/// Longest id accepted for agents, clients and products
pub const MAX_ID_LENGTH: usize = 64;

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("static id pattern compiles"))
}

/// Whether a raw string is a well-formed entity id
pub fn is_valid_entity_id(raw: &str) -> bool {
    raw.len() <= MAX_ID_LENGTH && id_pattern().is_match(raw)
}

/// Validates an id field on a request DTO
pub fn validate_entity_id(raw: &str) -> Result<(), ValidationError> {
    if is_valid_entity_id(raw) {
        Ok(())
    } else {
        Err(ValidationError::new("malformed_id"))
    }
}

/// Validates that a commission setting is between 0 and 100 percent
pub fn validate_commission_rate(rate: &Decimal) -> Result<(), ValidationError> {
    if *rate < Decimal::ZERO || *rate > Decimal::ONE_HUNDRED {
        Err(ValidationError::new("commission_rate_out_of_range"))
    } else {
        Ok(())
    }
}

/// Validates every per-category commission override
pub fn validate_category_commissions(
    overrides: &std::collections::HashMap<String, Decimal>,
) -> Result<(), ValidationError> {
    for (category, rate) in overrides {
        if category.trim().is_empty() {
            return Err(ValidationError::new("empty_category"));
        }
        validate_commission_rate(rate)?;
    }
    Ok(())
}
