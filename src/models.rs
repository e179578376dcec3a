use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use utoipa::ToSchema;

use crate::pricing::{ConsultantLevel, Percentage, PricingError, PricingResult};
use crate::validation::is_valid_entity_id;

/// Opaque id of an agent, client or product
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Parse a caller-supplied id; anything malformed is a hard error
    pub fn parse(raw: &str) -> PricingResult<Self> {
        let trimmed = raw.trim();
        if !is_valid_entity_id(trimmed) {
            return Err(PricingError::invalid(format!("Malformed id '{}'", raw)));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Parse an optional id, treating blank values as absent
    pub fn parse_optional(raw: Option<&str>) -> PricingResult<Option<Self>> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => Self::parse(value).map(Some),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A catalog product as stored in the document store
///
/// `base_price` is the commission-free price. It is kept as the raw JSON
/// number from the document so that a corrupt value can still be listed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[schema(value_type = String, example = "granite-black-galaxy")]
    pub id: EntityId,
    #[schema(example = "Black Galaxy Granite")]
    pub name: String,
    #[schema(example = "Granite")]
    pub category: String,
    #[schema(example = 1000.0)]
    #[serde(default = "missing_price", deserialize_with = "lenient_price")]
    pub base_price: f64,
}

fn missing_price() -> f64 {
    f64::NAN
}

/// Accept numbers and numeric strings; anything else becomes NaN so the
/// product is still listed and flagged instead of failing the whole page
fn lenient_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    })
}

/// A sales agent and their commission configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    #[schema(value_type = String)]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[schema(value_type = String, example = "8")]
    pub commission_rate: Percentage,
    /// Per-category rates that replace `commission_rate` for that category
    #[serde(default)]
    #[schema(value_type = Object)]
    pub category_commissions: HashMap<String, Percentage>,
}

impl Agent {
    /// Category override, if the agent configured one
    pub fn category_rate(&self, category: &str) -> Option<Percentage> {
        self.category_commissions.get(category).copied()
    }
}

/// A client and the consultant tier they currently belong to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[schema(value_type = String)]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub consultant_level: Option<ConsultantLevel>,
}

/// Optional stored record for a consultant tier
///
/// When present it supplies the tier's display name and rate; when absent
/// the fixed table on `ConsultantLevel` applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsultantLevelRecord {
    pub level: ConsultantLevel,
    pub name: String,
    #[schema(value_type = String, example = "5")]
    pub rate: Percentage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_entity_id_parse() {
        let id = EntityId::parse("  agent-7 ").unwrap();
        assert_eq!(id.as_str(), "agent-7");
        assert!(matches!(EntityId::parse("bad id"), Err(PricingError::InvalidArgument(_))));
    }

    #[test]
    fn test_entity_id_parse_optional_blank_is_absent() {
        assert_eq!(EntityId::parse_optional(None).unwrap(), None);
        assert_eq!(EntityId::parse_optional(Some("   ")).unwrap(), None);
        assert!(EntityId::parse_optional(Some("x")).unwrap().is_some());
        assert!(EntityId::parse_optional(Some("a/b")).is_err());
    }

    #[test]
    fn test_agent_deserialization_defaults() {
        let json = r#"{ "id": "a1", "commissionRate": 8 }"#;
        let agent: Agent = serde_json::from_str(json).expect("Failed to deserialize Agent");
        assert_eq!(agent.commission_rate, dec!(8));
        assert!(agent.category_commissions.is_empty());
        assert_eq!(agent.category_rate("Granite"), None);
    }

    #[test]
    fn test_agent_category_rate() {
        let json = r#"{ "id": "a1", "commissionRate": "8", "categoryCommissions": { "Granite": 3 } }"#;
        let agent: Agent = serde_json::from_str(json).expect("Failed to deserialize Agent");
        assert_eq!(agent.category_rate("Granite"), Some(dec!(3)));
        assert_eq!(agent.category_rate("Marble"), None);
    }

    #[test]
    fn test_client_without_level() {
        let client: Client = serde_json::from_str(r#"{ "id": "c1" }"#).unwrap();
        assert_eq!(client.consultant_level, None);

        let client: Client =
            serde_json::from_str(r#"{ "id": "c1", "consultantLevel": "purple" }"#).unwrap();
        assert_eq!(client.consultant_level, Some(ConsultantLevel::Purple));
    }

    #[test]
    fn test_product_serialization() {
        let product = Product {
            id: EntityId::parse("p1").unwrap(),
            name: "Carrara".to_string(),
            category: "Marble".to_string(),
            base_price: 450.5,
        };
        let json = serde_json::to_string(&product).unwrap();
        assert!(json.contains("\"basePrice\":450.5"));
        assert!(json.contains("\"category\":\"Marble\""));
    }

    #[test]
    fn test_product_with_malformed_price_still_deserializes() {
        let product: Product = serde_json::from_str(
            r#"{ "id": "p1", "name": "Onyx", "category": "Onyx", "basePrice": "n/a" }"#,
        )
        .unwrap();
        assert!(product.base_price.is_nan());

        let product: Product = serde_json::from_str(
            r#"{ "id": "p2", "name": "Onyx", "category": "Onyx", "basePrice": "12.5" }"#,
        )
        .unwrap();
        assert_eq!(product.base_price, 12.5);
    }
}
