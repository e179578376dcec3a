// Domain type definitions for the pricing core
// Shared by the calculator, resolver, snapshot store and HTTP layer

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Monetary amount
pub type Money = Decimal;

/// Percentage points (5 means 5%)
pub type Percentage = Decimal;

/// Consultant tier a client belongs to
///
/// Each tier maps to a fixed commission rate in percentage points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConsultantLevel {
    #[default]
    #[serde(alias = "None")]
    None,
    #[serde(alias = "Red")]
    Red,
    #[serde(alias = "Yellow")]
    Yellow,
    #[serde(alias = "Purple")]
    Purple,
}

impl ConsultantLevel {
    pub const ALL: [ConsultantLevel; 4] = [
        ConsultantLevel::None,
        ConsultantLevel::Red,
        ConsultantLevel::Yellow,
        ConsultantLevel::Purple,
    ];

    /// Fixed consultant commission table: none 0, red 5, yellow 10, purple 15
    pub fn default_rate(&self) -> Percentage {
        match self {
            ConsultantLevel::None => Decimal::ZERO,
            ConsultantLevel::Red => Decimal::from(5),
            ConsultantLevel::Yellow => Decimal::from(10),
            ConsultantLevel::Purple => Decimal::from(15),
        }
    }

    /// Rate for an optional level; an unset level earns nothing
    pub fn rate_of(level: Option<ConsultantLevel>) -> Percentage {
        level.unwrap_or_default().default_rate()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultantLevel::None => "none",
            ConsultantLevel::Red => "red",
            ConsultantLevel::Yellow => "yellow",
            ConsultantLevel::Purple => "purple",
        }
    }

    /// Name shown to the UI when no level record overrides it
    pub fn display_name(&self) -> &'static str {
        match self {
            ConsultantLevel::None => "Default",
            ConsultantLevel::Red => "Red",
            ConsultantLevel::Yellow => "Yellow",
            ConsultantLevel::Purple => "Purple",
        }
    }
}

impl fmt::Display for ConsultantLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ConsultantLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(ConsultantLevel::None),
            "red" => Ok(ConsultantLevel::Red),
            "yellow" => Ok(ConsultantLevel::Yellow),
            "purple" => Ok(ConsultantLevel::Purple),
            _ => Err(format!("Invalid consultant level: {}", s)),
        }
    }
}

/// The rate pair the calculator consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommissionRates {
    pub agent_commission_rate: Percentage,
    pub consultant_level_rate: Percentage,
}

impl CommissionRates {
    pub fn new(agent_commission_rate: Percentage, consultant_level_rate: Percentage) -> Self {
        Self {
            agent_commission_rate,
            consultant_level_rate,
        }
    }

    pub fn total(&self) -> Percentage {
        self.agent_commission_rate + self.consultant_level_rate
    }
}

/// Full price breakdown, always produced as a whole
///
/// All monetary fields carry exactly two decimal places so a stored
/// breakdown serializes to the same bytes every time it is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateBreakdown {
    #[schema(value_type = String, example = "5")]
    pub agent_commission_rate: Percentage,
    #[schema(value_type = String, example = "10")]
    pub consultant_level_rate: Percentage,
    #[schema(value_type = String, example = "15")]
    pub total_rate: Percentage,
    #[schema(value_type = String, example = "1000.00")]
    pub base_price: Money,
    #[schema(value_type = String, example = "50.00")]
    pub agent_commission_amount: Money,
    #[schema(value_type = String, example = "100.00")]
    pub consultant_commission_amount: Money,
    #[schema(value_type = String, example = "1150.00")]
    pub final_price: Money,
}

impl RateBreakdown {
    /// Rates that produced this breakdown
    pub fn rates(&self) -> CommissionRates {
        CommissionRates::new(self.agent_commission_rate, self.consultant_level_rate)
    }

    /// Total commission earned on one unit
    pub fn commission_amount(&self) -> Money {
        self.agent_commission_amount + self.consultant_commission_amount
    }
}
