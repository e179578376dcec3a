// Price Calculator
//
// Combines a commission-free base price with a resolved rate pair.
// Each commission amount is rounded on its own before the sum is rounded;
// historical invoices depend on that order.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::pricing::{
    error::{PricingError, PricingResult},
    types::{CommissionRates, Money, Percentage, RateBreakdown},
};

/// Upper sanity bound for any single rate, in percentage points
pub const MAX_RATE: Percentage = Decimal::ONE_THOUSAND;

/// Round half-up to two decimal places and pin the scale to two
pub fn round2(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Show at least two decimal places without rounding the value
fn pad_scale(value: Decimal) -> Decimal {
    let mut padded = value;
    if padded.scale() < 2 {
        padded.rescale(2);
    }
    padded
}

/// Stateless commission-inclusive price calculator
pub struct PriceCalculator;

impl PriceCalculator {
    /// Convert a catalog document price into `Money`
    ///
    /// NaN, infinities and negative values are precondition violations.
    pub fn parse_base_price(raw: f64) -> PricingResult<Money> {
        if !raw.is_finite() {
            return Err(PricingError::invalid(format!(
                "basePrice must be a finite number, got {}",
                raw
            )));
        }
        if raw < 0.0 {
            return Err(PricingError::invalid(format!(
                "basePrice must not be negative, got {}",
                raw
            )));
        }
        Decimal::try_from(raw).map_err(|e| {
            PricingError::invalid(format!("basePrice {} is not representable: {}", raw, e))
        })
    }

    /// Calculate the full breakdown for one unit
    ///
    /// # Arguments
    /// * `base_price` - Commission-free unit price
    /// * `rates` - Agent rate (already category-substituted) and consultant rate
    ///
    /// # Returns
    /// A `RateBreakdown` whose `final_price` is
    /// `round2(base + round2(base * agent / 100) + round2(base * consultant / 100))`
    pub fn calculate(base_price: Money, rates: CommissionRates) -> PricingResult<RateBreakdown> {
        if base_price.is_sign_negative() && !base_price.is_zero() {
            return Err(PricingError::invalid(format!(
                "basePrice must not be negative, got {}",
                base_price
            )));
        }

        let agent_rate = Self::clamp_rate(rates.agent_commission_rate, "agentCommissionRate");
        let consultant_rate = Self::clamp_rate(rates.consultant_level_rate, "consultantLevelRate");

        let agent_amount = round2(Self::percent_of(base_price, agent_rate)?);
        let consultant_amount = round2(Self::percent_of(base_price, consultant_rate)?);

        let final_price = base_price
            .checked_add(agent_amount)
            .and_then(|sum| sum.checked_add(consultant_amount))
            .map(round2)
            .ok_or_else(|| PricingError::invalid(format!("basePrice {} overflows", base_price)))?;

        Ok(RateBreakdown {
            agent_commission_rate: agent_rate,
            consultant_level_rate: consultant_rate,
            total_rate: agent_rate + consultant_rate,
            base_price: pad_scale(base_price),
            agent_commission_amount: agent_amount,
            consultant_commission_amount: consultant_amount,
            final_price,
        })
    }

    /// Validate a raw document price, then calculate
    pub fn calculate_raw(base_price: f64, rates: CommissionRates) -> PricingResult<RateBreakdown> {
        let base_price = Self::parse_base_price(base_price)?;
        Self::calculate(base_price, rates)
    }

    fn percent_of(base_price: Money, rate: Percentage) -> PricingResult<Money> {
        base_price
            .checked_mul(rate)
            .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
            .ok_or_else(|| {
                PricingError::invalid(format!("basePrice {} at rate {} overflows", base_price, rate))
            })
    }

    /// Clamp a rate into [0, MAX_RATE], logging whenever the value changes
    fn clamp_rate(rate: Percentage, field: &str) -> Percentage {
        if rate < Decimal::ZERO {
            tracing::warn!(field, %rate, "Negative commission rate clamped to 0");
            Decimal::ZERO
        } else if rate > MAX_RATE {
            tracing::warn!(field, %rate, max = %MAX_RATE, "Commission rate clamped to sanity bound");
            MAX_RATE
        } else {
            rate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rates(agent: Decimal, consultant: Decimal) -> CommissionRates {
        CommissionRates::new(agent, consultant)
    }

    #[test]
    fn test_round2_half_up() {
        assert_eq!(round2(dec!(124.99875)), dec!(125.00));
        assert_eq!(round2(dec!(0.005)), dec!(0.01));
        assert_eq!(round2(dec!(0.0049)), dec!(0.00));
        assert_eq!(round2(dec!(7)).to_string(), "7.00");
    }

    #[test]
    fn test_scenario_round_numbers() {
        let breakdown = PriceCalculator::calculate(dec!(1000), rates(dec!(5), dec!(10))).unwrap();
        assert_eq!(breakdown.agent_commission_amount, dec!(50.00));
        assert_eq!(breakdown.consultant_commission_amount, dec!(100.00));
        assert_eq!(breakdown.final_price, dec!(1150.00));
        assert_eq!(breakdown.total_rate, dec!(15));
        assert_eq!(breakdown.final_price.to_string(), "1150.00");
    }

    #[test]
    fn test_scenario_fractional_agent_rate() {
        let breakdown = PriceCalculator::calculate(dec!(999.99), rates(dec!(12.5), dec!(0))).unwrap();
        assert_eq!(breakdown.agent_commission_amount, dec!(125.00));
        assert_eq!(breakdown.consultant_commission_amount, dec!(0.00));
        assert_eq!(breakdown.final_price, dec!(1124.99));
    }

    #[test]
    fn test_rounding_order_diverges_from_single_rounding() {
        let base = dec!(10.05);
        let agent = dec!(5);
        let consultant = dec!(5);

        let per_component = round2(
            round2(base * agent / dec!(100)) + round2(base * consultant / dec!(100)) + base,
        );
        let single = round2(base * (Decimal::ONE + (agent + consultant) / dec!(100)));
        assert_ne!(per_component, single, "the crafted input must separate the two formulas");

        let breakdown = PriceCalculator::calculate(base, rates(agent, consultant)).unwrap();
        assert_eq!(breakdown.final_price, per_component);
        assert_eq!(breakdown.final_price, dec!(11.05));
    }

    #[test]
    fn test_rounding_order_matches_component_formula_for_333_33() {
        let base = dec!(333.33);
        let breakdown = PriceCalculator::calculate(base, rates(dec!(7), dec!(0))).unwrap();
        let expected = round2(round2(base * dec!(7) / dec!(100)) + round2(Decimal::ZERO) + base);
        assert_eq!(breakdown.agent_commission_amount, dec!(23.33));
        assert_eq!(breakdown.final_price, expected);
    }

    #[test]
    fn test_zero_rates_keep_base_price() {
        let breakdown = PriceCalculator::calculate(dec!(42.5), CommissionRates::default()).unwrap();
        assert_eq!(breakdown.final_price, dec!(42.50));
        assert_eq!(breakdown.total_rate, dec!(0));
    }

    #[test]
    fn test_negative_base_price_is_rejected() {
        let result = PriceCalculator::calculate(dec!(-1), rates(dec!(5), dec!(0)));
        assert!(matches!(result, Err(PricingError::InvalidArgument(_))));
    }

    #[test]
    fn test_nan_and_infinite_raw_prices_are_rejected() {
        for raw in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -0.01] {
            let result = PriceCalculator::calculate_raw(raw, rates(dec!(5), dec!(0)));
            assert!(matches!(result, Err(PricingError::InvalidArgument(_))), "raw {}", raw);
        }
    }

    #[test]
    fn test_raw_price_parses_without_binary_noise() {
        assert_eq!(PriceCalculator::parse_base_price(333.33).unwrap(), dec!(333.33));
        let breakdown = PriceCalculator::calculate_raw(999.99, rates(dec!(12.5), dec!(0))).unwrap();
        assert_eq!(breakdown.final_price, dec!(1124.99));
    }

    #[test]
    fn test_rates_are_clamped_to_sanity_bounds() {
        let breakdown = PriceCalculator::calculate(dec!(10), rates(dec!(5000), dec!(-3))).unwrap();
        assert_eq!(breakdown.agent_commission_rate, MAX_RATE);
        assert_eq!(breakdown.consultant_level_rate, dec!(0));
        assert_eq!(breakdown.agent_commission_amount, dec!(100.00));
        assert_eq!(breakdown.final_price, dec!(110.00));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn cents(value: u64) -> Decimal {
        Decimal::from(value) / Decimal::ONE_HUNDRED
    }

    /// Identical inputs give identical breakdowns, down to the serialized bytes
    #[test]
    fn prop_calculation_is_deterministic() {
        proptest!(|(
            base_cents in 0u64..=100_000_000u64,
            agent_tenths in 0u32..=1000u32,
            consultant in 0u32..=15u32
        )| {
            let rates = CommissionRates::new(
                Decimal::from(agent_tenths) / Decimal::TEN,
                Decimal::from(consultant),
            );
            let first = PriceCalculator::calculate(cents(base_cents), rates).unwrap();
            let second = PriceCalculator::calculate(cents(base_cents), rates).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(
                serde_json::to_string(&first).unwrap(),
                serde_json::to_string(&second).unwrap()
            );
        });
    }

    /// totalRate is always the sum of the two applied rates
    #[test]
    fn prop_total_rate_is_additive() {
        proptest!(|(
            base_cents in 0u64..=10_000_000u64,
            agent in 0u32..=100u32,
            consultant in 0u32..=100u32
        )| {
            let rates = CommissionRates::new(Decimal::from(agent), Decimal::from(consultant));
            let breakdown = PriceCalculator::calculate(cents(base_cents), rates).unwrap();
            prop_assert_eq!(
                breakdown.total_rate,
                breakdown.agent_commission_rate + breakdown.consultant_level_rate
            );
        });
    }

    /// finalPrice follows the per-component rounding formula
    #[test]
    fn prop_final_price_rounds_each_component_first() {
        proptest!(|(
            base_cents in 0u64..=10_000_000u64,
            agent_hundredths in 0u32..=10_000u32,
            consultant in 0u32..=15u32
        )| {
            let base = cents(base_cents);
            let agent = Decimal::from(agent_hundredths) / Decimal::ONE_HUNDRED;
            let consultant = Decimal::from(consultant);
            let breakdown = PriceCalculator::calculate(base, CommissionRates::new(agent, consultant)).unwrap();

            let expected = round2(
                round2(base * agent / Decimal::ONE_HUNDRED)
                    + round2(base * consultant / Decimal::ONE_HUNDRED)
                    + base,
            );
            prop_assert_eq!(breakdown.final_price, expected);
        });
    }

    /// Commission never lowers the price
    #[test]
    fn prop_final_price_never_below_base() {
        proptest!(|(
            base_cents in 0u64..=10_000_000u64,
            agent in 0u32..=1000u32,
            consultant in 0u32..=15u32
        )| {
            let base = cents(base_cents);
            let rates = CommissionRates::new(Decimal::from(agent), Decimal::from(consultant));
            let breakdown = PriceCalculator::calculate(base, rates).unwrap();
            prop_assert!(breakdown.final_price >= base);
            prop_assert!(breakdown.agent_commission_amount >= Decimal::ZERO);
            prop_assert!(breakdown.consultant_commission_amount >= Decimal::ZERO);
        });
    }
}
