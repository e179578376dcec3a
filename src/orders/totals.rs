use crate::pricing::{Money, PricingError, PricingResult};

/// Order money arithmetic over frozen unit prices
pub struct OrderTotals;

impl OrderTotals {
    /// Line total for a frozen unit price
    ///
    /// # Arguments
    /// * `quantity` - Number of units ordered
    /// * `unit_price` - Commission-inclusive unit price captured at checkout
    pub fn line_total(quantity: u32, unit_price: Money) -> PricingResult<Money> {
        Money::from(quantity).checked_mul(unit_price).ok_or_else(|| {
            PricingError::invalid(format!("{} × {} overflows", quantity, unit_price))
        })
    }

    /// Sum of all line totals
    pub fn subtotal(line_totals: &[Money]) -> PricingResult<Money> {
        let mut sum = line_totals
            .iter()
            .try_fold(Money::ZERO, |sum, line| sum.checked_add(*line))
            .ok_or_else(|| PricingError::invalid("Order subtotal overflows"))?;
        if sum.scale() < 2 {
            sum.rescale(2);
        }
        Ok(sum)
    }
}
