//! Acquisition cost model.
//!
//! Build-up (renovation) is priced per square foot; financing is a flat
//! rate on offer plus build-up. Operation order is fixed so results are
//! reproducible bit-for-bit.

/// Renovation and financing cost constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub cost_per_sqft: f64,
    /// Fraction of offer + build-up (0.12 = 12%).
    pub financing_rate: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            cost_per_sqft: 75.0,
            financing_rate: 0.12,
        }
    }
}

/// Output of the cost model for one offer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostBreakdown {
    pub build_up: f64,
    pub financing: f64,
    pub all_inclusive: f64,
}

impl CostModel {
    pub fn new(cost_per_sqft: f64, financing_rate: f64) -> Self {
        Self {
            cost_per_sqft,
            financing_rate,
        }
    }

    pub fn calculate(&self, offer_price: f64, square_footage: u32) -> CostBreakdown {
        let build_up = self.cost_per_sqft * f64::from(square_footage);
        let financing = self.financing_rate * (offer_price + build_up);
        let all_inclusive = offer_price + build_up + financing;
        CostBreakdown {
            build_up,
            financing,
            all_inclusive,
        }
    }
}
