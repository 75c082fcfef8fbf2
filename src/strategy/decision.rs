//! Investment decision.
//!
//! Offer at list price, price the renovation and financing, and compare
//! the highest qualifying comparable against the all-in cost. A profit
//! strictly above the threshold is a `Yes`.
//!
//! Profit against the lowest comparable is also computed and reported,
//! but the decision keys off the highest.

use super::comps::CompSet;
use super::costs::CostModel;
use crate::types::{Decision, Listing, Valuation};

/// Turns a listing plus its qualifying comparables into a `Valuation`.
#[derive(Debug, Clone, Copy)]
pub struct DecisionEngine {
    costs: CostModel,
    upside_threshold: f64,
}

impl DecisionEngine {
    pub fn new(costs: CostModel, upside_threshold: f64) -> Self {
        Self {
            costs,
            upside_threshold,
        }
    }

    /// `Yes` iff profit is strictly greater than the threshold.
    pub fn decide(&self, upside_profit: f64) -> Decision {
        if upside_profit > self.upside_threshold {
            Decision::Yes
        } else {
            Decision::No
        }
    }

    pub fn evaluate(&self, listing: &Listing, comps: &CompSet) -> Valuation {
        let best_offer_price = listing.list_price;
        let costs = self.costs.calculate(best_offer_price, listing.square_footage);

        let upside_value = comps.max_price();
        let upside_profit = upside_value - costs.all_inclusive;

        let min_comp_price = comps.min_price();
        let min_profit = min_comp_price - costs.all_inclusive;

        let shown = comps.display();

        Valuation {
            best_offer_price,
            best_offer_comparables: shown.clone(),
            build_up_cost: costs.build_up,
            financing_cost: costs.financing,
            all_inclusive_cost: costs.all_inclusive,
            upside_value,
            upside_comparables: shown,
            upside_profit,
            decision: self.decide(upside_profit),
            min_comp_price,
            min_profit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::comps::CompFilter;
    use crate::types::SoldProperty;

    fn sold(address: &str, price: f64) -> SoldProperty {
        SoldProperty {
            address: address.to_string(),
            sale_price: Some(price),
            sale_date: None,
            square_footage: None,
            bedrooms: None,
            bathrooms: None,
        }
    }

    fn engine(threshold: f64) -> DecisionEngine {
        DecisionEngine::new(CostModel::new(75.0, 0.12), threshold)
    }

    #[test]
    fn test_reference_scenario_is_yes() {
        let listing = Listing::sample();
        let comps = CompFilter::new(1_500_000.0)
            .filter(&[sold("lo", 310_000.0), sold("hi", 360_000.0)], listing.list_price)
            .unwrap();

        let v = engine(30_000.0).evaluate(&listing, &comps);

        assert_eq!(v.best_offer_price, 200_000.0);
        assert_eq!(v.build_up_cost, 75_000.0);
        assert_eq!(v.financing_cost, 33_000.0);
        assert_eq!(v.all_inclusive_cost, 308_000.0);
        assert_eq!(v.upside_value, 360_000.0);
        assert_eq!(v.upside_profit, 52_000.0);
        assert_eq!(v.min_comp_price, 310_000.0);
        assert_eq!(v.min_profit, 2_000.0);
        assert_eq!(v.decision, Decision::Yes);
        assert_eq!(v.upside_comparables, vec!["lo ($310,000)", "hi ($360,000)"]);
        assert_eq!(v.best_offer_comparables, v.upside_comparables);
    }

    #[test]
    fn test_profit_equal_to_threshold_is_no() {
        assert_eq!(engine(30_000.0).decide(30_000.0), Decision::No);
    }

    #[test]
    fn test_profit_one_cent_over_threshold_is_yes() {
        assert_eq!(engine(30_000.0).decide(30_000.01), Decision::Yes);
    }

    #[test]
    fn test_negative_profit_is_no() {
        assert_eq!(engine(0.0).decide(-1.0), Decision::No);
    }

    #[test]
    fn test_decision_uses_max_comp_not_min() {
        let listing = Listing::sample();
        // min comp would lose money, max comp clears the threshold
        let comps = CompFilter::new(1_500_000.0)
            .filter(&[sold("lo", 300_000.0), sold("hi", 345_000.0)], listing.list_price)
            .unwrap();
        let v = engine(30_000.0).evaluate(&listing, &comps);
        assert!(v.min_profit < 0.0);
        assert_eq!(v.upside_profit, 37_000.0);
        assert_eq!(v.decision, Decision::Yes);
    }
}
