//! Cost, revenue and milestone math.
//!
//! Everything here is a pure function of definitions, owned counts and a
//! [`Bonuses`] aggregate. Costs follow a geometric curve and are floored to
//! whole energy; revenue doubles at each milestone threshold. The buy
//! planner sums the exact per-step costs, never a closed form, so it agrees
//! with single purchases to the last unit.

use crate::bonus::Bonuses;
use crate::registry::GeneratorDef;
use crate::state::BuyQuantity;

/// Upper bound on greedy buy-planner iterations.
const MAX_BUY_SEARCH_STEPS: u32 = 1_000;

// ---------------------------------------------------------------------------
// Cost curve
// ---------------------------------------------------------------------------

/// Cost of the next unit of a generator when `owned` are already held.
///
/// The geometric price is floored to whole energy before the discount is
/// applied, then floored again, with 1 as the lower bound. Overflow of the
/// geometric term saturates to `f64::MAX`, which no balance can meet.
pub fn generator_cost(def: &GeneratorDef, owned: u32, bonuses: &Bonuses) -> f64 {
    let raw = (def.base_cost * def.cost_scaling.powi(owned as i32)).floor();
    if !raw.is_finite() {
        return f64::MAX;
    }
    (raw * bonuses.cost_factor()).floor().max(1.0)
}

// ---------------------------------------------------------------------------
// Milestones
// ---------------------------------------------------------------------------

/// An upcoming milestone for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Milestone {
    pub threshold: u32,
    pub multiplier: f64,
}

/// Combined doubling from every milestone threshold at or below `owned`.
pub fn milestone_multiplier(owned: u32, thresholds: &[u32]) -> f64 {
    let reached = thresholds.iter().filter(|t| owned >= **t).count();
    2.0f64.powi(reached as i32)
}

/// The first milestone strictly above `owned`, if any remain.
pub fn next_milestone(owned: u32, thresholds: &[u32]) -> Option<Milestone> {
    thresholds
        .iter()
        .find(|t| **t > owned)
        .map(|t| Milestone {
            threshold: *t,
            multiplier: 2.0,
        })
}

// ---------------------------------------------------------------------------
// Revenue
// ---------------------------------------------------------------------------

/// Energy credited by one completed cycle of a generator.
pub fn generator_revenue(
    def: &GeneratorDef,
    owned: u32,
    thresholds: &[u32],
    bonuses: &Bonuses,
) -> f64 {
    if owned == 0 {
        return 0.0;
    }
    def.base_revenue
        * f64::from(owned)
        * milestone_multiplier(owned, thresholds)
        * bonuses.output_multiplier
        * bonuses.global_multiplier
}

/// Seconds one cycle takes under the current bonuses.
pub fn effective_cycle_time(def: &GeneratorDef, bonuses: &Bonuses) -> f64 {
    def.cycle_time * bonuses.cycle_time_multiplier
}

// ---------------------------------------------------------------------------
// Buy planning
// ---------------------------------------------------------------------------

/// A planned purchase: how many units and what they cost in total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuyAmount {
    pub count: u32,
    pub total_cost: f64,
}

impl BuyAmount {
    pub fn zero() -> Self {
        BuyAmount {
            count: 0,
            total_cost: 0.0,
        }
    }
}

/// The largest affordable purchase starting from `owned`, capped at
/// [`MAX_BUY_SEARCH_STEPS`] units.
pub fn max_affordable(def: &GeneratorDef, owned: u32, balance: f64, bonuses: &Bonuses) -> BuyAmount {
    let mut count = 0;
    let mut total = 0.0;
    while count < MAX_BUY_SEARCH_STEPS {
        let cost = generator_cost(def, owned + count, bonuses);
        if total + cost > balance {
            break;
        }
        total += cost;
        count += 1;
    }
    BuyAmount {
        count,
        total_cost: total,
    }
}

/// Plan a purchase at the requested quantity.
///
/// Fixed quantities are atomic: if the full batch is unaffordable the plan
/// is zero, never a partial fill. `Max` buys whatever fits.
pub fn buy_amount(
    def: &GeneratorDef,
    owned: u32,
    balance: f64,
    quantity: BuyQuantity,
    bonuses: &Bonuses,
) -> BuyAmount {
    let Some(requested) = quantity.count() else {
        return max_affordable(def, owned, balance, bonuses);
    };
    let mut total = 0.0;
    for step in 0..requested {
        total += generator_cost(def, owned + step, bonuses);
    }
    if total > balance {
        BuyAmount::zero()
    } else {
        BuyAmount {
            count: requested,
            total_cost: total,
        }
    }
}

// ---------------------------------------------------------------------------
// Display formatting
// ---------------------------------------------------------------------------

/// Compact suffix formatting for energy amounts.
pub fn format_energy(amount: f64) -> String {
    let amount = amount.max(0.0);
    if amount < 1_000.0 {
        if amount < 10.0 {
            format!("{amount:.1}")
        } else {
            format!("{}", amount.floor() as u64)
        }
    } else if amount < 1_000_000.0 {
        format!("{:.1}K", amount / 1_000.0)
    } else if amount < 1_000_000_000.0 {
        format!("{:.2}M", amount / 1_000_000.0)
    } else if amount < 1_000_000_000_000.0 {
        format!("{:.2}B", amount / 1_000_000_000.0)
    } else {
        format!("{:.2}T", amount / 1_000_000_000_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DEFAULT_MILESTONES;
    use crate::test_utils::*;

    fn solar() -> GeneratorDef {
        generator_def("solar_panel", 4.0, 1.07, 1.0, 0.6)
    }

    // -----------------------------------------------------------------------
    // Costs
    // -----------------------------------------------------------------------

    #[test]
    fn cost_follows_geometric_curve_with_floors() {
        let b = Bonuses::default();
        assert_eq!(generator_cost(&solar(), 0, &b), 4.0);
        // 4 * 1.07 = 4.28, floored.
        assert_eq!(generator_cost(&solar(), 1, &b), 4.0);
        // 4 * 1.07^10 = 7.868..., floored.
        assert_eq!(generator_cost(&solar(), 10, &b), 7.0);
    }

    #[test]
    fn cost_reduction_discounts_after_first_floor() {
        let b = Bonuses {
            cost_reduction: 0.30,
            ..Bonuses::default()
        };
        // floor(7 * 0.7) = 4.
        assert_eq!(generator_cost(&solar(), 10, &b), 4.0);
    }

    #[test]
    fn cost_never_drops_below_one() {
        let b = Bonuses {
            cost_reduction: 0.9,
            ..Bonuses::default()
        };
        let cheap = generator_def("g", 1.0, 1.05, 1.0, 1.0);
        assert_eq!(generator_cost(&cheap, 0, &b), 1.0);
    }

    #[test]
    fn overflowing_cost_is_unaffordable() {
        let b = Bonuses::default();
        let def = generator_def("g", 1e300, 10.0, 1.0, 1.0);
        assert_eq!(generator_cost(&def, 100, &b), f64::MAX);
    }

    // -----------------------------------------------------------------------
    // Milestones
    // -----------------------------------------------------------------------

    #[test]
    fn milestones_double_cumulatively() {
        let t = &DEFAULT_MILESTONES;
        assert_eq!(milestone_multiplier(0, t), 1.0);
        assert_eq!(milestone_multiplier(24, t), 1.0);
        assert_eq!(milestone_multiplier(25, t), 2.0);
        assert_eq!(milestone_multiplier(99, t), 4.0);
        assert_eq!(milestone_multiplier(100, t), 8.0);
        assert_eq!(milestone_multiplier(400, t), 64.0);
        assert_eq!(milestone_multiplier(10_000, t), 64.0);
    }

    #[test]
    fn next_milestone_reports_first_unreached() {
        let t = &DEFAULT_MILESTONES;
        assert_eq!(
            next_milestone(0, t),
            Some(Milestone {
                threshold: 25,
                multiplier: 2.0
            })
        );
        assert_eq!(next_milestone(25, t).map(|m| m.threshold), Some(50));
        assert_eq!(next_milestone(400, t), None);
    }

    // -----------------------------------------------------------------------
    // Revenue
    // -----------------------------------------------------------------------

    #[test]
    fn revenue_scales_with_owned_and_milestones() {
        let b = Bonuses::default();
        let t = &DEFAULT_MILESTONES;
        assert_eq!(generator_revenue(&solar(), 0, t, &b), 0.0);
        assert_eq!(generator_revenue(&solar(), 1, t, &b), 1.0);
        assert_eq!(generator_revenue(&solar(), 10, t, &b), 10.0);
        // 25 owned crosses the first milestone.
        assert_eq!(generator_revenue(&solar(), 25, t, &b), 50.0);
    }

    #[test]
    fn revenue_applies_output_and_global_multipliers() {
        let b = Bonuses {
            output_multiplier: 2.0,
            global_multiplier: 1.5,
            ..Bonuses::default()
        };
        let t = &DEFAULT_MILESTONES;
        assert_eq!(generator_revenue(&solar(), 1, t, &b), 3.0);
    }

    #[test]
    fn cycle_time_scales_by_multiplier() {
        let b = Bonuses {
            cycle_time_multiplier: 0.5,
            ..Bonuses::default()
        };
        assert!((effective_cycle_time(&solar(), &b) - 0.3).abs() < 1e-12);
    }

    // -----------------------------------------------------------------------
    // Buy planning
    // -----------------------------------------------------------------------

    #[test]
    fn max_affordable_buys_until_balance_runs_out() {
        let b = Bonuses::default();
        // Costs from 0 owned: 4, 4, 4, 4, 5, 5, ...
        let plan = max_affordable(&solar(), 0, 16.0, &b);
        assert_eq!(plan.count, 4);
        assert_eq!(plan.total_cost, 16.0);

        let plan = max_affordable(&solar(), 0, 3.0, &b);
        assert_eq!(plan, BuyAmount::zero());
    }

    #[test]
    fn fixed_quantity_is_atomic() {
        let b = Bonuses::default();
        let plan = buy_amount(&solar(), 0, 16.0, BuyQuantity::Ten, &b);
        assert_eq!(plan, BuyAmount::zero());

        let plan = buy_amount(&solar(), 0, 16.0, BuyQuantity::One, &b);
        assert_eq!(plan.count, 1);
        assert_eq!(plan.total_cost, 4.0);
    }

    #[test]
    fn fixed_quantity_sums_stepped_costs() {
        let b = Bonuses::default();
        let plan = buy_amount(&solar(), 0, 1e9, BuyQuantity::Ten, &b);
        assert_eq!(plan.count, 10);
        let expected: f64 = (0..10).map(|i| generator_cost(&solar(), i, &b)).sum();
        assert_eq!(plan.total_cost, expected);
    }

    #[test]
    fn max_quantity_delegates_to_max_affordable() {
        let b = Bonuses::default();
        let a = buy_amount(&solar(), 3, 250.0, BuyQuantity::Max, &b);
        let m = max_affordable(&solar(), 3, 250.0, &b);
        assert_eq!(a, m);
    }

    #[test]
    fn max_affordable_stops_at_search_cap() {
        let b = Bonuses::default();
        let free = generator_def("g", 1.0, 1.0, 1.0, 1.0);
        let plan = max_affordable(&free, 0, 1e12, &b);
        assert_eq!(plan.count, MAX_BUY_SEARCH_STEPS);
    }

    // -----------------------------------------------------------------------
    // Formatting
    // -----------------------------------------------------------------------

    #[test]
    fn formats_small_amounts_with_decimals() {
        assert_eq!(format_energy(0.0), "0.0");
        assert_eq!(format_energy(4.25), "4.2");
        assert_eq!(format_energy(17.9), "17");
        assert_eq!(format_energy(999.0), "999");
    }

    #[test]
    fn formats_large_amounts_with_suffixes() {
        assert_eq!(format_energy(1_000.0), "1.0K");
        assert_eq!(format_energy(1_500.0), "1.5K");
        assert_eq!(format_energy(2_340_000.0), "2.34M");
        assert_eq!(format_energy(7_000_000_000.0), "7.00B");
        assert_eq!(format_energy(1.23e12), "1.23T");
    }

    #[test]
    fn negative_amounts_clamp_to_zero() {
        assert_eq!(format_energy(-5.0), "0.0");
    }
}
