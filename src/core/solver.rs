use serde::Serialize;

use super::engine::{minimum_required_budget, simulate_with_options, validate_debt};
use super::error::{Result, SimulationError};
use super::types::{Debt, SimulationOptions, Strategy};

pub const MAX_SOLVER_ITERATIONS: u32 = 200;

#[derive(Debug, Clone, Copy)]
pub struct BudgetSolveConfig {
    pub strategy: Strategy,
    pub target_months: u32,
    pub tolerance: f64,
    pub max_iterations: u32,
    pub options: SimulationOptions,
}

impl BudgetSolveConfig {
    pub fn new(strategy: Strategy, target_months: u32) -> Self {
        Self {
            strategy,
            target_months,
            tolerance: 0.5,
            max_iterations: 48,
            options: SimulationOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSolveIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_budget: f64,
    pub payoff_months: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSolveResult {
    pub strategy: Strategy,
    pub target_months: u32,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub solved_budget: Option<f64>,
    pub achieved_months: Option<u32>,
    pub achieved_interest_paid: Option<f64>,
    pub iterations: Vec<BudgetSolveIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

/// Finds the smallest monthly budget whose plan clears every debt within
/// `target_months`, by bisection between the sum of minimums and the budget
/// that clears everything in the first month.
pub fn solve_budget(debts: &[Debt], config: BudgetSolveConfig) -> Result<BudgetSolveResult> {
    validate_config(debts, config)?;

    let search_min = minimum_required_budget(debts);
    let clear_in_one_month: f64 = debts
        .iter()
        .filter(|d| d.current_balance > 0.0)
        .map(|d| d.current_balance * (1.0 + d.monthly_rate()))
        .sum();
    let search_max = clear_in_one_month.max(search_min);

    let mut iterations = Vec::with_capacity(config.max_iterations as usize);
    let mut solved_budget = None;
    let mut converged = false;
    let feasible;
    let message;

    if meets_target(debts, config, search_min)?.is_some() {
        solved_budget = Some(search_min);
        converged = true;
        feasible = true;
        message = "Minimum payments already meet the target.".to_string();
    } else if meets_target(debts, config, search_max)?.is_none() {
        feasible = false;
        message = "No budget within the search bounds meets the target.".to_string();
    } else {
        let mut lo = search_min;
        let mut hi = search_max;
        let mut it = 0;
        while it < config.max_iterations {
            it += 1;
            let mid = (lo + hi) * 0.5;
            // No representable value left between the bounds.
            if mid <= lo || mid >= hi {
                converged = true;
                break;
            }
            let months = meets_target(debts, config, mid)?;
            iterations.push(BudgetSolveIteration {
                iteration: it,
                lower_bound: lo,
                upper_bound: hi,
                candidate_budget: mid,
                payoff_months: months,
            });

            if months.is_some() {
                hi = mid;
            } else {
                lo = mid;
            }

            if (hi - lo).abs() <= config.tolerance {
                converged = true;
                break;
            }
        }
        solved_budget = Some(hi);
        feasible = true;
        message = if converged {
            "Solved minimum monthly budget.".to_string()
        } else {
            "Reached max iterations before tolerance was met; returning best estimate.".to_string()
        };
    }

    let mut achieved_months = None;
    let mut achieved_interest_paid = None;
    if let Some(budget) = solved_budget {
        let plan = simulate_with_options(debts, budget, config.strategy, config.options)?;
        achieved_months = Some(plan.estimated_payoff_time);
        achieved_interest_paid = Some(plan.total_interest_paid);
    }

    Ok(BudgetSolveResult {
        strategy: config.strategy,
        target_months: config.target_months,
        search_min,
        search_max,
        tolerance: config.tolerance,
        solved_budget,
        achieved_months,
        achieved_interest_paid,
        iterations,
        converged,
        feasible,
        message,
    })
}

/// `Some(months)` when the candidate budget pays everything off in time.
fn meets_target(debts: &[Debt], config: BudgetSolveConfig, budget: f64) -> Result<Option<u32>> {
    match simulate_with_options(debts, budget, config.strategy, config.options) {
        Ok(plan) if plan.estimated_payoff_time <= config.target_months => {
            Ok(Some(plan.estimated_payoff_time))
        }
        Ok(_)
        | Err(SimulationError::BudgetTooLow { .. })
        | Err(SimulationError::PayoffHorizonExceeded { .. }) => Ok(None),
        Err(err) => Err(err),
    }
}

fn validate_config(debts: &[Debt], config: BudgetSolveConfig) -> Result<()> {
    if config.target_months == 0 {
        return Err(SimulationError::invalid("target_months must be > 0"));
    }
    if config.target_months > config.options.max_months {
        return Err(SimulationError::invalid(
            "target_months must be <= max_months",
        ));
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(SimulationError::invalid("tolerance must be > 0"));
    }
    if config.max_iterations == 0 || config.max_iterations > MAX_SOLVER_ITERATIONS {
        return Err(SimulationError::invalid(format!(
            "max_iterations must be between 1 and {MAX_SOLVER_ITERATIONS}"
        )));
    }
    for debt in debts {
        validate_debt(debt)?;
    }
    if !debts.iter().any(|d| d.current_balance > 0.0) {
        return Err(SimulationError::invalid(
            "no debts with an outstanding balance",
        ));
    }
    Ok(())
}
