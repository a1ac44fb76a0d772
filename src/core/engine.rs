use tracing::debug;

use super::error::{Result, SimulationError};
use super::types::{
    Debt, DebtPayment, DebtPayoff, MonthlyPlanEntry, SimulationOptions, SimulationResult, Strategy,
    StrategyComparison,
};

// Budget slack tolerated when comparing against the sum of minimums.
const BUDGET_EPS: f64 = 1e-9;
// Residual balances below this are floating-point noise, not debt.
const BALANCE_EPS: f64 = 1e-9;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Allocation {
    Strategy(Strategy),
    MinimumOnly,
}

#[derive(Debug)]
struct ScheduleRun {
    plan: Vec<MonthlyPlanEntry>,
    total_interest: f64,
    payoff_order: Vec<DebtPayoff>,
    converged: bool,
}

#[derive(Debug, Clone, Copy)]
struct PaymentSlot {
    index: usize,
    opening: f64,
    interest: f64,
    minimum: f64,
    extra: f64,
}

pub fn simulate(debts: &[Debt], monthly_budget: f64, strategy: Strategy) -> Result<SimulationResult> {
    simulate_with_options(debts, monthly_budget, strategy, SimulationOptions::default())
}

pub fn simulate_with_options(
    debts: &[Debt],
    monthly_budget: f64,
    strategy: Strategy,
    options: SimulationOptions,
) -> Result<SimulationResult> {
    let active = prepare_debts(debts, monthly_budget, options)?;

    let run = run_schedule(
        &active,
        monthly_budget,
        Allocation::Strategy(strategy),
        options.max_months,
    );
    if !run.converged {
        return Err(SimulationError::PayoffHorizonExceeded {
            months: options.max_months,
        });
    }

    let baseline = run_schedule(
        &active,
        monthly_budget,
        Allocation::MinimumOnly,
        options.max_months,
    );
    let baseline_payoff_time = baseline.converged.then_some(baseline.plan.len() as u32);

    debug!(
        debts = active.len(),
        strategy = strategy.as_str(),
        months = run.plan.len(),
        baseline_months = ?baseline_payoff_time,
        "simulated payoff plan"
    );

    Ok(SimulationResult {
        strategy,
        monthly_budget,
        estimated_payoff_time: run.plan.len() as u32,
        total_interest_paid: run.total_interest,
        baseline_interest_paid: baseline.total_interest,
        baseline_payoff_time,
        total_interest_saved: baseline.total_interest - run.total_interest,
        payoff_order: run.payoff_order,
        monthly_plan: run.plan,
    })
}

/// Runs both strategies over the same input and recommends the one that pays
/// less interest, then the one that finishes sooner, then avalanche.
pub fn compare_strategies(
    debts: &[Debt],
    monthly_budget: f64,
    options: SimulationOptions,
) -> Result<StrategyComparison> {
    let avalanche = simulate_with_options(debts, monthly_budget, Strategy::Avalanche, options)?;
    let snowball = simulate_with_options(debts, monthly_budget, Strategy::Snowball, options)?;

    let interest_gap = snowball.total_interest_paid - avalanche.total_interest_paid;
    let recommended = if interest_gap.abs() > 1e-6 {
        if interest_gap > 0.0 {
            Strategy::Avalanche
        } else {
            Strategy::Snowball
        }
    } else if snowball.estimated_payoff_time < avalanche.estimated_payoff_time {
        Strategy::Snowball
    } else {
        Strategy::Avalanche
    };

    Ok(StrategyComparison {
        avalanche,
        snowball,
        recommended,
    })
}

/// Sum of minimum payments over debts that still carry a balance.
pub fn minimum_required_budget(debts: &[Debt]) -> f64 {
    debts
        .iter()
        .filter(|d| d.current_balance > 0.0)
        .map(|d| d.minimum_payment)
        .sum()
}

pub fn validate_debt(debt: &Debt) -> Result<()> {
    for (field, value) in [
        ("currentBalance", debt.current_balance),
        ("interestRate", debt.interest_rate),
        ("minimumPayment", debt.minimum_payment),
    ] {
        if !value.is_finite() {
            return Err(SimulationError::invalid(format!(
                "debt '{}': {field} must be finite",
                debt.name
            )));
        }
        if value < 0.0 {
            return Err(SimulationError::invalid(format!(
                "debt '{}': {field} must be >= 0",
                debt.name
            )));
        }
    }
    Ok(())
}

fn prepare_debts<'a>(
    debts: &'a [Debt],
    monthly_budget: f64,
    options: SimulationOptions,
) -> Result<Vec<&'a Debt>> {
    if options.max_months == 0 {
        return Err(SimulationError::invalid("max_months must be > 0"));
    }
    if !monthly_budget.is_finite() || monthly_budget < 0.0 {
        return Err(SimulationError::invalid(
            "monthlyBudget must be finite and >= 0",
        ));
    }
    for debt in debts {
        validate_debt(debt)?;
    }

    let active: Vec<&Debt> = debts.iter().filter(|d| d.current_balance > 0.0).collect();
    if active.is_empty() {
        return Err(SimulationError::invalid(
            "no debts with an outstanding balance",
        ));
    }

    let required: f64 = active.iter().map(|d| d.minimum_payment).sum();
    if monthly_budget + BUDGET_EPS < required {
        return Err(SimulationError::BudgetTooLow {
            budget: monthly_budget,
            required,
        });
    }

    Ok(active)
}

fn run_schedule(
    debts: &[&Debt],
    monthly_budget: f64,
    allocation: Allocation,
    max_months: u32,
) -> ScheduleRun {
    let mut balances: Vec<f64> = debts.iter().map(|d| d.current_balance).collect();
    let mut plan = Vec::new();
    let mut payoff_order = Vec::new();
    let mut total_interest = 0.0;

    for month in 1..=max_months {
        let mut slots = Vec::with_capacity(debts.len());
        for (i, balance) in balances.iter_mut().enumerate() {
            if *balance <= 0.0 {
                continue;
            }
            let interest = *balance * debts[i].monthly_rate();
            *balance += interest;
            slots.push(PaymentSlot {
                index: i,
                opening: *balance,
                interest,
                minimum: 0.0,
                extra: 0.0,
            });
        }

        let mut pool = monthly_budget;
        for slot in &mut slots {
            let pay = debts[slot.index].minimum_payment.min(balances[slot.index]);
            balances[slot.index] -= pay;
            slot.minimum = pay;
            pool -= pay;
        }

        // Debts cleared in the same month are reported in this order too.
        let ranking = match allocation {
            Allocation::Strategy(strategy) => priority_order(strategy, &slots, debts),
            Allocation::MinimumOnly => (0..slots.len()).collect(),
        };

        if let Allocation::Strategy(_) = allocation {
            for &pos in &ranking {
                if pool <= 0.0 {
                    break;
                }
                let slot = &mut slots[pos];
                let pay = pool.min(balances[slot.index]);
                if pay <= 0.0 {
                    continue;
                }
                balances[slot.index] -= pay;
                slot.extra += pay;
                pool -= pay;
            }
        }

        for &pos in &ranking {
            let index = slots[pos].index;
            if balances[index] < BALANCE_EPS {
                balances[index] = 0.0;
                payoff_order.push(DebtPayoff {
                    debt_id: debts[index].id,
                    name: debts[index].name.clone(),
                    month,
                });
            }
        }

        let mut payments = Vec::with_capacity(slots.len());
        let mut month_interest = 0.0;
        let mut month_paid = 0.0;
        for slot in &slots {
            let debt = debts[slot.index];
            let amount = slot.minimum + slot.extra;
            month_interest += slot.interest;
            month_paid += amount;
            payments.push(DebtPayment {
                debt_id: debt.id,
                name: debt.name.clone(),
                interest: slot.interest,
                minimum: slot.minimum,
                extra: slot.extra,
                amount,
                balance_after: balances[slot.index],
            });
        }
        total_interest += month_interest;

        let remaining_balance: f64 = balances.iter().sum();
        plan.push(MonthlyPlanEntry {
            month,
            payments,
            total_paid: month_paid,
            total_interest: month_interest,
            remaining_balance,
        });

        if balances.iter().all(|&b| b == 0.0) {
            return ScheduleRun {
                plan,
                total_interest,
                payoff_order,
                converged: true,
            };
        }
    }

    ScheduleRun {
        plan,
        total_interest,
        payoff_order,
        converged: false,
    }
}

/// Positions into `slots`, highest priority first. Balances compared are the
/// post-interest balances before any payment that month.
fn priority_order(strategy: Strategy, slots: &[PaymentSlot], debts: &[&Debt]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..slots.len()).collect();
    order.sort_by(|&a, &b| {
        let (sa, sb) = (&slots[a], &slots[b]);
        let (ra, rb) = (debts[sa.index].interest_rate, debts[sb.index].interest_rate);
        let primary = match strategy {
            Strategy::Avalanche => rb
                .total_cmp(&ra)
                .then_with(|| sb.opening.total_cmp(&sa.opening)),
            Strategy::Snowball => sa
                .opening
                .total_cmp(&sb.opening)
                .then_with(|| rb.total_cmp(&ra)),
        };
        primary.then_with(|| sa.index.cmp(&sb.index))
    });
    order
}
