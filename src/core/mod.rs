mod engine;
mod error;
mod solver;
mod types;

pub use engine::{
    compare_strategies, minimum_required_budget, simulate, simulate_with_options, validate_debt,
};
pub use error::{Result, SimulationError};
pub use solver::{
    BudgetSolveConfig, BudgetSolveIteration, BudgetSolveResult, MAX_SOLVER_ITERATIONS, solve_budget,
};
pub use types::{
    DEFAULT_MAX_MONTHS, Debt, DebtPayment, DebtPayoff, DebtType, MonthlyPlanEntry,
    SimulationOptions, SimulationResult, Strategy, StrategyComparison,
};
