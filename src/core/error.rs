use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error(
        "monthly budget {budget:.2} does not cover the minimum payments; increase your monthly budget to at least {required:.2}"
    )]
    BudgetTooLow { budget: f64, required: f64 },

    #[error("debts are not paid off within {months} months; payments do not outpace interest")]
    PayoffHorizonExceeded { months: u32 },
}

impl SimulationError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        SimulationError::InvalidInput {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SimulationError::InvalidInput { .. } => "invalid-input",
            SimulationError::BudgetTooLow { .. } => "budget-too-low",
            SimulationError::PayoffHorizonExceeded { .. } => "payoff-horizon-exceeded",
        }
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;
