//! Human-readable summaries of an already computed plan.

use std::fmt::Write as _;

use thiserror::Error;

use crate::core::{Debt, SimulationResult, Strategy};

#[derive(Error, Debug)]
pub enum NarrativeError {
    #[error("plan has no months to describe")]
    EmptyPlan,

    #[error("failed to render summary: {0}")]
    Render(#[from] std::fmt::Error),
}

/// Renders prose from a `SimulationResult`. Implementations describe the
/// numbers they are given and never recompute them.
pub trait PlanNarrator: Send + Sync {
    fn narrate(&self, debts: &[Debt], result: &SimulationResult) -> Result<String, NarrativeError>;
}

#[derive(Debug, Clone)]
pub struct TemplateNarrator {
    pub currency_symbol: String,
}

impl Default for TemplateNarrator {
    fn default() -> Self {
        Self {
            currency_symbol: "₹".to_string(),
        }
    }
}

impl TemplateNarrator {
    fn money(&self, amount: f64) -> String {
        format!("{}{:.2}", self.currency_symbol, amount)
    }
}

impl PlanNarrator for TemplateNarrator {
    fn narrate(&self, debts: &[Debt], result: &SimulationResult) -> Result<String, NarrativeError> {
        let first_month = result.monthly_plan.first().ok_or(NarrativeError::EmptyPlan)?;

        let mut out = String::new();
        let approach = match result.strategy {
            Strategy::Avalanche => "highest interest rate first (avalanche)",
            Strategy::Snowball => "smallest balance first (snowball)",
        };
        let open_debts = debts.iter().filter(|d| d.current_balance > 0.0).count();
        writeln!(
            out,
            "Paying {} a month across {} debt(s), {}, clears everything in {} month(s).",
            self.money(result.monthly_budget),
            open_debts,
            approach,
            result.estimated_payoff_time
        )?;

        if let Some(focus) = first_month
            .payments
            .iter()
            .filter(|p| p.extra > 0.0)
            .max_by(|a, b| a.extra.total_cmp(&b.extra))
        {
            writeln!(
                out,
                "Start by putting the extra {} on {}.",
                self.money(focus.extra),
                focus.name
            )?;
        }

        writeln!(
            out,
            "Total interest paid: {}.",
            self.money(result.total_interest_paid)
        )?;
        match result.baseline_payoff_time {
            Some(months) if result.total_interest_saved > 0.005 => writeln!(
                out,
                "That saves {} in interest versus paying only minimums, which would take {} month(s).",
                self.money(result.total_interest_saved),
                months
            )?,
            Some(months) => writeln!(
                out,
                "Paying only minimums would also finish in {} month(s) at about the same cost.",
                months
            )?,
            None => writeln!(
                out,
                "Paying only minimums would not clear these debts within the planning horizon."
            )?,
        }

        if !result.payoff_order.is_empty() {
            let order = result
                .payoff_order
                .iter()
                .map(|p| format!("{} (month {})", p.name, p.month))
                .collect::<Vec<_>>()
                .join(", ");
            write!(out, "Payoff order: {order}.")?;
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DebtType, simulate};
    use uuid::Uuid;

    fn debt(name: &str, balance: f64, rate: f64, minimum: f64) -> Debt {
        Debt {
            id: Uuid::new_v4(),
            name: name.to_string(),
            debt_type: DebtType::CreditCard,
            current_balance: balance,
            interest_rate: rate,
            minimum_payment: minimum,
        }
    }

    #[test]
    fn summary_mentions_focus_debt_and_order() {
        let debts = vec![
            debt("Card", 5_000.0, 24.0, 200.0),
            debt("Bike loan", 2_000.0, 12.0, 100.0),
        ];
        let result = simulate(&debts, 500.0, Strategy::Snowball).expect("valid plan");
        let text = TemplateNarrator::default()
            .narrate(&debts, &result)
            .expect("summary");

        assert!(text.contains("smallest balance first"));
        assert!(text.contains("extra ₹200.00 on Bike loan"));
        assert!(text.contains(&format!("{} month(s)", result.estimated_payoff_time)));
        assert!(text.contains("Payoff order: Bike loan"));
    }

    #[test]
    fn empty_plan_is_an_error() {
        let debts = vec![debt("Card", 100.0, 0.0, 100.0)];
        let mut result = simulate(&debts, 100.0, Strategy::Avalanche).expect("valid plan");
        result.monthly_plan.clear();
        let err = TemplateNarrator::default()
            .narrate(&debts, &result)
            .expect_err("nothing to describe");
        assert!(matches!(err, NarrativeError::EmptyPlan));
    }
}
