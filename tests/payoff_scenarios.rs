use finsaathi::core::{
    BudgetSolveConfig, Debt, DebtType, SimulationError, SimulationOptions, Strategy,
    compare_strategies, minimum_required_budget, simulate, solve_budget,
};
use finsaathi::narrative::{PlanNarrator, TemplateNarrator};
use finsaathi::store::{DebtStore, InMemoryDebtStore, NewDebt};
use uuid::Uuid;

fn debt(name: &str, debt_type: DebtType, balance: f64, rate: f64, minimum: f64) -> Debt {
    Debt {
        id: Uuid::new_v4(),
        name: name.to_string(),
        debt_type,
        current_balance: balance,
        interest_rate: rate,
        minimum_payment: minimum,
    }
}

fn household() -> Vec<Debt> {
    vec![
        debt("Credit card", DebtType::CreditCard, 85_000.0, 36.0, 4_250.0),
        debt("Car loan", DebtType::AutoLoan, 320_000.0, 9.5, 8_100.0),
        debt("Education loan", DebtType::StudentLoan, 150_000.0, 11.0, 2_500.0),
        debt("Phone EMI", DebtType::Other, 18_000.0, 14.0, 1_600.0),
    ]
}

#[test]
fn household_plan_balances_its_books() {
    let debts = household();
    let budget = minimum_required_budget(&debts) + 10_000.0;

    for strategy in [Strategy::Avalanche, Strategy::Snowball] {
        let result = simulate(&debts, budget, strategy).expect("plan converges");
        let principal: f64 = debts.iter().map(|d| d.current_balance).sum();
        let paid = result.total_paid();
        assert!(
            (paid - principal - result.total_interest_paid).abs() < 1e-4,
            "{strategy:?}: paid {paid}"
        );
        assert_eq!(result.estimated_payoff_time as usize, result.monthly_plan.len());
        assert!(result.total_interest_saved > 0.0);
        assert_eq!(result.payoff_order.len(), debts.len());
        assert!(
            result
                .monthly_plan
                .windows(2)
                .all(|w| w[0].remaining_balance >= w[1].remaining_balance)
        );
    }
}

#[test]
fn snowball_clears_the_phone_emi_first_and_avalanche_the_card() {
    let debts = household();
    let budget = minimum_required_budget(&debts) + 10_000.0;

    let snowball = simulate(&debts, budget, Strategy::Snowball).expect("plan converges");
    assert_eq!(snowball.payoff_order[0].name, "Phone EMI");

    let avalanche = simulate(&debts, budget, Strategy::Avalanche).expect("plan converges");
    let first_month = &avalanche.monthly_plan[0];
    let card = first_month
        .payments
        .iter()
        .find(|p| p.name == "Credit card")
        .expect("card payment");
    assert!((card.extra - 10_000.0).abs() < 1e-9);
}

#[test]
fn comparison_and_solver_agree_with_direct_simulation() {
    let debts = household();
    let budget = minimum_required_budget(&debts) + 5_000.0;
    let comparison =
        compare_strategies(&debts, budget, SimulationOptions::default()).expect("plans converge");
    assert_eq!(comparison.recommended, Strategy::Avalanche);
    assert_eq!(
        comparison.avalanche,
        simulate(&debts, budget, Strategy::Avalanche).expect("plan converges")
    );

    let target = comparison.avalanche.estimated_payoff_time / 2;
    let solved = solve_budget(&debts, BudgetSolveConfig::new(Strategy::Avalanche, target))
        .expect("solver runs");
    assert!(solved.feasible);
    let solved_budget = solved.solved_budget.expect("budget");
    assert!(solved_budget > budget);
    assert!(solved.achieved_months.expect("months") <= target);
}

#[test]
fn stored_debts_feed_the_simulator_and_summary() {
    let store = InMemoryDebtStore::new();
    for (name, balance, rate, minimum) in [
        ("Card", 5_000.0, 24.0, 200.0),
        ("Loan", 2_000.0, 12.0, 100.0),
    ] {
        store
            .create(
                "meera",
                NewDebt {
                    name: name.to_string(),
                    debt_type: DebtType::Other,
                    current_balance: balance,
                    interest_rate: rate,
                    minimum_payment: minimum,
                },
            )
            .expect("stored");
    }

    let debts = store.list("meera").expect("listed");
    let err = simulate(&debts, 299.0, Strategy::Snowball).expect_err("below minimums");
    assert_eq!(
        err,
        SimulationError::BudgetTooLow {
            budget: 299.0,
            required: 300.0
        }
    );

    let result = simulate(&debts, 500.0, Strategy::Snowball).expect("plan converges");
    let summary = TemplateNarrator::default()
        .narrate(&debts, &result)
        .expect("summary");
    assert!(summary.contains("Loan"));
    assert!(summary.contains(&format!("{} month(s)", result.estimated_payoff_time)));
}
