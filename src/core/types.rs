use serde::{Deserialize, Deserializer, Serialize, de};
use uuid::Uuid;

pub const DEFAULT_MAX_MONTHS: u32 = 600;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DebtType {
    #[serde(alias = "creditCard", alias = "credit_card")]
    CreditCard,
    #[serde(alias = "personalLoan", alias = "personal_loan")]
    PersonalLoan,
    #[serde(alias = "autoLoan", alias = "auto_loan")]
    AutoLoan,
    #[serde(alias = "homeLoan", alias = "home_loan")]
    HomeLoan,
    #[serde(alias = "studentLoan", alias = "student_loan")]
    StudentLoan,
    #[default]
    Other,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Avalanche,
    Snowball,
}

impl Strategy {
    const NAMES: &'static [&'static str] = &["avalanche", "snowball"];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Avalanche => "avalanche",
            Strategy::Snowball => "snowball",
        }
    }
}

// Names are matched without regard to ASCII case; output is always lowercase.
impl<'de> Deserialize<'de> for Strategy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        if name.eq_ignore_ascii_case("avalanche") {
            Ok(Strategy::Avalanche)
        } else if name.eq_ignore_ascii_case("snowball") {
            Ok(Strategy::Snowball)
        } else {
            Err(de::Error::unknown_variant(&name, Strategy::NAMES))
        }
    }
}

/// A liability as the simulator sees it. Rates are annual percentages, so
/// `14.5` means 14.5% a year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type", default)]
    pub debt_type: DebtType,
    pub current_balance: f64,
    pub interest_rate: f64,
    pub minimum_payment: f64,
}

impl Debt {
    pub fn monthly_rate(&self) -> f64 {
        self.interest_rate / 12.0 / 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationOptions {
    pub max_months: u32,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            max_months: DEFAULT_MAX_MONTHS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtPayment {
    pub debt_id: Uuid,
    pub name: String,
    pub interest: f64,
    pub minimum: f64,
    pub extra: f64,
    pub amount: f64,
    pub balance_after: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPlanEntry {
    pub month: u32,
    pub payments: Vec<DebtPayment>,
    pub total_paid: f64,
    pub total_interest: f64,
    pub remaining_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtPayoff {
    pub debt_id: Uuid,
    pub name: String,
    pub month: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub strategy: Strategy,
    pub monthly_budget: f64,
    pub monthly_plan: Vec<MonthlyPlanEntry>,
    pub estimated_payoff_time: u32,
    pub total_interest_paid: f64,
    pub baseline_interest_paid: f64,
    pub baseline_payoff_time: Option<u32>,
    pub total_interest_saved: f64,
    pub payoff_order: Vec<DebtPayoff>,
}

impl SimulationResult {
    pub fn total_paid(&self) -> f64 {
        self.monthly_plan.iter().map(|m| m.total_paid).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyComparison {
    pub avalanche: SimulationResult,
    pub snowball: SimulationResult,
    pub recommended: Strategy,
}

impl StrategyComparison {
    pub fn recommended_result(&self) -> &SimulationResult {
        match self.recommended {
            Strategy::Avalanche => &self.avalanche,
            Strategy::Snowball => &self.snowball,
        }
    }
}
