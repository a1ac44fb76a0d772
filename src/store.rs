//! Debt records keyed by user.
//!
//! The simulator only ever reads from a store; writes come from the CRUD
//! surface. `InMemoryDebtStore` keeps records in insertion order per user.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::core::{Debt, DebtType, SimulationError, validate_debt};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("debt {id} not found for user '{user}'")]
    NotFound { user: String, id: Uuid },

    #[error(transparent)]
    Invalid(#[from] SimulationError),

    #[error("debt store lock poisoned")]
    Poisoned,
}

impl<T> From<PoisonError<T>> for StoreError {
    fn from(_: PoisonError<T>) -> Self {
        StoreError::Poisoned
    }
}

/// Fields supplied when a debt is created; the id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDebt {
    pub name: String,
    #[serde(rename = "type", default)]
    pub debt_type: DebtType,
    pub current_balance: f64,
    pub interest_rate: f64,
    pub minimum_payment: f64,
}

impl NewDebt {
    pub fn into_debt(self, id: Uuid) -> Debt {
        Debt {
            id,
            name: self.name,
            debt_type: self.debt_type,
            current_balance: self.current_balance,
            interest_rate: self.interest_rate,
            minimum_payment: self.minimum_payment,
        }
    }
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DebtUpdate {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub debt_type: Option<DebtType>,
    pub current_balance: Option<f64>,
    pub interest_rate: Option<f64>,
    pub minimum_payment: Option<f64>,
}

impl DebtUpdate {
    fn apply(self, debt: &Debt) -> Debt {
        Debt {
            id: debt.id,
            name: self.name.unwrap_or_else(|| debt.name.clone()),
            debt_type: self.debt_type.unwrap_or(debt.debt_type),
            current_balance: self.current_balance.unwrap_or(debt.current_balance),
            interest_rate: self.interest_rate.unwrap_or(debt.interest_rate),
            minimum_payment: self.minimum_payment.unwrap_or(debt.minimum_payment),
        }
    }
}

pub trait DebtStore: Send + Sync {
    fn create(&self, user: &str, debt: NewDebt) -> Result<Debt, StoreError>;
    fn list(&self, user: &str) -> Result<Vec<Debt>, StoreError>;
    fn get(&self, user: &str, id: Uuid) -> Result<Debt, StoreError>;
    fn update(&self, user: &str, id: Uuid, update: DebtUpdate) -> Result<Debt, StoreError>;
    fn delete(&self, user: &str, id: Uuid) -> Result<Debt, StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryDebtStore {
    debts: RwLock<HashMap<String, Vec<Debt>>>,
}

impl InMemoryDebtStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn not_found(user: &str, id: Uuid) -> StoreError {
        StoreError::NotFound {
            user: user.to_string(),
            id,
        }
    }
}

impl DebtStore for InMemoryDebtStore {
    fn create(&self, user: &str, debt: NewDebt) -> Result<Debt, StoreError> {
        let debt = debt.into_debt(Uuid::new_v4());
        validate_debt(&debt)?;
        let mut guard = self.debts.write()?;
        guard.entry(user.to_string()).or_default().push(debt.clone());
        Ok(debt)
    }

    fn list(&self, user: &str) -> Result<Vec<Debt>, StoreError> {
        let guard = self.debts.read()?;
        Ok(guard.get(user).cloned().unwrap_or_default())
    }

    fn get(&self, user: &str, id: Uuid) -> Result<Debt, StoreError> {
        let guard = self.debts.read()?;
        guard
            .get(user)
            .and_then(|debts| debts.iter().find(|d| d.id == id))
            .cloned()
            .ok_or_else(|| Self::not_found(user, id))
    }

    fn update(&self, user: &str, id: Uuid, update: DebtUpdate) -> Result<Debt, StoreError> {
        let mut guard = self.debts.write()?;
        let slot = guard
            .get_mut(user)
            .and_then(|debts| debts.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| Self::not_found(user, id))?;
        let updated = update.apply(slot);
        validate_debt(&updated)?;
        *slot = updated.clone();
        Ok(updated)
    }

    fn delete(&self, user: &str, id: Uuid) -> Result<Debt, StoreError> {
        let mut guard = self.debts.write()?;
        let debts = guard
            .get_mut(user)
            .ok_or_else(|| Self::not_found(user, id))?;
        let pos = debts
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| Self::not_found(user, id))?;
        Ok(debts.remove(pos))
    }
}
