use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Fixed,
    Dynamic,
    Percentage,
}

/// How the dynamic strategy treats its base withdrawal after an adjustment.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DynamicBase {
    /// Adjustments scale only the withdrawal taken that year.
    #[default]
    Reset,
    /// The adjusted withdrawal becomes next year's base.
    Carry,
}

/// Portfolio weights as fractions of 1. Nothing forces them to sum to 1.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Allocation {
    pub cash: f64,
    pub safe: f64,
    pub risky: f64,
}

impl Allocation {
    pub fn total(self) -> f64 {
        self.cash + self.safe + self.risky
    }

    pub fn is_complete(self) -> bool {
        (self.total() - 1.0).abs() <= 1e-9
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParameters {
    pub initial_balance: f64,
    pub annual_withdrawal: f64,
    pub horizon_years: u32,
    pub allocation: Allocation,
    pub safe_growth_rate: f64,
    pub inflation_rate: f64,
    pub dynamic_adjustment_rate: f64,
    pub strategy: Strategy,
    pub dynamic_base: DynamicBase,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRecord {
    pub year: u32,
    pub balance: f64,
    pub withdrawal: f64,
    pub market_return: f64,
    pub portfolio_return: f64,
    pub cumulative_withdrawal: f64,
}

impl YearRecord {
    pub(crate) fn opening(initial_balance: f64) -> Self {
        Self {
            year: 0,
            balance: initial_balance,
            withdrawal: 0.0,
            market_return: 0.0,
            portfolio_return: 0.0,
            cumulative_withdrawal: 0.0,
        }
    }
}
