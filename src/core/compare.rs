use serde::Serialize;

use super::engine::simulate_with_returns;
use super::returns::ReturnSequence;
use super::types::{Allocation, SimulationParameters, Strategy, YearRecord};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
    Aggressive,
    Balanced,
    Conservative,
}

impl RiskProfile {
    pub fn classify(allocation: Allocation) -> Self {
        if allocation.risky > 0.60 {
            RiskProfile::Aggressive
        } else if allocation.risky > 0.40 {
            RiskProfile::Balanced
        } else {
            RiskProfile::Conservative
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskProfile::Aggressive => "aggressive",
            RiskProfile::Balanced => "balanced",
            RiskProfile::Conservative => "conservative",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationBreakdown {
    pub cash: f64,
    pub safe: f64,
    pub risky: f64,
}

impl AllocationBreakdown {
    pub fn from_params(params: &SimulationParameters) -> Self {
        Self {
            cash: params.initial_balance * params.allocation.cash,
            safe: params.initial_balance * params.allocation.safe,
            risky: params.initial_balance * params.allocation.risky,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonPoint {
    pub year: u32,
    pub fixed: f64,
    pub dynamic: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategySummary {
    pub strategy: Strategy,
    pub final_year: u32,
    pub end_balance: f64,
    pub total_withdrawn: f64,
    pub depleted: bool,
}

impl StrategySummary {
    fn from_records(strategy: Strategy, records: &[YearRecord]) -> Self {
        match records.last() {
            Some(last) => Self {
                strategy,
                final_year: last.year,
                end_balance: last.balance,
                total_withdrawn: last.cumulative_withdrawal,
                depleted: last.year > 0 && last.balance <= 0.0,
            },
            None => Self {
                strategy,
                final_year: 0,
                end_balance: 0.0,
                total_withdrawn: 0.0,
                depleted: false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    pub fixed: StrategySummary,
    pub dynamic: StrategySummary,
    pub difference: f64,
    pub difference_pct_of_initial: f64,
}

/// Fixed and dynamic trajectories computed over the same return sequence.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub fixed: Vec<YearRecord>,
    pub dynamic: Vec<YearRecord>,
    initial_balance: f64,
}

pub fn compare(params: &SimulationParameters, returns: &ReturnSequence) -> Comparison {
    Comparison {
        fixed: simulate_with_returns(params, Strategy::Fixed, returns),
        dynamic: simulate_with_returns(params, Strategy::Dynamic, returns),
        initial_balance: params.initial_balance,
    }
}

impl Comparison {
    /// Balances of both runs paired by year. A run that ended early
    /// contributes zero for the years it did not reach.
    pub fn chart(&self) -> Vec<ComparisonPoint> {
        let years = self.fixed.len().max(self.dynamic.len());
        (0..years)
            .map(|idx| ComparisonPoint {
                year: idx as u32,
                fixed: self.fixed.get(idx).map_or(0.0, |r| r.balance),
                dynamic: self.dynamic.get(idx).map_or(0.0, |r| r.balance),
            })
            .collect()
    }

    pub fn summary(&self) -> ComparisonSummary {
        let fixed = StrategySummary::from_records(Strategy::Fixed, &self.fixed);
        let dynamic = StrategySummary::from_records(Strategy::Dynamic, &self.dynamic);
        let difference = dynamic.end_balance - fixed.end_balance;
        let difference_pct_of_initial = if self.initial_balance == 0.0 {
            0.0
        } else {
            difference / self.initial_balance * 100.0
        };

        ComparisonSummary {
            fixed,
            dynamic,
            difference,
            difference_pct_of_initial,
        }
    }
}

pub fn allocation_warning(allocation: Allocation) -> Option<String> {
    if allocation.is_complete() {
        None
    } else {
        Some(format!(
            "allocation totals {:.1}%, should equal 100%",
            allocation.total() * 100.0
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DynamicBase;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_params() -> SimulationParameters {
        SimulationParameters {
            initial_balance: 1_000_000.0,
            annual_withdrawal: 40_000.0,
            horizon_years: 30,
            allocation: Allocation {
                cash: 0.10,
                safe: 0.40,
                risky: 0.50,
            },
            safe_growth_rate: 0.04,
            inflation_rate: 0.025,
            dynamic_adjustment_rate: 0.20,
            strategy: Strategy::Fixed,
            dynamic_base: DynamicBase::Reset,
        }
    }

    #[test]
    fn summary_reports_end_balances_and_difference() {
        let comparison = compare(&sample_params(), &ReturnSequence::historical());
        let summary = comparison.summary();

        assert_eq!(summary.fixed.final_year, 30);
        assert_eq!(summary.dynamic.final_year, 30);
        assert_eq!(summary.fixed.end_balance, 3_861_778.0);
        assert_eq!(summary.dynamic.end_balance, 5_282_204.0);
        assert_approx(summary.difference, 1_420_426.0);
        assert_approx(summary.difference_pct_of_initial, 142.0426);
        assert!(!summary.fixed.depleted);
        assert!(!summary.dynamic.depleted);
    }

    #[test]
    fn chart_pairs_runs_by_year() {
        // both runs are exhausted in year 4
        let mut params = sample_params();
        params.annual_withdrawal = 300_000.0;
        let comparison = compare(&params, &ReturnSequence::historical());
        assert_eq!(comparison.fixed.len(), 5);
        assert_eq!(comparison.dynamic.len(), 5);

        let chart = comparison.chart();
        assert_eq!(chart.len(), 5);
        assert_eq!(chart[1].fixed, 695_100.0);
        assert_eq!(chart[1].dynamic, 755_100.0);
        assert_eq!(chart[4].fixed, 0.0);
        assert_eq!(chart[4].dynamic, 0.0);

        let summary = comparison.summary();
        assert!(summary.fixed.depleted);
        assert!(summary.dynamic.depleted);
        assert_eq!(summary.fixed.final_year, 4);
    }

    #[test]
    fn chart_spans_longer_run() {
        let comparison = Comparison {
            fixed: vec![
                YearRecord::opening(100.0),
                YearRecord {
                    year: 1,
                    balance: 0.0,
                    withdrawal: 150.0,
                    market_return: 0.0,
                    portfolio_return: 0.0,
                    cumulative_withdrawal: 150.0,
                },
            ],
            dynamic: vec![
                YearRecord::opening(100.0),
                YearRecord {
                    year: 1,
                    balance: 20.0,
                    withdrawal: 80.0,
                    market_return: 0.0,
                    portfolio_return: 0.0,
                    cumulative_withdrawal: 80.0,
                },
                YearRecord {
                    year: 2,
                    balance: 5.0,
                    withdrawal: 15.0,
                    market_return: 0.0,
                    portfolio_return: 0.0,
                    cumulative_withdrawal: 95.0,
                },
            ],
            initial_balance: 100.0,
        };

        let chart = comparison.chart();
        assert_eq!(chart.len(), 3);
        assert_eq!(
            chart[2],
            ComparisonPoint {
                year: 2,
                fixed: 0.0,
                dynamic: 5.0,
            }
        );
        let summary = comparison.summary();
        assert!(summary.fixed.depleted);
        assert!(!summary.dynamic.depleted);
        assert_approx(summary.difference, 5.0);
        assert_approx(summary.difference_pct_of_initial, 5.0);
    }

    #[test]
    fn zero_initial_balance_reports_zero_percentage() {
        let mut params = sample_params();
        params.initial_balance = 0.0;
        let summary = compare(&params, &ReturnSequence::historical()).summary();
        assert_eq!(summary.difference_pct_of_initial, 0.0);
    }

    #[test]
    fn risk_profile_thresholds_are_strict() {
        let with_risky = |risky| Allocation {
            cash: 0.0,
            safe: 1.0 - risky,
            risky,
        };
        assert_eq!(RiskProfile::classify(with_risky(0.61)), RiskProfile::Aggressive);
        assert_eq!(RiskProfile::classify(with_risky(0.60)), RiskProfile::Balanced);
        assert_eq!(RiskProfile::classify(with_risky(0.41)), RiskProfile::Balanced);
        assert_eq!(RiskProfile::classify(with_risky(0.40)), RiskProfile::Conservative);
    }

    #[test]
    fn allocation_breakdown_scales_initial_balance() {
        let breakdown = AllocationBreakdown::from_params(&sample_params());
        assert_approx(breakdown.cash, 100_000.0);
        assert_approx(breakdown.safe, 400_000.0);
        assert_approx(breakdown.risky, 500_000.0);
    }

    #[test]
    fn incomplete_allocation_warns_without_failing() {
        assert_eq!(allocation_warning(sample_params().allocation), None);

        let lopsided = Allocation {
            cash: 0.10,
            safe: 0.40,
            risky: 0.60,
        };
        let warning = allocation_warning(lopsided).expect("must warn");
        assert!(warning.contains("110.0%"));
    }
}
