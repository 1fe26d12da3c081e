use tracing::debug;

use super::returns::ReturnSequence;
use super::types::{Allocation, DynamicBase, SimulationParameters, Strategy, YearRecord};

/// Nominal annual return of the cash bucket.
pub const CASH_RETURN: f64 = 0.01;
/// Share of the post-growth balance taken by the percentage strategy.
pub const PERCENTAGE_WITHDRAWAL_RATE: f64 = 0.04;

const DYNAMIC_GOOD_YEAR_THRESHOLD: f64 = 0.10;

pub fn simulate(params: &SimulationParameters, strategy: Strategy) -> Vec<YearRecord> {
    simulate_with_returns(params, strategy, &ReturnSequence::historical())
}

pub fn simulate_selected(params: &SimulationParameters) -> Vec<YearRecord> {
    simulate(params, params.strategy)
}

/// Projects the portfolio year by year until the horizon or until the
/// balance is exhausted, whichever comes first. Year 0 is the opening
/// snapshot and is always present.
pub fn simulate_with_returns(
    params: &SimulationParameters,
    strategy: Strategy,
    returns: &ReturnSequence,
) -> Vec<YearRecord> {
    let mut records = Vec::new();
    records.push(YearRecord::opening(params.initial_balance));

    let mut balance = params.initial_balance;
    let mut base_withdrawal = params.annual_withdrawal;
    let mut cumulative_withdrawal = 0.0;

    for year in 1..=params.horizon_years {
        let market_return = returns.return_at(year);
        let portfolio_return =
            blended_return(params.allocation, params.safe_growth_rate, market_return);

        balance *= 1.0 + portfolio_return;

        let year_withdrawal =
            planned_withdrawal(params, strategy, base_withdrawal, portfolio_return, balance);
        balance = (balance - year_withdrawal).max(0.0);
        base_withdrawal = next_base_withdrawal(params, strategy, base_withdrawal, year_withdrawal);
        cumulative_withdrawal += year_withdrawal;

        records.push(YearRecord {
            year,
            balance: round_currency(balance),
            withdrawal: round_currency(year_withdrawal),
            market_return,
            portfolio_return,
            cumulative_withdrawal,
        });

        if balance <= 0.0 {
            debug!(?strategy, year, "portfolio exhausted");
            break;
        }
    }

    records
}

fn blended_return(allocation: Allocation, safe_growth_rate: f64, market_return: f64) -> f64 {
    allocation.cash * CASH_RETURN
        + allocation.safe * safe_growth_rate
        + allocation.risky * market_return
}

fn planned_withdrawal(
    params: &SimulationParameters,
    strategy: Strategy,
    base_withdrawal: f64,
    portfolio_return: f64,
    grown_balance: f64,
) -> f64 {
    match strategy {
        Strategy::Fixed => base_withdrawal,
        Strategy::Dynamic => {
            if portfolio_return < 0.0 {
                base_withdrawal * (1.0 - params.dynamic_adjustment_rate)
            } else if portfolio_return > DYNAMIC_GOOD_YEAR_THRESHOLD {
                base_withdrawal * (1.0 + params.dynamic_adjustment_rate)
            } else {
                base_withdrawal
            }
        }
        Strategy::Percentage => grown_balance * PERCENTAGE_WITHDRAWAL_RATE,
    }
}

fn next_base_withdrawal(
    params: &SimulationParameters,
    strategy: Strategy,
    base_withdrawal: f64,
    year_withdrawal: f64,
) -> f64 {
    match (strategy, params.dynamic_base) {
        (Strategy::Fixed, _) => base_withdrawal * (1.0 + params.inflation_rate),
        (Strategy::Dynamic, DynamicBase::Carry) => year_withdrawal,
        (Strategy::Dynamic, DynamicBase::Reset) | (Strategy::Percentage, _) => base_withdrawal,
    }
}

/// Half-up rounding to whole currency units.
pub(crate) fn round_currency(value: f64) -> f64 {
    (value + 0.5).floor()
}
