mod compare;
mod engine;
mod returns;
mod types;

pub use compare::{
    AllocationBreakdown, Comparison, ComparisonPoint, ComparisonSummary, RiskProfile,
    StrategySummary, allocation_warning, compare,
};
pub use engine::{
    CASH_RETURN, PERCENTAGE_WITHDRAWAL_RATE, simulate, simulate_selected, simulate_with_returns,
};
pub use returns::{HISTORICAL_RETURNS, ReturnSequence, ReturnSequenceError};
pub use types::{Allocation, DynamicBase, SimulationParameters, Strategy, YearRecord};

pub(crate) use engine::round_currency;
