use std::fmt;

use crate::core::{
    AllocationBreakdown, Comparison, DynamicBase, RiskProfile, SimulationParameters, Strategy,
    allocation_warning, round_currency,
};

/// US-style whole-dollar formatting: `$1,234,567`, `-$5,000`.
pub fn format_currency(value: f64) -> String {
    let rounded = round_currency(value);
    if !rounded.is_finite() {
        return format!("${rounded}");
    }

    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

fn percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

fn strategy_label(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::Fixed => "fixed",
        Strategy::Dynamic => "dynamic",
        Strategy::Percentage => "percentage (4% of balance)",
    }
}

struct Report<'a> {
    params: &'a SimulationParameters,
    comparison: &'a Comparison,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self.params;
        let allocation = params.allocation;
        let breakdown = AllocationBreakdown::from_params(params);
        let summary = self.comparison.summary();

        writeln!(f, "Strategic Withdrawal Plan Report")?;
        writeln!(f, "================================")?;
        writeln!(f)?;

        writeln!(f, "Portfolio settings")?;
        writeln!(f, "  Initial balance      {}", format_currency(params.initial_balance))?;
        writeln!(f, "  Annual withdrawal    {}", format_currency(params.annual_withdrawal))?;
        writeln!(f, "  Time period          {} years", params.horizon_years)?;
        writeln!(f, "  Inflation rate       {}", percent(params.inflation_rate))?;
        writeln!(f, "  Selected strategy    {}", strategy_label(params.strategy))?;
        writeln!(f)?;

        writeln!(f, "Asset allocation")?;
        writeln!(
            f,
            "  Cash   {:>7}  {:>14}  ~1% return",
            percent(allocation.cash),
            format_currency(breakdown.cash)
        )?;
        writeln!(
            f,
            "  Safe   {:>7}  {:>14}  {} expected return",
            percent(allocation.safe),
            format_currency(breakdown.safe),
            percent(params.safe_growth_rate)
        )?;
        writeln!(
            f,
            "  Risky  {:>7}  {:>14}  historical market returns",
            percent(allocation.risky),
            format_currency(breakdown.risky)
        )?;
        writeln!(f, "  Total  {:>7}", percent(allocation.total()))?;
        if let Some(warning) = allocation_warning(allocation) {
            writeln!(f, "  WARNING: {warning}")?;
        }
        writeln!(f)?;

        writeln!(f, "Dynamic strategy")?;
        writeln!(
            f,
            "  Adjustment rate      {}",
            percent(params.dynamic_adjustment_rate)
        )?;
        let base = match params.dynamic_base {
            DynamicBase::Reset => "adjustments apply to the year they occur",
            DynamicBase::Carry => "adjustments carry into following years",
        };
        writeln!(f, "  Base withdrawal      {base}")?;
        writeln!(f)?;

        writeln!(f, "Summary")?;
        writeln!(
            f,
            "  Fixed end balance    {} after {} years",
            format_currency(summary.fixed.end_balance),
            summary.fixed.final_year
        )?;
        writeln!(
            f,
            "  Dynamic end balance  {} after {} years",
            format_currency(summary.dynamic.end_balance),
            summary.dynamic.final_year
        )?;
        writeln!(
            f,
            "  Difference           {} ({:.1}% of initial)",
            format_currency(summary.difference),
            summary.difference_pct_of_initial
        )?;
        writeln!(f)?;

        writeln!(f, "{:>4}  {:>16}  {:>16}", "Year", "Fixed", "Dynamic")?;
        for point in self.comparison.chart() {
            writeln!(
                f,
                "{:>4}  {:>16}  {:>16}",
                point.year,
                format_currency(point.fixed),
                format_currency(point.dynamic)
            )?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "Key finding: the dynamic withdrawal strategy results in a {} difference \
             compared to the fixed withdrawal strategy after {} years.",
            format_currency(summary.difference.abs()),
            params.horizon_years
        )?;
        writeln!(
            f,
            "Portfolio mix: {} cash, {} safe growth (at {} expected return) and {} market \
             exposure ({} risk profile).",
            percent(allocation.cash),
            percent(allocation.safe),
            percent(params.safe_growth_rate),
            percent(allocation.risky),
            RiskProfile::classify(allocation).label()
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "This report is for informational purposes only and does not constitute financial advice."
        )
    }
}

/// Plain-text rendering of a fixed vs dynamic comparison, suitable for
/// printing or saving.
pub fn render_report(params: &SimulationParameters, comparison: &Comparison) -> String {
    Report { params, comparison }.to_string()
}
