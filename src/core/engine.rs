use std::collections::BTreeMap;

use chrono::{Datelike, Local};
use log::debug;

use super::types::{
    InputParameters, ProjectionError, ProjectionSummary, ScheduledExpense, YearlySnapshot,
};

/// Longest supported projection, in years past the current year.
pub const MAX_HORIZON_YEARS: i64 = 150;

/// Projects from the local calendar year through `birth_year + max_age`.
pub fn project(params: &InputParameters) -> Result<Vec<YearlySnapshot>, ProjectionError> {
    project_from(params, Local::now().year())
}

/// Same as [`project`] with the starting calendar year pinned.
///
/// The first record is the baseline built from the raw inputs; every later
/// record is derived from the one before it. Income and expenses grow and are
/// then capped, disposable income is reinvested into the grown portfolio, and
/// scheduled one-off expenses are deducted after rounding.
pub fn project_from(
    params: &InputParameters,
    current_year: i32,
) -> Result<Vec<YearlySnapshot>, ProjectionError> {
    validate_parameters(params)?;

    let end_year = params.end_year();
    let horizon = i64::from(end_year) - i64::from(current_year);
    if horizon < 0 {
        return Err(ProjectionError::InvalidRange {
            current_year,
            end_year,
            reason: "ends before the current year",
        });
    }
    if horizon > MAX_HORIZON_YEARS {
        return Err(ProjectionError::InvalidRange {
            current_year,
            end_year,
            reason: "spans more than 150 years",
        });
    }

    let scheduled = scheduled_totals(&params.scheduled_expenses, current_year, end_year)?;
    let fire_target = params.fire_target();

    let mut snapshots = Vec::with_capacity(horizon as usize + 1);
    snapshots.push(baseline_snapshot(params, current_year, fire_target));

    // Stepping from the previous year keeps `end_year == i32::MAX` in range.
    for year in (current_year..end_year).map(|prev_year| prev_year + 1) {
        let prev = &snapshots[snapshots.len() - 1];
        let scheduled_total = scheduled.get(&year).copied().unwrap_or(0.0);
        let next = advance_year(params, prev, year, scheduled_total);
        snapshots.push(next);
    }

    if log::log_enabled!(log::Level::Debug) {
        let fire_age = snapshots
            .iter()
            .find(|s| s.fire_diff > 0.0)
            .map(|s| s.age);
        debug!(
            "projected {} years from {current_year} to {end_year}, fire target {fire_target}, fire age {fire_age:?}",
            snapshots.len()
        );
    }

    Ok(snapshots)
}

/// Headline numbers for a projection; `None` when there are no snapshots.
pub fn summarize(snapshots: &[YearlySnapshot]) -> Option<ProjectionSummary> {
    let last = snapshots.last()?;
    let first_fire = snapshots
        .iter()
        .filter(|s| s.fire_diff > 0.0)
        .min_by_key(|s| s.age);

    Some(ProjectionSummary {
        fire_target: last.fire_target,
        fire_age: first_fire.map(|s| s.age),
        fire_year: first_fire.map(|s| s.year),
        final_age: last.age,
        final_net_worth: last.net_worth,
    })
}

/// Rounds to cents, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn grow(value: f64, pct: f64) -> f64 {
    value + value * (pct / 100.0)
}

fn baseline_snapshot(params: &InputParameters, year: i32, fire_target: f64) -> YearlySnapshot {
    let disposable_income = round2(params.current_income - params.current_expenses);
    let net_worth = disposable_income + params.current_market_savings;
    YearlySnapshot {
        year,
        age: year - params.birth_year,
        income: params.current_income,
        expenses: params.current_expenses,
        disposable_income,
        net_worth,
        fire_target,
        fire_diff: net_worth - fire_target,
    }
}

fn advance_year(
    params: &InputParameters,
    prev: &YearlySnapshot,
    year: i32,
    scheduled_total: f64,
) -> YearlySnapshot {
    let income = round2(grow(prev.income, params.salary_growth_pct)).min(params.income_cap);
    let expenses = round2(grow(prev.expenses, params.inflation_pct)).min(params.expense_cap);
    let disposable_income = round2(income - expenses);
    let grown_net_worth = grow(prev.net_worth, params.portfolio_growth_pct);
    let net_worth = round2(grown_net_worth + disposable_income) - scheduled_total;

    YearlySnapshot {
        year,
        age: year - params.birth_year,
        income,
        expenses,
        disposable_income,
        net_worth,
        fire_target: prev.fire_target,
        fire_diff: net_worth - prev.fire_target,
    }
}

fn validate_parameters(params: &InputParameters) -> Result<(), ProjectionError> {
    for (name, value) in [
        ("current_income", params.current_income),
        ("current_expenses", params.current_expenses),
        ("income_cap", params.income_cap),
        ("expense_cap", params.expense_cap),
        ("retirement_annual_expense", params.retirement_annual_expense),
        ("salary_growth_pct", params.salary_growth_pct),
        ("inflation_pct", params.inflation_pct),
        ("portfolio_growth_pct", params.portfolio_growth_pct),
        ("current_market_savings", params.current_market_savings),
    ] {
        if !value.is_finite() {
            return Err(ProjectionError::InvalidParameter { name, value });
        }
    }
    Ok(())
}

/// Sums scheduled expenses per year in input order.
fn scheduled_totals(
    expenses: &[ScheduledExpense],
    current_year: i32,
    end_year: i32,
) -> Result<BTreeMap<i32, f64>, ProjectionError> {
    let mut totals = BTreeMap::new();
    for (index, expense) in expenses.iter().enumerate() {
        let reason = if !(current_year..=end_year).contains(&expense.year) {
            Some(format!(
                "year is outside the projection window {current_year}..={end_year}"
            ))
        } else if !expense.amount.is_finite() {
            Some(format!("amount must be finite, got {}", expense.amount))
        } else if expense.amount < 0.0 {
            Some(format!("amount must be >= 0, got {}", expense.amount))
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(ProjectionError::InvalidSchedule {
                index,
                year: expense.year,
                reason,
            });
        }
        *totals.entry(expense.year).or_insert(0.0) += expense.amount;
    }
    Ok(totals)
}
