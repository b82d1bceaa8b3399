use serde::Serialize;
use thiserror::Error;

/// A one-off deduction from net worth in a given calendar year (a house
/// purchase, a wedding). Entries sharing a year are summed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledExpense {
    pub year: i32,
    pub amount: f64,
    pub description: String,
}

impl ScheduledExpense {
    pub fn new(year: i32, amount: f64) -> Self {
        Self {
            year,
            amount,
            description: String::new(),
        }
    }
}

/// Inputs for one projection run. Percentages are expressed as 0-100, not
/// as fractions.
#[derive(Debug, Clone)]
pub struct InputParameters {
    pub current_income: f64,
    pub current_expenses: f64,
    pub income_cap: f64,
    pub expense_cap: f64,
    pub retirement_annual_expense: f64,
    pub birth_year: i32,
    pub max_age: u32,
    pub salary_growth_pct: f64,
    pub inflation_pct: f64,
    pub portfolio_growth_pct: f64,
    pub current_market_savings: f64,
    pub scheduled_expenses: Vec<ScheduledExpense>,
}

impl InputParameters {
    /// Net worth at which a 4% withdrawal covers the retirement expense.
    pub fn fire_target(&self) -> f64 {
        self.retirement_annual_expense * 25.0
    }

    /// Last calendar year of the projection.
    pub fn end_year(&self) -> i32 {
        self.birth_year
            .saturating_add(i32::try_from(self.max_age).unwrap_or(i32::MAX))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlySnapshot {
    pub year: i32,
    pub age: i32,
    pub income: f64,
    pub expenses: f64,
    pub disposable_income: f64,
    pub net_worth: f64,
    pub fire_target: f64,
    pub fire_diff: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub fire_target: f64,
    pub fire_age: Option<i32>,
    pub fire_year: Option<i32>,
    pub final_age: i32,
    pub final_net_worth: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("projection window {current_year}..={end_year} {reason}")]
    InvalidRange {
        current_year: i32,
        end_year: i32,
        reason: &'static str,
    },
    #[error("scheduled expense #{index} ({year}): {reason}")]
    InvalidSchedule {
        index: usize,
        year: i32,
        reason: String,
    },
    #[error("{name} must be finite, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}
