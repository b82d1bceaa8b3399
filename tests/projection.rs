use fire_calc::core::{
    InputParameters, ProjectionError, ScheduledExpense, project, project_from, summarize,
};

fn household() -> InputParameters {
    InputParameters {
        current_income: 1_200_000.0,
        current_expenses: 600_000.0,
        income_cap: 10_000_000.0,
        expense_cap: 7_500_000.0,
        retirement_annual_expense: 7_500_000.0,
        birth_year: 1997,
        max_age: 60,
        salary_growth_pct: 10.0,
        inflation_pct: 10.0,
        portfolio_growth_pct: 10.0,
        current_market_savings: 0.0,
        scheduled_expenses: Vec::new(),
    }
}

#[test]
fn house_purchase_delays_independence() {
    let without = project_from(&household(), 2026).expect("valid projection");

    let mut params = household();
    params.scheduled_expenses.push(ScheduledExpense {
        year: 2030,
        amount: 8_000_000.0,
        description: "house".to_string(),
    });
    let with = project_from(&params, 2026).expect("valid projection");

    assert_eq!(with.len(), without.len());
    assert_eq!(with[0].net_worth, 600_000.0);
    assert_eq!(with[0].disposable_income, 600_000.0);
    assert_eq!(without[4].net_worth - with[4].net_worth, 8_000_000.0);

    let delayed = summarize(&with).expect("non-empty");
    let baseline = summarize(&without).expect("non-empty");
    assert_eq!(baseline.fire_age, Some(56));
    assert_eq!(delayed.fire_age, Some(60));
    assert_eq!(delayed.fire_target, 187_500_000.0);
}

#[test]
fn project_uses_local_calendar_year() {
    let mut params = household();
    params.birth_year = 1990;
    params.max_age = 150;
    let snapshots = project(&params).expect("valid projection");
    let first = &snapshots[0];
    assert!(first.year >= 2024);
    assert_eq!(first.age, first.year - 1990);
    assert_eq!(snapshots[snapshots.len() - 1].year, 2140);
}

#[test]
fn every_call_starts_from_its_own_schedule() {
    let mut scheduled = household();
    scheduled
        .scheduled_expenses
        .push(ScheduledExpense::new(2030, 1_000_000.0));
    let first = project_from(&scheduled, 2026).expect("valid projection");

    let plain = project_from(&household(), 2026).expect("valid projection");
    let again = project_from(&household(), 2026).expect("valid projection");
    assert_eq!(plain, again);
    assert_ne!(first, plain);
}

#[test]
fn expired_horizon_is_an_error() {
    let mut params = household();
    params.max_age = 10;
    let err = project_from(&params, 2026).expect_err("horizon ended in 2007");
    assert_eq!(
        err,
        ProjectionError::InvalidRange {
            current_year: 2026,
            end_year: 2007,
            reason: "ends before the current year",
        }
    );
}
