pub mod schedule;

use std::ffi::OsString;
use std::fmt::Write as _;
use std::net::SocketAddr;

use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{Datelike, Local};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::core::{
    InputParameters, ProjectionSummary, ScheduledExpense, YearlySnapshot, project_from,
    summarize,
};
use schedule::{parse_schedule, parse_schedule_entry};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "fire-calc",
    about = "Yearly income, expense and net worth projection with a FIRE target (25x retirement expenses)"
)]
struct Cli {
    #[arg(long, default_value_t = 1_200_000.0, help = "Current income per year")]
    current_income: f64,
    #[arg(long, default_value_t = 600_000.0, help = "Current expenses per year")]
    current_expenses: f64,
    #[arg(long, default_value_t = 10_000_000.0, help = "Ceiling for yearly income")]
    income_cap: f64,
    #[arg(long, default_value_t = 7_500_000.0, help = "Ceiling for yearly expenses")]
    expense_cap: f64,
    #[arg(
        long,
        default_value_t = 7_500_000.0,
        help = "Yearly expenses at the time of retirement"
    )]
    retirement_annual_expense: f64,
    #[arg(long, default_value_t = 1997)]
    birth_year: i32,
    #[arg(long, default_value_t = 60, help = "Predicted max age; projection horizon")]
    max_age: u32,
    #[arg(long, default_value_t = 10.0, help = "Salary increment YoY in percent")]
    salary_growth: f64,
    #[arg(long, default_value_t = 10.0, help = "Inflation rate YoY in percent")]
    inflation: f64,
    #[arg(long, default_value_t = 10.0, help = "Portfolio growth YoY in percent")]
    portfolio_growth: f64,
    #[arg(long, default_value_t = 0.0, help = "Current savings in the market")]
    current_market_savings: f64,
    #[arg(
        long = "expense",
        value_name = "YEAR,AMOUNT[,DESCRIPTION]",
        value_parser = parse_schedule_entry,
        help = "One-off expense deducted from net worth in YEAR; repeatable"
    )]
    expenses: Vec<ScheduledExpense>,
    #[arg(long, help = "First projected calendar year; defaults to the current year")]
    current_year: Option<i32>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduledExpensePayload {
    year: i32,
    #[serde(alias = "expense")]
    amount: f64,
    #[serde(default)]
    description: String,
}

impl From<ScheduledExpensePayload> for ScheduledExpense {
    fn from(value: ScheduledExpensePayload) -> Self {
        ScheduledExpense {
            year: value.year,
            amount: value.amount,
            description: value.description,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    current_income: Option<f64>,
    current_expenses: Option<f64>,
    income_cap: Option<f64>,
    expense_cap: Option<f64>,
    retirement_annual_expense: Option<f64>,
    birth_year: Option<i32>,
    max_age: Option<u32>,
    salary_growth: Option<f64>,
    inflation: Option<f64>,
    portfolio_growth: Option<f64>,
    current_market_savings: Option<f64>,
    current_year: Option<i32>,
    /// JSON list of `{year, amount, description}`; POST only, since query
    /// strings cannot carry a list of objects.
    major_expenses: Option<Vec<ScheduledExpensePayload>>,
    /// Newline-separated `year,amount[,description]` lines; the form GET
    /// requests use.
    major_expenses_text: Option<String>,
}

#[derive(Debug)]
struct ProjectionRequest {
    inputs: InputParameters,
    current_year: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    current_year: i32,
    #[serde(flatten)]
    summary: ProjectionSummary,
    snapshots: Vec<YearlySnapshot>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_request(cli: Cli) -> Result<ProjectionRequest, String> {
    let current_year = cli.current_year.unwrap_or_else(|| Local::now().year());
    if !(1900..=9999).contains(&current_year) {
        return Err("--current-year must be between 1900 and 9999".to_string());
    }

    for (name, value) in [
        ("--current-income", cli.current_income),
        ("--current-expenses", cli.current_expenses),
        ("--retirement-annual-expense", cli.retirement_annual_expense),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(format!("{name} must be > 0"));
        }
    }
    if !cli.income_cap.is_finite() || cli.income_cap < cli.current_income {
        return Err("--income-cap must be >= --current-income".to_string());
    }
    if !cli.expense_cap.is_finite() || cli.expense_cap < cli.current_expenses {
        return Err("--expense-cap must be >= --current-expenses".to_string());
    }
    for (name, rate) in [
        ("--salary-growth", cli.salary_growth),
        ("--inflation", cli.inflation),
        ("--portfolio-growth", cli.portfolio_growth),
    ] {
        if !(0.0..=100.0).contains(&rate) {
            return Err(format!("{name} must be between 0 and 100"));
        }
    }
    if !cli.current_market_savings.is_finite() || cli.current_market_savings < 0.0 {
        return Err("--current-market-savings must be >= 0".to_string());
    }
    if cli.max_age == 0 || cli.max_age > 150 {
        return Err("--max-age must be between 1 and 150".to_string());
    }
    if cli.birth_year > current_year {
        return Err(format!(
            "--birth-year must be <= the current year ({current_year})"
        ));
    }

    Ok(ProjectionRequest {
        inputs: InputParameters {
            current_income: cli.current_income,
            current_expenses: cli.current_expenses,
            income_cap: cli.income_cap,
            expense_cap: cli.expense_cap,
            retirement_annual_expense: cli.retirement_annual_expense,
            birth_year: cli.birth_year,
            max_age: cli.max_age,
            salary_growth_pct: cli.salary_growth,
            inflation_pct: cli.inflation,
            portfolio_growth_pct: cli.portfolio_growth,
            current_market_savings: cli.current_market_savings,
            scheduled_expenses: cli.expenses,
        },
        current_year,
    })
}

fn run_projection(request: &ProjectionRequest) -> Result<ProjectResponse, String> {
    let snapshots =
        project_from(&request.inputs, request.current_year).map_err(|e| e.to_string())?;
    let summary = summarize(&snapshots).ok_or_else(|| "projection is empty".to_string())?;
    Ok(ProjectResponse {
        current_year: request.current_year,
        summary,
        snapshots,
    })
}

/// Parses command-line arguments, projects, and renders the result.
///
/// Help and usage errors are handled by clap and exit the process.
pub fn run_cli<I, T>(args: I) -> Result<String, String>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_from(args).unwrap_or_else(|e| e.exit());
    let format = cli.format;
    let request = build_request(cli)?;
    let response = run_projection(&request)?;
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&response)
            .map(|json| format!("{json}\n"))
            .map_err(|e| format!("Failed to serialize projection: {e}")),
        OutputFormat::Table => Ok(render_table(&response)),
    }
}

fn headline(summary: &ProjectionSummary) -> String {
    match (summary.fire_age, summary.fire_year) {
        (Some(age), Some(year)) => format!(
            "FIRE @ {:.2}. Can be achieved at age {age} ({year}).",
            summary.fire_target
        ),
        _ => format!(
            "FIRE @ {:.2}. Not reached by age {}; final net worth {:.2}.",
            summary.fire_target, summary.final_age, summary.final_net_worth
        ),
    }
}

fn render_table(response: &ProjectResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", headline(&response.summary));
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:>6} {:>4} {:>16} {:>16} {:>16} {:>18} {:>18} {:>18}",
        "year", "age", "income", "expenses", "disposable", "net_worth", "fire_target", "fire_diff"
    );
    for s in &response.snapshots {
        let _ = writeln!(
            out,
            "{:>6} {:>4} {:>16.2} {:>16.2} {:>16.2} {:>18.2} {:>18.2} {:>18.2}",
            s.year,
            s.age,
            s.income,
            s.expenses,
            s.disposable_income,
            s.net_worth,
            s.fire_target,
            s.fire_diff
        );
    }
    out
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!("FIRE projection API listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{port}/api/project");
    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(
    payload: Result<Query<ProjectPayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => project_handler_impl(payload).await,
        Err(rejection) => rejected_payload_response(&rejection.body_text()),
    }
}

async fn project_post_handler(
    payload: Result<Json<ProjectPayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => project_handler_impl(payload).await,
        Err(rejection) => rejected_payload_response(&rejection.body_text()),
    }
}

fn rejected_payload_response(detail: &str) -> Response {
    warn!("Rejected projection payload: {detail}");
    error_response(
        StatusCode::BAD_REQUEST,
        &format!("Invalid API payload: {detail}"),
    )
}

async fn project_handler_impl(payload: ProjectPayload) -> Response {
    let response = api_request_from_payload(payload).and_then(|request| run_projection(&request));
    match response {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => {
            warn!("Rejected projection request: {msg}");
            error_response(StatusCode::BAD_REQUEST, &msg)
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ProjectionRequest, String> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: ProjectPayload) -> Result<ProjectionRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.current_income {
        cli.current_income = v;
    }
    if let Some(v) = payload.current_expenses {
        cli.current_expenses = v;
    }
    if let Some(v) = payload.income_cap {
        cli.income_cap = v;
    }
    if let Some(v) = payload.expense_cap {
        cli.expense_cap = v;
    }
    if let Some(v) = payload.retirement_annual_expense {
        cli.retirement_annual_expense = v;
    }
    if let Some(v) = payload.birth_year {
        cli.birth_year = v;
    }
    if let Some(v) = payload.max_age {
        cli.max_age = v;
    }
    if let Some(v) = payload.salary_growth {
        cli.salary_growth = v;
    }
    if let Some(v) = payload.inflation {
        cli.inflation = v;
    }
    if let Some(v) = payload.portfolio_growth {
        cli.portfolio_growth = v;
    }
    if let Some(v) = payload.current_market_savings {
        cli.current_market_savings = v;
    }
    if let Some(v) = payload.current_year {
        cli.current_year = Some(v);
    }
    match (payload.major_expenses, payload.major_expenses_text) {
        (Some(_), Some(_)) => {
            return Err("Use either majorExpenses or majorExpensesText, not both".to_string());
        }
        (Some(list), None) => {
            cli.expenses = list.into_iter().map(ScheduledExpense::from).collect();
        }
        (None, Some(text)) => {
            cli.expenses = parse_schedule(&text).map_err(|e| format!("majorExpensesText {e}"))?;
        }
        (None, None) => {}
    }

    build_request(cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        current_income: 1_200_000.0,
        current_expenses: 600_000.0,
        income_cap: 10_000_000.0,
        expense_cap: 7_500_000.0,
        retirement_annual_expense: 7_500_000.0,
        birth_year: 1997,
        max_age: 60,
        salary_growth: 10.0,
        inflation: 10.0,
        portfolio_growth: 10.0,
        current_market_savings: 0.0,
        expenses: Vec::new(),
        current_year: None,
        format: OutputFormat::Json,
    }
}
