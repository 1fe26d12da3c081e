mod report;

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
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::core::{
    Allocation, AllocationBreakdown, ComparisonPoint, ComparisonSummary, DynamicBase,
    ReturnSequence, ReturnSequenceError, RiskProfile, SimulationParameters, Strategy, YearRecord,
    allocation_warning, compare, simulate_with_returns,
};

pub use report::{format_currency, render_report};

/// Longest horizon accepted from the outside world.
pub const MAX_HORIZON_YEARS: u32 = 1_000;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("--{field} must be a finite number")]
    NonFinite { field: &'static str },
    #[error("--years must be <= {}", MAX_HORIZON_YEARS)]
    HorizonTooLong,
    #[error("--historical-returns: {0}")]
    Returns(#[from] ReturnSequenceError),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliStrategy {
    Fixed,
    Dynamic,
    Percentage,
}

impl From<CliStrategy> for Strategy {
    fn from(value: CliStrategy) -> Self {
        match value {
            CliStrategy::Fixed => Strategy::Fixed,
            CliStrategy::Dynamic => Strategy::Dynamic,
            CliStrategy::Percentage => Strategy::Percentage,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliDynamicBase {
    Reset,
    Carry,
}

impl From<CliDynamicBase> for DynamicBase {
    fn from(value: CliDynamicBase) -> Self {
        match value {
            CliDynamicBase::Reset => DynamicBase::Reset,
            CliDynamicBase::Carry => DynamicBase::Carry,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiStrategy {
    Fixed,
    Dynamic,
    #[serde(alias = "percent")]
    Percentage,
}

impl From<ApiStrategy> for CliStrategy {
    fn from(value: ApiStrategy) -> Self {
        match value {
            ApiStrategy::Fixed => CliStrategy::Fixed,
            ApiStrategy::Dynamic => CliStrategy::Dynamic,
            ApiStrategy::Percentage => CliStrategy::Percentage,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiDynamicBase {
    Reset,
    #[serde(alias = "compound")]
    Carry,
}

impl From<ApiDynamicBase> for CliDynamicBase {
    fn from(value: ApiDynamicBase) -> Self {
        match value {
            ApiDynamicBase::Reset => CliDynamicBase::Reset,
            ApiDynamicBase::Carry => CliDynamicBase::Carry,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    initial_balance: Option<f64>,
    annual_withdrawal: Option<f64>,
    withdrawal_strategy: Option<ApiStrategy>,
    cash_allocation: Option<f64>,
    safe_allocation: Option<f64>,
    risky_allocation: Option<f64>,
    safe_growth_rate: Option<f64>,
    inflation_rate: Option<f64>,
    years: Option<u32>,
    dynamic_adjustment: Option<f64>,
    dynamic_base: Option<ApiDynamicBase>,
    historical_returns: Option<Vec<f64>>,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "drawdown",
    about = "Compare fixed vs dynamic retirement withdrawals over a historical return sequence"
)]
pub struct Cli {
    #[arg(long, default_value_t = 1_000_000.0)]
    initial_balance: f64,
    #[arg(long, default_value_t = 40_000.0, help = "Withdrawal in the first year")]
    annual_withdrawal: f64,
    #[arg(
        long,
        value_enum,
        default_value_t = CliStrategy::Fixed,
        help = "Strategy reported as the selected run"
    )]
    withdrawal_strategy: CliStrategy,
    #[arg(long, default_value_t = 10.0, help = "Cash share in percent (~1% return)")]
    cash_allocation: f64,
    #[arg(long, default_value_t = 40.0, help = "Safe growth share in percent")]
    safe_allocation: f64,
    #[arg(
        long,
        default_value_t = 50.0,
        help = "Risky share in percent, grown with historical market returns"
    )]
    risky_allocation: f64,
    #[arg(
        long,
        default_value_t = 4.0,
        allow_negative_numbers = true,
        help = "Expected annual safe growth return in percent"
    )]
    safe_growth_rate: f64,
    #[arg(
        long,
        default_value_t = 2.5,
        allow_negative_numbers = true,
        help = "Annual escalation of the fixed withdrawal in percent"
    )]
    inflation_rate: f64,
    #[arg(long, default_value_t = 30, help = "Years to simulate")]
    years: u32,
    #[arg(
        long,
        default_value_t = 20.0,
        allow_negative_numbers = true,
        help = "Dynamic strategy: cut in negative years / raise above 10% returns, in percent"
    )]
    dynamic_adjustment: f64,
    #[arg(
        long,
        value_enum,
        default_value_t = CliDynamicBase::Reset,
        help = "Whether a dynamic adjustment becomes the base for following years"
    )]
    dynamic_base: CliDynamicBase,
    #[arg(
        long,
        value_delimiter = ',',
        allow_negative_numbers = true,
        help = "Comma-separated annual returns in percent replacing the built-in history"
    )]
    historical_returns: Option<Vec<f64>>,
}

#[derive(Debug)]
pub struct ApiRequest {
    pub params: SimulationParameters,
    pub returns: ReturnSequence,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    strategy: Strategy,
    dynamic_base: DynamicBase,
    allocation_total: f64,
    allocation_warning: Option<String>,
    risk_profile: RiskProfile,
    allocation_breakdown: AllocationBreakdown,
    fixed_years: Vec<YearRecord>,
    dynamic_years: Vec<YearRecord>,
    selected_years: Vec<YearRecord>,
    chart: Vec<ComparisonPoint>,
    summary: ComparisonSummary,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_request(cli: Cli) -> Result<ApiRequest, InputError> {
    for (field, value) in [
        ("initial-balance", cli.initial_balance),
        ("annual-withdrawal", cli.annual_withdrawal),
        ("cash-allocation", cli.cash_allocation),
        ("safe-allocation", cli.safe_allocation),
        ("risky-allocation", cli.risky_allocation),
        ("safe-growth-rate", cli.safe_growth_rate),
        ("inflation-rate", cli.inflation_rate),
        ("dynamic-adjustment", cli.dynamic_adjustment),
    ] {
        if !value.is_finite() {
            return Err(InputError::NonFinite { field });
        }
    }

    if cli.years > MAX_HORIZON_YEARS {
        return Err(InputError::HorizonTooLong);
    }

    let returns = match cli.historical_returns {
        Some(values) => ReturnSequence::from_percentages(values)?,
        None => ReturnSequence::historical(),
    };

    let params = SimulationParameters {
        initial_balance: cli.initial_balance,
        annual_withdrawal: cli.annual_withdrawal,
        horizon_years: cli.years,
        allocation: Allocation {
            cash: cli.cash_allocation / 100.0,
            safe: cli.safe_allocation / 100.0,
            risky: cli.risky_allocation / 100.0,
        },
        safe_growth_rate: cli.safe_growth_rate / 100.0,
        inflation_rate: cli.inflation_rate / 100.0,
        dynamic_adjustment_rate: cli.dynamic_adjustment / 100.0,
        strategy: cli.withdrawal_strategy.into(),
        dynamic_base: cli.dynamic_base.into(),
    };

    Ok(ApiRequest { params, returns })
}

/// Builds the printable report for a parsed command line.
pub fn run_cli_report(cli: Cli) -> Result<String, InputError> {
    let request = build_request(cli)?;
    let comparison = compare(&request.params, &request.returns);
    Ok(render_report(&request.params, &comparison))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route(
            "/api/report",
            get(report_get_handler).post(report_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "drawdown HTTP API listening");
    info!("Local access: http://127.0.0.1:{port}/api/simulate");

    axum::serve(listener, app).await
}

async fn health_handler() -> impl IntoResponse {
    with_cache_control("ok")
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(payload: Result<Query<SimulatePayload>, QueryRejection>) -> Response {
    match payload {
        Ok(Query(payload)) => simulate_handler_impl(payload),
        Err(rejection) => malformed(&rejection.body_text()),
    }
}

async fn simulate_post_handler(payload: Result<Json<SimulatePayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => simulate_handler_impl(payload),
        Err(rejection) => malformed(&rejection.body_text()),
    }
}

async fn report_get_handler(payload: Result<Query<SimulatePayload>, QueryRejection>) -> Response {
    match payload {
        Ok(Query(payload)) => report_handler_impl(payload),
        Err(rejection) => malformed(&rejection.body_text()),
    }
}

async fn report_post_handler(payload: Result<Json<SimulatePayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => report_handler_impl(payload),
        Err(rejection) => malformed(&rejection.body_text()),
    }
}

fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(err) => return rejected(err),
    };
    debug!(
        years = request.params.horizon_years,
        strategy = ?request.params.strategy,
        "simulating"
    );

    json_response(StatusCode::OK, build_simulate_response(&request))
}

fn report_handler_impl(payload: SimulatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(err) => return rejected(err),
    };
    let comparison = compare(&request.params, &request.returns);
    with_cache_control((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        render_report(&request.params, &comparison),
    ))
}

fn rejected(err: InputError) -> Response {
    warn!(error = %err, "rejected simulation request");
    error_response(StatusCode::BAD_REQUEST, &err.to_string())
}

fn malformed(detail: &str) -> Response {
    warn!(%detail, "malformed simulation request");
    error_response(
        StatusCode::BAD_REQUEST,
        &format!("Invalid request payload: {detail}"),
    )
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
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
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload).map_err(|e| e.to_string())
}

fn api_request_from_payload(payload: SimulatePayload) -> Result<ApiRequest, InputError> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.initial_balance {
        cli.initial_balance = v;
    }
    if let Some(v) = payload.annual_withdrawal {
        cli.annual_withdrawal = v;
    }
    if let Some(v) = payload.withdrawal_strategy {
        cli.withdrawal_strategy = v.into();
    }
    if let Some(v) = payload.cash_allocation {
        cli.cash_allocation = v;
    }
    if let Some(v) = payload.safe_allocation {
        cli.safe_allocation = v;
    }
    if let Some(v) = payload.risky_allocation {
        cli.risky_allocation = v;
    }
    if let Some(v) = payload.safe_growth_rate {
        cli.safe_growth_rate = v;
    }
    if let Some(v) = payload.inflation_rate {
        cli.inflation_rate = v;
    }
    if let Some(v) = payload.years {
        cli.years = v;
    }
    if let Some(v) = payload.dynamic_adjustment {
        cli.dynamic_adjustment = v;
    }
    if let Some(v) = payload.dynamic_base {
        cli.dynamic_base = v.into();
    }
    if let Some(v) = payload.historical_returns {
        cli.historical_returns = Some(v);
    }

    build_request(cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        initial_balance: 1_000_000.0,
        annual_withdrawal: 40_000.0,
        withdrawal_strategy: CliStrategy::Fixed,
        cash_allocation: 10.0,
        safe_allocation: 40.0,
        risky_allocation: 50.0,
        safe_growth_rate: 4.0,
        inflation_rate: 2.5,
        years: 30,
        dynamic_adjustment: 20.0,
        dynamic_base: CliDynamicBase::Reset,
        historical_returns: None,
    }
}

fn build_simulate_response(request: &ApiRequest) -> SimulateResponse {
    let params = &request.params;
    let comparison = compare(params, &request.returns);
    let selected_years = match params.strategy {
        Strategy::Fixed => comparison.fixed.clone(),
        Strategy::Dynamic => comparison.dynamic.clone(),
        Strategy::Percentage => simulate_with_returns(params, params.strategy, &request.returns),
    };

    SimulateResponse {
        strategy: params.strategy,
        dynamic_base: params.dynamic_base,
        allocation_total: params.allocation.total() * 100.0,
        allocation_warning: allocation_warning(params.allocation),
        risk_profile: RiskProfile::classify(params.allocation),
        allocation_breakdown: AllocationBreakdown::from_params(params),
        chart: comparison.chart(),
        summary: comparison.summary(),
        fixed_years: comparison.fixed,
        dynamic_years: comparison.dynamic,
        selected_years,
    }
}
