mod error;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Json, Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::{
    BudgetSolveConfig, Debt, DebtType, SimulationOptions, SimulationResult, Strategy,
    compare_strategies, simulate_with_options, solve_budget,
};
use crate::narrative::{PlanNarrator, TemplateNarrator};
use crate::store::{DebtStore, DebtUpdate, InMemoryDebtStore, NewDebt};

pub use error::ApiError;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub options: SimulationOptions,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DebtStore>,
    pub narrator: Arc<dyn PlanNarrator>,
    pub options: SimulationOptions,
}

impl AppState {
    pub fn in_memory(options: SimulationOptions) -> Self {
        Self {
            store: Arc::new(InMemoryDebtStore::new()),
            narrator: Arc::new(TemplateNarrator::default()),
            options,
        }
    }
}

/// A debt as posted inline; ids are optional and generated when missing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebtPayload {
    id: Option<Uuid>,
    name: String,
    #[serde(rename = "type", default)]
    debt_type: DebtType,
    current_balance: f64,
    interest_rate: f64,
    minimum_payment: f64,
}

impl From<DebtPayload> for Debt {
    fn from(value: DebtPayload) -> Self {
        Debt {
            id: value.id.unwrap_or_else(Uuid::new_v4),
            name: value.name,
            debt_type: value.debt_type,
            current_balance: value.current_balance,
            interest_rate: value.interest_rate,
            minimum_payment: value.minimum_payment,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimulatePayload {
    debts: Vec<DebtPayload>,
    monthly_budget: f64,
    strategy: Strategy,
    #[serde(default)]
    narrate: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComparePayload {
    debts: Vec<DebtPayload>,
    monthly_budget: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SolveBudgetPayload {
    debts: Vec<DebtPayload>,
    strategy: Strategy,
    target_months: u32,
    tolerance: Option<f64>,
    max_iterations: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct PayoffPlanQuery {
    budget: f64,
    strategy: Option<Strategy>,
    #[serde(default)]
    narrate: bool,
}

#[derive(Debug, Serialize)]
struct SimulateResponse {
    #[serde(flatten)]
    result: SimulationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/simulate", post(simulate_handler))
        .route("/api/compare", post(compare_handler))
        .route("/api/solve-budget", post(solve_budget_handler))
        .route(
            "/api/users/:user/debts",
            get(list_debts_handler).post(create_debt_handler),
        )
        .route(
            "/api/users/:user/debts/:id",
            get(get_debt_handler)
                .put(update_debt_handler)
                .delete(delete_debt_handler),
        )
        .route("/api/users/:user/payoff-plan", get(payoff_plan_handler))
        .fallback(not_found_handler)
        .layer(middleware::map_response(method_not_allowed_as_json))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Axum answers a known path with the wrong method by an empty 405; give it
/// the same JSON error body as every other failure, keeping `Allow`.
async fn method_not_allowed_as_json(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }
    let allow = response.headers().get(header::ALLOW).cloned();
    let mut rewritten = ApiError::MethodNotAllowed.into_response();
    if let Some(allow) = allow {
        rewritten.headers_mut().insert(header::ALLOW, allow);
    }
    rewritten
}

pub async fn run_http_server(config: ServerConfig) -> std::io::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let app = router(AppState::in_memory(config.options));

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, max_months = config.options.max_months, "FinSaathi API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> ApiError {
    ApiError::NotFound
}

async fn simulate_handler(
    State(state): State<AppState>,
    payload: Result<Json<SimulatePayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let debts: Vec<Debt> = payload.debts.into_iter().map(Debt::from).collect();
    let response = plan_response(
        &state,
        &debts,
        payload.monthly_budget,
        payload.strategy,
        payload.narrate,
    )?;
    Ok(json_response(StatusCode::OK, response))
}

async fn compare_handler(
    State(state): State<AppState>,
    payload: Result<Json<ComparePayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let debts: Vec<Debt> = payload.debts.into_iter().map(Debt::from).collect();
    let comparison = compare_strategies(&debts, payload.monthly_budget, state.options)?;
    Ok(json_response(StatusCode::OK, comparison))
}

async fn solve_budget_handler(
    State(state): State<AppState>,
    payload: Result<Json<SolveBudgetPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let debts: Vec<Debt> = payload.debts.into_iter().map(Debt::from).collect();
    let mut config = BudgetSolveConfig::new(payload.strategy, payload.target_months);
    config.options = state.options;
    if let Some(tolerance) = payload.tolerance {
        config.tolerance = tolerance;
    }
    if let Some(max_iterations) = payload.max_iterations {
        config.max_iterations = max_iterations;
    }
    let result = solve_budget(&debts, config)?;
    Ok(json_response(StatusCode::OK, result))
}

async fn list_debts_handler(
    State(state): State<AppState>,
    user: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(user) = user?;
    let debts = state.store.list(&user)?;
    Ok(json_response(StatusCode::OK, debts))
}

async fn create_debt_handler(
    State(state): State<AppState>,
    user: Result<Path<String>, PathRejection>,
    payload: Result<Json<NewDebt>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Path(user) = user?;
    let Json(payload) = payload?;
    let debt = state.store.create(&user, payload)?;
    info!(%user, id = %debt.id, "debt created");
    Ok(json_response(StatusCode::CREATED, debt))
}

async fn get_debt_handler(
    State(state): State<AppState>,
    path: Result<Path<(String, Uuid)>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path((user, id)) = path?;
    let debt = state.store.get(&user, id)?;
    Ok(json_response(StatusCode::OK, debt))
}

async fn update_debt_handler(
    State(state): State<AppState>,
    path: Result<Path<(String, Uuid)>, PathRejection>,
    payload: Result<Json<DebtUpdate>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Path((user, id)) = path?;
    let Json(payload) = payload?;
    let debt = state.store.update(&user, id, payload)?;
    Ok(json_response(StatusCode::OK, debt))
}

async fn delete_debt_handler(
    State(state): State<AppState>,
    path: Result<Path<(String, Uuid)>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path((user, id)) = path?;
    let debt = state.store.delete(&user, id)?;
    info!(%user, %id, "debt deleted");
    Ok(json_response(StatusCode::OK, debt))
}

async fn payoff_plan_handler(
    State(state): State<AppState>,
    user: Result<Path<String>, PathRejection>,
    query: Result<Query<PayoffPlanQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Path(user) = user?;
    let Query(query) = query?;
    let debts = state.store.list(&user)?;
    let response = plan_response(
        &state,
        &debts,
        query.budget,
        query.strategy.unwrap_or(Strategy::Avalanche),
        query.narrate,
    )?;
    Ok(json_response(StatusCode::OK, response))
}

fn plan_response(
    state: &AppState,
    debts: &[Debt],
    monthly_budget: f64,
    strategy: Strategy,
    narrate: bool,
) -> Result<SimulateResponse, ApiError> {
    let result = simulate_with_options(debts, monthly_budget, strategy, state.options)?;
    let summary = if narrate {
        match state.narrator.narrate(debts, &result) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(error = %e, "narrative unavailable");
                None
            }
        }
    } else {
        None
    };
    Ok(SimulateResponse { result, summary })
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store"),
    );
    response
}
