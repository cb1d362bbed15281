use std::sync::Arc;
use axum::{
    Extension, Json, Router, middleware,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use crate::api::auth::{auth_middleware, AuthContext, JwtAuth};
use crate::api::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::error::{Error, Result};
use crate::finance::category::{CategoryKind, CategoryService};
use crate::finance::expense::{ExpenseDraft, ExpenseService};
use crate::finance::income::{IncomeDraft, IncomeService};
use crate::finance::investment::{InvestmentDraft, InvestmentService};
use crate::interfaces::identity::IdentityResolver;
use crate::ledger::engine::ReconciliationEngine;
use crate::ledger::record::{Direction, LoanDraft};
use crate::observability::{self, metrics};
use crate::types::amount::Amount;
use crate::types::ids::{CategoryId, ExpenseId, IncomeId, InvestmentId, LoanId};

pub struct AppState {
    pub engine: ReconciliationEngine,
    pub expenses: ExpenseService,
    pub incomes: IncomeService,
    pub investments: InvestmentService,
    pub categories: CategoryService,
    pub identities: Arc<dyn IdentityResolver>,
    pub auth: JwtAuth,
    pub rate_limiter: RateLimiter,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/api/lent/create-lent", post(create_lent))
        .route("/api/lent/get-lent", get(get_lent))
        .route("/api/lent/update-lent/:id", put(update_lent))
        .route("/api/lent/delete-lent/:id", delete(delete_lent))
        .route("/api/borrow/create-borrow", post(create_borrow))
        .route("/api/borrow/get-borrow", get(get_borrow))
        .route("/api/borrow/update-borrow/:id", put(update_borrow))
        .route("/api/borrow/delete-borrow/:id", delete(delete_borrow))
        .route("/api/expense/create-expense", post(create_expense))
        .route("/api/expense/get-expense", get(get_expense))
        .route("/api/expense/total-expense", get(total_expense))
        .route("/api/expense/update-expense/:id", patch(update_expense))
        .route("/api/expense/delete-expense/:id", delete(delete_expense))
        .route("/api/income/create-income", post(create_income))
        .route("/api/income/get-income", get(get_income))
        .route("/api/income/total-income", get(total_income))
        .route("/api/income/update-income/:id", patch(update_income))
        .route("/api/income/delete-income/:id", delete(delete_income))
        .route("/api/investment/create-investment", post(create_investment))
        .route("/api/investment/get-investment", get(get_investment))
        .route("/api/investment/update-investment/:id", patch(update_investment))
        .route("/api/investment/delete-investment/:id", delete(delete_investment))
        .route("/api/category/create-category", post(create_category))
        .route("/api/category/get-categories", get(get_categories))
        .route("/api/category/delete-category/:id", delete(delete_category))
        // Layer order: auth resolves the caller, then the limiter keys on it.
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics_handler() -> Result<String> {
    let encoder = prometheus::TextEncoder::new();
    encoder
        .encode_to_string(&metrics::REGISTRY.gather())
        .map_err(|e| Error::MetricsEncoding(e.to_string()))
}

// ---- Ledger routes ----

/// One body shape for both families; the direction picks which of the
/// role-named email/image fields applies.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LoanRequestBody {
    lender: Option<String>,
    borrower: Option<String>,
    borrower_email: Option<String>,
    lender_email: Option<String>,
    borrower_image: Option<String>,
    lender_image: Option<String>,
    initial_amount: Option<Amount>,
    remaining_amount: Option<Amount>,
    description: Option<String>,
}

impl LoanRequestBody {
    fn into_draft(self, direction: Direction) -> LoanDraft {
        let (counterpart_email, counterpart_image) = match direction {
            Direction::Lend => (self.borrower_email, self.borrower_image),
            Direction::Borrow => (self.lender_email, self.lender_image),
        };
        LoanDraft {
            lender: self.lender,
            borrower: self.borrower,
            counterpart_email,
            counterpart_image,
            initial_amount: self.initial_amount,
            remaining_amount: self.remaining_amount,
            description: self.description,
        }
    }
}

fn parse_loan_id(raw: &str, direction: Direction) -> Result<LoanId> {
    LoanId::from_string(raw).map_err(|_| Error::NotFound {
        what: direction.record_label(),
    })
}

async fn create_lent(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<LoanRequestBody>,
) -> Result<impl IntoResponse> {
    let record = state
        .engine
        .create_entry(Direction::Lend, body.into_draft(Direction::Lend), &ctx.caller())
        .instrument(observability::tracing::ledger_span("create", Direction::Lend))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Lent money record created successfully!",
            "data": record.to_body(Direction::Lend),
        })),
    ))
}

async fn get_lent(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse> {
    let (records, total) = state.engine.list_entries(Direction::Lend, &ctx.caller()).await?;
    let data: Vec<_> = records
        .iter()
        .map(|record| record.to_body(Direction::Lend))
        .collect();
    Ok(Json(json!({
        "message": "Lent money records fetched successfully!",
        "data": data,
        "totalInitialAmount": total,
    })))
}

async fn update_lent(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(body): Json<LoanRequestBody>,
) -> Result<impl IntoResponse> {
    let id = parse_loan_id(&id, Direction::Lend)?;
    let record = state
        .engine
        .update_entry(Direction::Lend, id, body.into_draft(Direction::Lend), &ctx.caller())
        .instrument(observability::tracing::ledger_span("update", Direction::Lend))
        .await?;
    Ok(Json(json!({
        "message": "Lent money record updated successfully!",
        "data": record.to_body(Direction::Lend),
    })))
}

async fn delete_lent(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = parse_loan_id(&id, Direction::Lend)?;
    state
        .engine
        .delete_entry(Direction::Lend, id, &ctx.caller())
        .instrument(observability::tracing::ledger_span("delete", Direction::Lend))
        .await?;
    Ok(Json(json!({ "message": "Lent money record deleted successfully!" })))
}

async fn create_borrow(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<LoanRequestBody>,
) -> Result<impl IntoResponse> {
    let record = state
        .engine
        .create_entry(Direction::Borrow, body.into_draft(Direction::Borrow), &ctx.caller())
        .instrument(observability::tracing::ledger_span("create", Direction::Borrow))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Borrow money record created successfully!",
            "data": record.to_body(Direction::Borrow),
        })),
    ))
}

async fn get_borrow(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse> {
    let (records, total) = state.engine.list_entries(Direction::Borrow, &ctx.caller()).await?;
    let data: Vec<_> = records
        .iter()
        .map(|record| record.to_body(Direction::Borrow))
        .collect();
    Ok(Json(json!({
        "message": "Borrow money records fetched successfully!",
        "data": data,
        "totalBorrowedAmount": total,
    })))
}

async fn update_borrow(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(body): Json<LoanRequestBody>,
) -> Result<impl IntoResponse> {
    let id = parse_loan_id(&id, Direction::Borrow)?;
    let record = state
        .engine
        .update_entry(Direction::Borrow, id, body.into_draft(Direction::Borrow), &ctx.caller())
        .instrument(observability::tracing::ledger_span("update", Direction::Borrow))
        .await?;
    Ok(Json(json!({
        "message": "Borrowed money record updated successfully!",
        "data": record.to_body(Direction::Borrow),
    })))
}

async fn delete_borrow(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = parse_loan_id(&id, Direction::Borrow)?;
    state
        .engine
        .delete_entry(Direction::Borrow, id, &ctx.caller())
        .instrument(observability::tracing::ledger_span("delete", Direction::Borrow))
        .await?;
    Ok(Json(json!({ "message": "Borrow money record deleted successfully!" })))
}

// ---- Finance routes ----

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ExpenseRequestBody {
    amount: Option<Amount>,
    category: Option<CategoryId>,
    description: Option<String>,
    expense_type: Option<String>,
    date: Option<DateTime<Utc>>,
}

impl From<ExpenseRequestBody> for ExpenseDraft {
    fn from(body: ExpenseRequestBody) -> Self {
        ExpenseDraft {
            amount: body.amount,
            category: body.category,
            description: body.description,
            expense_type: body.expense_type,
            date: body.date,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MonthQuery {
    month: Option<u32>,
    year: Option<i32>,
}

impl MonthQuery {
    fn require(self) -> Result<(u32, i32)> {
        match (self.month, self.year) {
            (Some(month), Some(year)) => Ok((month, year)),
            _ => Err(Error::validation("month", "Month and year are required.")),
        }
    }
}

async fn create_expense(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<ExpenseRequestBody>,
) -> Result<impl IntoResponse> {
    let record = state.expenses.create(ctx.user_id, body.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Expense created successfully!", "expense": record })),
    ))
}

async fn get_expense(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse> {
    let (records, total) = state.expenses.list(ctx.user_id).await?;
    Ok(Json(json!({
        "message": "Expenses retrieved successfully!",
        "expenses": records,
        "totalExpense": total,
    })))
}

async fn total_expense(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<MonthQuery>,
) -> Result<impl IntoResponse> {
    let (month, year) = query.require()?;
    let total = state.expenses.month_total(ctx.user_id, month, year).await?;
    Ok(Json(json!({ "totalExpense": total })))
}

async fn update_expense(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(body): Json<ExpenseRequestBody>,
) -> Result<impl IntoResponse> {
    let id = ExpenseId::from_string(&id).map_err(|_| Error::NotFound { what: "Expense" })?;
    let record = state.expenses.update(ctx.user_id, id, body.into()).await?;
    Ok(Json(json!({ "message": "Expense updated successfully!", "expense": record })))
}

async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = ExpenseId::from_string(&id).map_err(|_| Error::NotFound { what: "Expense" })?;
    state.expenses.delete(ctx.user_id, id).await?;
    Ok(Json(json!({ "message": "Expense deleted successfully!" })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct IncomeRequestBody {
    amount: Option<Amount>,
    source: Option<CategoryId>,
    description: Option<String>,
    date: Option<DateTime<Utc>>,
}

impl From<IncomeRequestBody> for IncomeDraft {
    fn from(body: IncomeRequestBody) -> Self {
        IncomeDraft {
            amount: body.amount,
            source: body.source,
            description: body.description,
            date: body.date,
        }
    }
}

async fn create_income(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<IncomeRequestBody>,
) -> Result<impl IntoResponse> {
    let record = state.incomes.create(ctx.user_id, body.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Income created successfully!", "income": record })),
    ))
}

async fn get_income(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse> {
    let (records, total) = state.incomes.list(ctx.user_id).await?;
    Ok(Json(json!({
        "message": "Income retrieved successfully!",
        "income": records,
        "totalIncome": total,
    })))
}

async fn total_income(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<MonthQuery>,
) -> Result<impl IntoResponse> {
    let (month, year) = query.require()?;
    let total = state.incomes.month_total(ctx.user_id, month, year).await?;
    Ok(Json(json!({ "totalIncome": total })))
}

async fn update_income(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(body): Json<IncomeRequestBody>,
) -> Result<impl IntoResponse> {
    let id = IncomeId::from_string(&id).map_err(|_| Error::NotFound { what: "Income" })?;
    let record = state.incomes.update(ctx.user_id, id, body.into()).await?;
    Ok(Json(json!({ "message": "Income updated successfully!", "income": record })))
}

async fn delete_income(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = IncomeId::from_string(&id).map_err(|_| Error::NotFound { what: "Income" })?;
    state.incomes.delete(ctx.user_id, id).await?;
    Ok(Json(json!({ "message": "Income deleted successfully!" })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct InvestmentRequestBody {
    name: Option<String>,
    investment_type: Option<CategoryId>,
    platform: Option<String>,
    current_amount: Option<Amount>,
    invested_amount: Option<Amount>,
    description: Option<String>,
}

impl From<InvestmentRequestBody> for InvestmentDraft {
    fn from(body: InvestmentRequestBody) -> Self {
        InvestmentDraft {
            name: body.name,
            investment_type: body.investment_type,
            platform: body.platform,
            current_amount: body.current_amount,
            invested_amount: body.invested_amount,
            description: body.description,
        }
    }
}

async fn create_investment(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<InvestmentRequestBody>,
) -> Result<impl IntoResponse> {
    let record = state.investments.create(ctx.user_id, body.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Investment created successfully.", "investment": record })),
    ))
}

async fn get_investment(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse> {
    let (records, summary) = state.investments.list(ctx.user_id).await?;
    Ok(Json(json!({
        "message": "Investments retrieved successfully!",
        "investments": records,
        "summary": summary,
    })))
}

async fn update_investment(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(body): Json<InvestmentRequestBody>,
) -> Result<impl IntoResponse> {
    let id = InvestmentId::from_string(&id).map_err(|_| Error::NotFound { what: "Investment" })?;
    let record = state.investments.update(ctx.user_id, id, body.into()).await?;
    Ok(Json(json!({ "message": "Investment updated successfully!", "investment": record })))
}

async fn delete_investment(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = InvestmentId::from_string(&id).map_err(|_| Error::NotFound { what: "Investment" })?;
    state.investments.delete(ctx.user_id, id).await?;
    Ok(Json(json!({ "message": "Investment deleted successfully!" })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CategoryRequestBody {
    name: Option<String>,
    category_type: Option<CategoryKind>,
    icon_image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CategoryQuery {
    #[serde(rename = "type")]
    kind: Option<CategoryKind>,
}

async fn create_category(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<CategoryRequestBody>,
) -> Result<impl IntoResponse> {
    let record = state
        .categories
        .create(ctx.user_id, body.name, body.category_type, body.icon_image)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Category added successfully!", "category": record })),
    ))
}

async fn get_categories(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<CategoryQuery>,
) -> Result<impl IntoResponse> {
    let records = state.categories.list(ctx.user_id, query.kind).await?;
    Ok(Json(records))
}

async fn delete_category(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = CategoryId::from_string(&id).map_err(|_| Error::NotFound { what: "Category" })?;
    state.categories.delete(ctx.user_id, id).await?;
    Ok(Json(json!({ "message": "Category deleted successfully!" })))
}
