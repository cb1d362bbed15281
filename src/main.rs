use std::sync::Arc;
use std::time::Duration;
use anyhow::Context;
use peerledger::api::auth::JwtAuth;
use peerledger::api::rate_limit::RateLimiter;
use peerledger::api::rest::{create_router, AppState};
use peerledger::config::AppConfig;
use peerledger::finance::category::CategoryService;
use peerledger::finance::expense::ExpenseService;
use peerledger::finance::income::IncomeService;
use peerledger::finance::investment::InvestmentService;
use peerledger::ledger::engine::ReconciliationEngine;
use peerledger::observability;
use peerledger::store::memory::InMemoryStore;
use peerledger::utils::notify::TracingNotifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::tracing::init();
    observability::metrics::register_metrics();

    let env = std::env::var("PEERLEDGER_ENV").unwrap_or_else(|_| "development".to_string());
    let config = AppConfig::load(&env).context("failed to load configuration")?;

    let store = Arc::new(InMemoryStore::new());
    let notifier = Arc::new(TracingNotifier::new(&config.email));
    let engine = ReconciliationEngine::new(
        store.clone(),
        store.clone(),
        notifier,
        config.email.frontend_url.clone(),
    );

    let state = Arc::new(AppState {
        engine,
        expenses: ExpenseService::new(store.clone(), store.clone()),
        incomes: IncomeService::new(store.clone(), store.clone()),
        investments: InvestmentService::new(store.clone(), store.clone()),
        categories: CategoryService::new(store.clone()),
        identities: store.clone(),
        auth: JwtAuth::new(&config.auth.jwt_secret),
        rate_limiter: RateLimiter::new(
            config.rate_limit.max_requests,
            Duration::from_secs(config.rate_limit.window_secs),
        ),
    });

    let router = create_router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "peerledger listening");
    axum::serve(listener, router).await.context("server terminated")?;

    Ok(())
}
