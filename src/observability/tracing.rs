use tracing::Span;
use tracing_subscriber::EnvFilter;
use crate::ledger::record::Direction;

pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

pub fn ledger_span(operation: &'static str, direction: Direction) -> Span {
    tracing::info_span!(
        "ledger",
        operation,
        direction = ?direction,
    )
}
