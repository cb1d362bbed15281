use lazy_static::lazy_static;
use prometheus::{Counter, Registry};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Ledger metrics
    pub static ref ENTRIES_CREATED: Counter = Counter::new(
        "ledger_entries_created_total",
        "Total number of ledger entries created"
    ).unwrap();

    pub static ref ENTRIES_MIRRORED: Counter = Counter::new(
        "ledger_entries_mirrored_total",
        "Total number of counterpart records written"
    ).unwrap();

    pub static ref MIRROR_WRITE_FAILURES: Counter = Counter::new(
        "ledger_mirror_write_failures_total",
        "Counterpart writes that failed and left the ledger unmirrored"
    ).unwrap();

    // Notification metrics
    pub static ref NOTIFICATIONS_SENT: Counter = Counter::new(
        "notifications_sent_total",
        "Total number of notification emails sent"
    ).unwrap();

    pub static ref NOTIFICATIONS_FAILED: Counter = Counter::new(
        "notifications_failed_total",
        "Notification emails that failed to send"
    ).unwrap();
}

pub fn register_metrics() {
    REGISTRY.register(Box::new(ENTRIES_CREATED.clone())).unwrap();
    REGISTRY.register(Box::new(ENTRIES_MIRRORED.clone())).unwrap();
    REGISTRY.register(Box::new(MIRROR_WRITE_FAILURES.clone())).unwrap();
    REGISTRY.register(Box::new(NOTIFICATIONS_SENT.clone())).unwrap();
    REGISTRY.register(Box::new(NOTIFICATIONS_FAILED.clone())).unwrap();
}
