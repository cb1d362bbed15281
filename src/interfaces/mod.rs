pub mod category_directory;
pub mod finance_store;
pub mod identity;
pub mod loan_store;
pub mod notifier;
