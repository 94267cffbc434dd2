pub mod alert_monitor;
pub mod alert_store;
pub mod db_init;
pub mod evaluator;
pub mod mongo_store;
pub mod notifier;
pub mod price_chain;
pub mod providers;
pub mod supabase_store;
pub mod symbol_resolver;
