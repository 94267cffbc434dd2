pub mod alert;
pub mod quote;

pub use alert::{Alert, AlertStatus, TriggerKind};
pub use quote::Quote;
