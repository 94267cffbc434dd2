use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertStatus {
    Pending,
    Sent,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Pending => "PENDING",
            AlertStatus::Sent => "SENT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub recipient: String,
    pub symbol: String,

    // 0 disables the bound
    pub min_price: f64,
    pub max_price: f64,

    pub active: bool,
    pub status: AlertStatus,
    pub expiry: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    /// Price fell to or below `min_price`.
    Downward,
    /// Price rose to or above `max_price`.
    Upward,
}

impl TriggerKind {
    pub fn label(&self) -> &'static str {
        match self {
            TriggerKind::Downward => "Price dropped",
            TriggerKind::Upward => "Price surged",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Alert {
    /// Only active Pending alerts are ever evaluated.
    pub fn is_candidate(&self) -> bool {
        self.active && self.status == AlertStatus::Pending
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry < now
    }

    /// An alert with both bounds disabled can never trigger.
    pub fn is_actionable(&self) -> bool {
        self.min_price > 0.0 || self.max_price > 0.0
    }

    /// Threshold check. The downward bound is checked first, so a degenerate
    /// alert with `min_price >= max_price` resolves to `Downward` when both hold.
    pub fn evaluate(&self, price: f64) -> Option<TriggerKind> {
        if self.min_price > 0.0 && price <= self.min_price {
            Some(TriggerKind::Downward)
        } else if self.max_price > 0.0 && price >= self.max_price {
            Some(TriggerKind::Upward)
        } else {
            None
        }
    }

    pub fn mark_sent(&mut self) {
        self.status = AlertStatus::Sent;
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn alert(min: f64, max: f64) -> Alert {
        Alert {
            id: "a1".to_string(),
            recipient: "user@example.com".to_string(),
            symbol: "BTCUSDT".to_string(),
            min_price: min,
            max_price: max,
            active: true,
            status: AlertStatus::Pending,
            expiry: Utc::now() + Duration::days(1),
        }
    }

    #[test]
    fn disabled_bounds_never_trigger() {
        let a = alert(0.0, 0.0);
        assert!(!a.is_actionable());
        for price in [0.0, 0.0001, 1.0, 90.0, 50_000.0, f64::MAX] {
            assert_eq!(a.evaluate(price), None, "price {price}");
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        assert_eq!(alert(100.0, 0.0).evaluate(100.0), Some(TriggerKind::Downward));
        assert_eq!(alert(0.0, 200.0).evaluate(200.0), Some(TriggerKind::Upward));
        assert_eq!(alert(100.0, 200.0).evaluate(150.0), None);
    }

    #[test]
    fn degenerate_range_prefers_downward() {
        assert_eq!(alert(100.0, 50.0).evaluate(60.0), Some(TriggerKind::Downward));
    }

    #[test]
    fn mark_sent_is_one_way() {
        let mut a = alert(1.0, 0.0);
        a.mark_sent();
        assert_eq!(a.status, AlertStatus::Sent);
        assert!(!a.active);
        assert!(!a.is_candidate());
    }

    #[test]
    fn status_wire_format() {
        assert_eq!(serde_json::to_string(&AlertStatus::Pending).unwrap(), "\"PENDING\"");
        let s: AlertStatus = serde_json::from_str("\"SENT\"").unwrap();
        assert_eq!(s, AlertStatus::Sent);
    }
}
