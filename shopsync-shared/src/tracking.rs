use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::order::Order;
use crate::models::status::OrderStatus;

/// Which persisted tracking table a run pass feeds. Only paid and pending
/// orders are remembered between runs; the received pass is transient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedStatus {
    Paid,
    Pending,
}

impl TrackedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackedStatus::Paid => "paid",
            TrackedStatus::Pending => "pending",
        }
    }

    /// The marketplace listing status this table follows.
    pub fn order_status(&self) -> OrderStatus {
        match self {
            TrackedStatus::Paid => OrderStatus::Paid,
            TrackedStatus::Pending => OrderStatus::Pending,
        }
    }
}

impl std::fmt::Display for TrackedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flattened copy of the last-seen order plus the timestamp of the last
/// attempt that was not deferred to a retry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackingRecord {
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
    pub ts: DateTime<Utc>,
}

impl TrackingRecord {
    pub fn from_order(order: &Order, ts: DateTime<Utc>) -> Self {
        Self {
            fields: flatten_order(order),
            ts,
        }
    }

    pub fn with_ts(mut self, ts: DateTime<Utc>) -> Self {
        self.ts = ts;
        self
    }
}

/// One status category's persisted snapshot, keyed by order id.
pub type TrackingTable = BTreeMap<String, TrackingRecord>;

/// Flatten an order into dot-joined key/value pairs, the layout the
/// snapshot store expects (`delivery_option.name`, `payment_data.status`).
pub fn flatten_order(order: &Order) -> BTreeMap<String, Value> {
    let mut fields = BTreeMap::new();
    if let Ok(Value::Object(map)) = serde_json::to_value(order) {
        flatten_into(&mut fields, None, map);
    }
    fields
}

fn flatten_into(
    out: &mut BTreeMap<String, Value>,
    prefix: Option<&str>,
    map: serde_json::Map<String, Value>,
) {
    for (key, value) in map {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key,
        };
        match value {
            Value::Object(inner) => flatten_into(out, Some(&path), inner),
            other => {
                out.insert(path, other);
            }
        }
    }
}
