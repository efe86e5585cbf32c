//! Response model for the orders endpoints.
//!
//! # Design
//! Every struct decodes with `#[serde(default)]` so partial bodies from the
//! service still decode, and `Default` yields the empty order. Timestamps the
//! service leaves out or sends as `null` decode to `None`, and `null` lists
//! decode as empty.

use chrono::{DateTime, Utc};
use serde::de::value::StrDeserializer;
use serde::de::IntoDeserializer;
use serde::{Deserialize, Deserializer, Serialize};

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Cancelled,
    Queued,
    AwaitingFulfillment,
    Fulfilled,
    /// A state this client does not know yet. The order itself still decodes.
    #[serde(other)]
    Unknown,
}

/// An order as returned by `POST /orders` and `GET /orders/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    pub success: bool,
    pub data: OrderData,
}

impl Order {
    pub fn id(&self) -> &str {
        &self.data.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderData {
    pub object: String,
    pub id: String,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    /// Total price in cents.
    pub total: i64,
    pub webhook: String,
    #[serde(rename = "lineitems", deserialize_with = "null_as_default")]
    pub line_items: Vec<LineItem>,
    pub account: String,
    pub customer_reference: String,
    pub channel: String,
    pub test_mode: bool,
    #[serde(deserialize_with = "empty_as_none")]
    pub state: Option<OrderStatus>,
    pub cancelled: Option<DateTime<Utc>>,
    pub cancellation_reason: String,
}

impl OrderData {
    pub fn is_cancelled(&self) -> bool {
        self.state == Some(OrderStatus::Cancelled)
    }
}

/// One physical mailpiece of an order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItem {
    pub id: String,
    pub pagecount: u32,
    pub to: Address,
    pub from: Address,
    pub simplex: bool,
    pub color: bool,
    pub service: String,
    #[serde(deserialize_with = "null_as_default")]
    pub pricing: Vec<PricingEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub name: String,
    pub organization: String,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
    pub formatted: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingEntry {
    #[serde(rename = "type")]
    pub kind: String,
    /// Amount in cents.
    pub value: i64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<OrderStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => {
            let de: StrDeserializer<'_, D::Error> = s.into_deserializer();
            OrderStatus::deserialize(de).map(Some)
        }
    }
}
