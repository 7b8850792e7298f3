// core/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
  /// Cash on delivery, the only method offered at checkout.
  #[serde(rename = "COD")]
  Cod,
}

impl PaymentMethod {
  pub fn as_str(self) -> &'static str {
    match self {
      PaymentMethod::Cod => "COD",
    }
  }

  pub fn parse(raw: &str) -> Option<Self> {
    match raw.trim() {
      "COD" => Some(PaymentMethod::Cod),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingDetails {
  pub full_name: String,
  pub email: String,
  pub address: String,
  pub payment_method: PaymentMethod,
}

/// An immutable record of a checkout.
///
/// `cart_id` names the cart the order was taken from; that cart is deleted in
/// the same write that stores the order, so the reference never resolves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
  pub id: Uuid,
  pub cart_id: Uuid,
  pub owner_id: Option<Uuid>,
  pub total_price: Money,
  pub shipping: ShippingDetails,
  pub lines: Vec<OrderLine>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderLine {
  pub book_id: Uuid,
  pub title: String,
  pub quantity: u32,
  pub unit_price: Money,
  pub total_price: Money,
}
