//! Address and shipping value types.

use serde::{Deserialize, Serialize};

use super::id::MemberId;

/// A postal address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub zip_code: String,
    pub address1: String,
    #[serde(default)]
    pub address2: String,
}

/// Who receives a shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receiver {
    pub name: String,
    pub phone: String,
}

/// Where and to whom an order ships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub receiver: Receiver,
    pub address: Address,
}

/// The member an order was placed by, captured at placement time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Orderer {
    pub member_id: MemberId,
    pub name: String,
}
