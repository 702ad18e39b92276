//! Typed models for the EasyPost shipping API

use serde::{Deserialize, Serialize};

/// A postal address
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub street1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Parcel dimensions (inches) and weight (ounces)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Parcel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    pub weight: f64,
}

/// A carrier rate quoted for a shipment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rate {
    pub id: String,
    pub carrier: String,
    pub service: String,
    pub rate: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_days: Option<u32>,
}

/// A purchased shipping label
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostageLabel {
    pub id: String,
    pub label_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_file_type: Option<String>,
}

/// A shipment: addresses, parcel, quoted rates, and (after purchase) label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub to_address: Address,
    pub from_address: Address,
    pub parcel: Parcel,
    #[serde(default)]
    pub rates: Vec<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postage_label: Option<PostageLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_code: Option<String>,
}

/// A package tracker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tracker {
    pub id: String,
    pub tracking_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
}

/// Address verification outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedAddress {
    #[serde(flatten)]
    pub address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verifications: Option<serde_json::Value>,
}

/// Request payload for creating a shipment
#[derive(Debug, Clone, Serialize)]
pub struct CreateShipmentRequest {
    pub to_address: Address,
    pub from_address: Address,
    pub parcel: Parcel,
}

/// Request payload for creating a tracker
#[derive(Debug, Clone, Serialize)]
pub struct CreateTrackerRequest {
    pub tracking_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
}
