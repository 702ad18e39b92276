//! Typed models for the Veeqo inventory API

use serde::{Deserialize, Serialize};

/// Stock held for a sellable at one warehouse
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockEntry {
    pub sellable_id: u64,
    pub warehouse_id: u64,
    pub physical_stock_level: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_stock_level: Option<i64>,
}

/// A sellable variant of a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sellable {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default)]
    pub stock_entries: Vec<StockEntry>,
}

/// A product with its sellables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub sellables: Vec<Sellable>,
}

/// A line item on an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub sellable_id: u64,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_unit: Option<String>,
}

/// A customer order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_price: Option<String>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

/// Request payload for creating an order
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest {
    pub channel_id: u64,
    pub customer_id: u64,
    pub line_items: Vec<LineItem>,
}

/// Request payload for a stock level update
#[derive(Debug, Clone, Serialize)]
pub struct UpdateStockRequest {
    pub physical_stock_level: i64,
}
