use serde::{Deserialize, Serialize};

use super::parties::Seller;

/// A settlement found by the search.
#[derive(Debug, Serialize, Deserialize)]
pub struct Settlement {
    pub settlement_id: String,
    pub status: SettlementStatus,
    pub sellers: Vec<Seller>,
    pub property: Property,
    /// Registered purchase price.
    pub purchase_price: Option<f64>,
    #[serde(skip)]
    pub internal_notes: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Property {
    pub property_id: String,
    pub municipality: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub enum SettlementStatus {
    Pending,
    #[serde(rename = "COMPLETED")]
    Completed,
    Cancelled,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: i32,
    pub message: String,
}
