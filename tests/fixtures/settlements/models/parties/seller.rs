use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Seller {
    #[serde(rename = "personalNumber")]
    pub personal_number: String,
    pub share: Option<f64>,
}
