// src/models/place.rs
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Place {
    pub id: i64,
    pub name: String,
    pub address: String,
}

/// A place together with the mean of all its ratings, `None` when nobody
/// has reviewed it yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceSummary {
    pub place: Place,
    pub average_rating: Option<f64>,
}
