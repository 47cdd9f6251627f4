// src/models/review.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Review {
    pub id: i64,
    pub place_id: i64,           // Place the review is attached to
    pub user_id: i64,            // Author of the review
    pub user_name: String,       // Author display name, joined from users
    pub rating: u8,              // 1..=5
    pub text: String,            // Body of the review
    pub created_at: DateTime<Utc>,
}
