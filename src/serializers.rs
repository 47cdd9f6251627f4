// Response shapes for the HTTP API
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    models::{
        place::{Place, PlaceSummary},
        review::Review,
        user::User,
    },
    ranking::average_rating,
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserOut {
    pub id: i64,
    pub name: String,
    pub phone_number: String,
}

impl From<&User> for UserOut {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            phone_number: user.phone_number.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReviewOut {
    pub id: i64,
    pub user_name: String,
    pub rating: u8,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<Review> for ReviewOut {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            user_name: review.user_name,
            rating: review.rating,
            text: review.text,
            created_at: review.created_at,
        }
    }
}

/// Search result row. Places nobody reviewed report `0.0`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlaceOut {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub average_rating: f64,
}

impl From<PlaceSummary> for PlaceOut {
    fn from(summary: PlaceSummary) -> Self {
        Self {
            id: summary.place.id,
            name: summary.place.name,
            address: summary.place.address,
            average_rating: summary.average_rating.unwrap_or(0.0),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlaceDetailOut {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub average_rating: f64,
    pub reviews: Vec<ReviewOut>,
}

impl PlaceDetailOut {
    // `reviews` must already be in display order
    pub fn new(place: Place, reviews: Vec<Review>) -> Self {
        Self {
            id: place.id,
            name: place.name,
            address: place.address,
            average_rating: average_rating(&reviews),
            reviews: reviews.into_iter().map(ReviewOut::from).collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RegisterOut {
    pub user_id: i64,
    pub token: String,
    pub user: UserOut,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TokenOut {
    pub token: String,
}
