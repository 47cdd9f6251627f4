//! Place review backend.
//!
//! Users register, log in for an API token, post reviews for places (a
//! place is created the first time someone reviews it), search places by
//! name and minimum average rating, and read a place's reviews with their
//! own reviews listed first.
//!
//! Everything is served by actix-web on top of a single SQLite database.
//! See [`ranking`] for the search and ordering rules.
use actix_web::{error::JsonPayloadError, web, HttpRequest};

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod models;
pub mod ranking;
pub mod serializers;

use error::ApiError;

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::non_field(format!("JSON parse error - {err}")).into()
}

/// Registers the `/api` routes. Shared by the server binary and the tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .content_type_required(false)
            .error_handler(json_error),
    )
    .service(
        web::scope("/api")
            .route("/", web::get().to(api::api_root))
            .route("/register/", web::post().to(api::register))
            .route("/login/", web::post().to(api::login))
            .route("/reviews/", web::post().to(api::create_review))
            .route("/places/search/", web::get().to(api::search_places))
            .route("/places/{id}/", web::get().to(api::place_detail)),
    );
}
