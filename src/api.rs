use actix_web::{web, HttpResponse};
use rusqlite::ErrorCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::{
    auth::{generate_token, hash_password, verify_password, AuthenticatedUser},
    db::Database,
    error::ApiError,
    forms::{AddReviewForm, LoginForm, RegisterForm},
    ranking::{order_reviews, parse_min_rating, search},
    serializers::{PlaceDetailOut, PlaceOut, RegisterOut, ReviewOut, TokenOut, UserOut},
};

const DUPLICATE_PHONE: &str = "user with this phone number already exists.";

#[derive(Deserialize, Debug)]
pub struct SearchParams {
    pub query: Option<String>,
    pub min_rating: Option<String>,
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

pub async fn api_root() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": "Welcome to the Place Review API",
        "endpoints": {
            "register": "/api/register/",
            "login": "/api/login/",
            "reviews": "/api/reviews/",
            "search": "/api/places/search/",
            "detail": "/api/places/<id>/"
        }
    }))
}

pub async fn register(db: web::Data<Database>, body: web::Json<Value>) -> Result<HttpResponse, ApiError> {
    let form = RegisterForm::parse(&body)?;

    if db.get_user_by_phone(&form.phone_number).await?.is_some() {
        return Err(ApiError::field("phone_number", DUPLICATE_PHONE));
    }

    let password_hash = hash_password(&form.password).map_err(|e| {
        error!("[API] Password hashing failed: {}", e);
        ApiError::Internal("password hashing failed")
    })?;

    let user = db
        .insert_user(&form.phone_number, &form.name, &password_hash)
        .await
        .map_err(|e| {
            if is_constraint_violation(&e) {
                // Lost a race with another registration for the same phone
                ApiError::field("phone_number", DUPLICATE_PHONE)
            } else {
                ApiError::from(e)
            }
        })?;
    let token = db.get_or_create_token(user.id, &generate_token()).await?;

    info!("[API] Registered user {}", user.id);
    Ok(HttpResponse::Created().json(RegisterOut {
        user_id: user.id,
        token,
        user: UserOut::from(&user),
    }))
}

pub async fn login(db: web::Data<Database>, body: web::Json<Value>) -> Result<HttpResponse, ApiError> {
    let form = LoginForm::parse(&body)?;

    let user = match db.get_user_by_phone(&form.username).await? {
        Some(user) if verify_password(&form.password, &user.password_hash) => user,
        _ => {
            warn!("[API] Failed login attempt");
            return Err(ApiError::InvalidCredentials);
        }
    };

    let token = db.get_or_create_token(user.id, &generate_token()).await?;
    debug!("[API] User {} logged in", user.id);
    Ok(HttpResponse::Ok().json(TokenOut { token }))
}

pub async fn create_review(
    AuthenticatedUser(user): AuthenticatedUser,
    db: web::Data<Database>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let form = AddReviewForm::parse(&body)?;

    let review = db
        .submit_review(&form.place_name, &form.address, user.id, form.rating, &form.review_text)
        .await?;

    info!("[API] User {} reviewed place {}", user.id, review.place_id);
    Ok(HttpResponse::Created().json(ReviewOut::from(review)))
}

pub async fn search_places(
    _user: AuthenticatedUser,
    db: web::Data<Database>,
    params: web::Query<SearchParams>,
) -> Result<HttpResponse, ApiError> {
    let min_rating = parse_min_rating(params.min_rating.as_deref());
    if params.min_rating.is_some() && min_rating.is_none() {
        debug!("[API] Ignoring unparsable min_rating {:?}", params.min_rating);
    }

    let places = db.list_place_summaries().await?;
    let results: Vec<PlaceOut> = search(places, params.query.as_deref(), min_rating)
        .into_iter()
        .map(PlaceOut::from)
        .collect();

    debug!("[API] Search {:?} returned {} places", params.query, results.len());
    Ok(HttpResponse::Ok().json(results))
}

pub async fn place_detail(
    AuthenticatedUser(viewer): AuthenticatedUser,
    db: web::Data<Database>,
    place_id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let place_id = place_id.into_inner();
    let place = db.get_place(place_id).await?.ok_or(ApiError::NotFound)?;

    let reviews = order_reviews(db.get_reviews_for_place(place_id).await?, viewer.id);
    Ok(HttpResponse::Ok().json(PlaceDetailOut::new(place, reviews)))
}
