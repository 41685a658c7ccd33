use actix_web::{delete, get, patch, post, put, web, HttpRequest, HttpResponse};
use chrono::Utc;
use mongodb::bson::{doc, oid::ObjectId};
use validator::Validate;

use super::{created, deleted, ok, paginate, parse_id};
use crate::{
    db::FindSpec,
    errors::ApiError,
    filters::{ListParams, QueryParams, ReviewFilter},
    middleware::{gate::verify_user, Credentials, RoleGate},
    models::review::{CreateReviewDto, ModerateReviewDto, Review, ReviewStats, UpdateReviewDto},
    state::AppState,
};

async fn load_review(state: &AppState, raw_id: &str) -> Result<(ObjectId, Review), ApiError> {
    let review_id = parse_id(raw_id, "review")?;
    let review = state
        .reviews
        .find_by_id(review_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Review not found"))?;
    Ok((review_id, review))
}

async fn store_review(
    state: &AppState,
    review_id: ObjectId,
    review: &Review,
) -> Result<(), ApiError> {
    if !state.reviews.replace(review_id, review).await? {
        return Err(ApiError::not_found("Review not found"));
    }
    Ok(())
}

#[get("/reviews")]
pub async fn list_reviews(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<QueryParams>,
) -> Result<HttpResponse, ApiError> {
    let credentials = Credentials::of(&req);
    let is_admin = match credentials {
        Credentials::Missing => false,
        _ => verify_user(&credentials, state.users.as_ref())
            .await
            .map(|user| user.role.is_admin())
            .unwrap_or(false),
    };

    let mut filter = ReviewFilter::from_query(&query);
    if !is_admin {
        filter = filter.approved_only();
    }
    let params = ListParams::from_query(&query, ReviewFilter::DEFAULTS);

    let page = paginate(state.reviews.as_ref(), filter.to_document(), &params).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/reviews")]
pub async fn create_review(
    state: web::Data<AppState>,
    review_data: web::Json<CreateReviewDto>,
) -> Result<HttpResponse, ApiError> {
    // Validate input
    review_data.validate()?;
    let car_id = parse_id(&review_data.car_id, "car")?;

    if state.cars.find_by_id(car_id).await?.is_none() {
        return Err(ApiError::not_found("Car not found"));
    }

    let mut review = review_data.into_inner().into_review(car_id, Utc::now());
    review.id = Some(state.reviews.insert(&review).await?);
    log::info!("Review {:?} submitted for car {}", review.id, car_id);

    Ok(created(review))
}

#[put("/reviews/{id}", wrap = "RoleGate::admin()")]
pub async fn update_review(
    state: web::Data<AppState>,
    id: web::Path<String>,
    review_data: web::Json<UpdateReviewDto>,
) -> Result<HttpResponse, ApiError> {
    review_data.validate()?;
    let (review_id, mut review) = load_review(&state, &id).await?;

    review_data.into_inner().apply(&mut review, Utc::now());
    store_review(&state, review_id, &review).await?;
    Ok(ok(review))
}

#[patch("/reviews/{id}", wrap = "RoleGate::admin()")]
pub async fn moderate_review(
    state: web::Data<AppState>,
    id: web::Path<String>,
    moderation: web::Json<ModerateReviewDto>,
) -> Result<HttpResponse, ApiError> {
    if moderation.is_empty() {
        return Err(ApiError::bad_request("Provide isApproved and/or isFeatured"));
    }
    let (review_id, mut review) = load_review(&state, &id).await?;

    moderation.into_inner().apply(&mut review, Utc::now());
    store_review(&state, review_id, &review).await?;
    log::info!(
        "Review {} moderated: approved={} featured={}",
        review_id,
        review.is_approved,
        review.is_featured
    );
    Ok(ok(review))
}

#[delete("/reviews/{id}", wrap = "RoleGate::admin()")]
pub async fn delete_review(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let review_id = parse_id(&id, "review")?;
    if !state.reviews.delete(review_id).await? {
        return Err(ApiError::not_found("Review not found"));
    }
    Ok(deleted(review_id))
}

#[get("/reviews/stats/{car_id}")]
pub async fn review_stats(
    state: web::Data<AppState>,
    car_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let car_id = parse_id(&car_id, "car")?;
    let reviews = state
        .reviews
        .find(doc! { "carId": car_id, "isApproved": true }, FindSpec::default())
        .await?;
    Ok(ok(ReviewStats::from_reviews(car_id, &reviews)))
}
