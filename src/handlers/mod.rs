pub mod auth;
pub mod brands;
pub mod cars;
pub mod categories;
pub mod reviews;
pub mod upload;

use actix_web::{web, HttpResponse};
use mongodb::bson::{oid::ObjectId, Document};
use serde::Serialize;
use serde_json::json;

use crate::db::Repository;
use crate::errors::ApiError;
use crate::filters::{ListParams, Page, Pagination};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(auth::login)
            .service(auth::register)
            .service(auth::verify)
            .service(auth::logout)
            // `/cars/list` has to win over `/cars/{id}`
            .service(cars::list_cars)
            .service(cars::car_selector)
            .service(cars::create_car)
            .service(cars::get_car)
            .service(cars::update_car)
            .service(cars::delete_car)
            .service(brands::list_brands)
            .service(brands::create_brand)
            .service(brands::get_brand)
            .service(brands::update_brand)
            .service(brands::delete_brand)
            .service(categories::list_categories)
            .service(categories::create_category)
            .service(categories::get_category)
            .service(categories::update_category)
            .service(categories::delete_category)
            .service(reviews::review_stats)
            .service(reviews::list_reviews)
            .service(reviews::create_review)
            .service(reviews::update_review)
            .service(reviews::moderate_review)
            .service(reviews::delete_review)
            .service(upload::upload_media)
            .service(upload::delete_media)
            .default_service(web::to(route_not_found)),
    );
}

/// Malformed or mistyped JSON bodies answer 400 in the usual error envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(256 * 1024)
        .error_handler(|err, _req| ApiError::bad_request(err.to_string()).into())
}

async fn route_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "error": "Route not found" }))
}

#[derive(Serialize)]
struct Envelope<T> {
    data: T,
}

pub(crate) fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(Envelope { data })
}

pub(crate) fn created<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Created().json(Envelope { data })
}

pub(crate) fn parse_id(raw: &str, resource: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("Invalid {} id", resource)))
}

pub(crate) async fn paginate<T>(
    repository: &dyn Repository<T>,
    filter: Document,
    params: &ListParams,
) -> Result<Page<T>, ApiError> {
    let total = repository.count(filter.clone()).await?;
    let data = repository.find(filter, params.find_spec()).await?;
    Ok(Page {
        data,
        pagination: Pagination::new(params, total),
    })
}

pub(crate) fn deleted(id: ObjectId) -> HttpResponse {
    ok(json!({ "_id": id.to_hex(), "deleted": true }))
}
