use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Utc;
use mongodb::bson::{doc, Document};
use validator::Validate;

use super::{created, deleted, ok, paginate, parse_id};
use crate::{
    db::{FindSpec, SortOrder},
    errors::ApiError,
    filters::{CarFilter, ListParams, QueryParams},
    middleware::RoleGate,
    models::{
        car::{CarSummary, CreateCarDto, UpdateCarDto},
        user::User,
    },
    state::AppState,
};

#[get("/cars")]
pub async fn list_cars(
    state: web::Data<AppState>,
    query: web::Query<QueryParams>,
) -> Result<HttpResponse, ApiError> {
    let filter = CarFilter::from_query(&query);
    let params = ListParams::from_query(&query, CarFilter::DEFAULTS);

    let page = paginate(state.cars.as_ref(), filter.to_document(), &params).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/cars/list")]
pub async fn car_selector(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let cars = state
        .cars
        .find(Document::new(), FindSpec::sorted("name", SortOrder::Asc))
        .await?;
    let summaries: Vec<CarSummary> = cars.into_iter().map(CarSummary::from).collect();
    Ok(ok(summaries))
}

#[post("/cars", wrap = "RoleGate::admin()")]
pub async fn create_car(
    state: web::Data<AppState>,
    admin: web::ReqData<User>,
    car_data: web::Json<CreateCarDto>,
) -> Result<HttpResponse, ApiError> {
    // Validate input
    car_data.validate()?;

    let mut car = car_data.into_inner().into_car(Utc::now());
    car.id = Some(state.cars.insert(&car).await?);
    log::info!("{} added car {:?} ({})", admin.email, car.id, car.name);

    Ok(created(car))
}

#[get("/cars/{id}")]
pub async fn get_car(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let car_id = parse_id(&id, "car")?;
    let car = state
        .cars
        .find_by_id(car_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Car not found"))?;
    Ok(ok(car))
}

#[put("/cars/{id}", wrap = "RoleGate::admin()")]
pub async fn update_car(
    state: web::Data<AppState>,
    id: web::Path<String>,
    car_data: web::Json<UpdateCarDto>,
) -> Result<HttpResponse, ApiError> {
    let car_id = parse_id(&id, "car")?;
    car_data.validate()?;

    let mut car = state
        .cars
        .find_by_id(car_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Car not found"))?;
    car_data.into_inner().apply(&mut car, Utc::now());

    if !state.cars.replace(car_id, &car).await? {
        return Err(ApiError::not_found("Car not found"));
    }
    Ok(ok(car))
}

#[delete("/cars/{id}", wrap = "RoleGate::admin()")]
pub async fn delete_car(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let car_id = parse_id(&id, "car")?;
    if !state.cars.delete(car_id).await? {
        return Err(ApiError::not_found("Car not found"));
    }

    // Reviews of a removed car are orphaned
    let removed = state.reviews.delete_many(doc! { "carId": car_id }).await?;
    log::info!("Deleted car {} and {} review(s)", car_id, removed);

    Ok(deleted(car_id))
}

#[cfg(test)]
mod tests {
    use crate::models::user::UserRole;
    use crate::test_support::{bearer, id_of, test_app, TestContext};
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    fn huracan() -> Value {
        json!({
            "brand": "Lamborghini",
            "model": "Huracan",
            "name": "Huracan EVO Spyder",
            "year": 2023,
            "transmission": "automatic",
            "fuel": "petrol",
            "mileage": 3200,
            "dailyPrice": 1450.0,
            "images": ["https://media.test/huracan-front.jpg"],
            "category": "convertible"
        })
    }

    #[actix_web::test]
    async fn create_then_fetch_round_trips() {
        let ctx = TestContext::new();
        let token = ctx.token_for(UserRole::Admin).await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/cars")
            .insert_header(bearer(&token))
            .set_json(huracan())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        let id = id_of(&created["data"]);

        let req = test::TestRequest::get().uri(&format!("/api/cars/{}", id)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let fetched: Value = test::read_body_json(resp).await;

        for (field, expected) in huracan().as_object().unwrap() {
            assert_eq!(&fetched["data"][field], expected, "field {}", field);
        }
        assert_eq!(fetched["data"]["available"], true);
        assert_eq!(fetched["data"]["featured"], false);
    }

    #[actix_web::test]
    async fn mutations_require_a_token() {
        let ctx = TestContext::new();
        let car = ctx.seed_car("Roma", "Ferrari", 900.0).await;
        let app = test_app!(ctx);
        let path = format!("/api/cars/{}", car.id.unwrap().to_hex());

        let requests = vec![
            test::TestRequest::post().uri("/api/cars").set_json(huracan()),
            // a malformed body still answers 401 first
            test::TestRequest::post()
                .uri("/api/cars")
                .insert_header(("content-type", "application/json"))
                .set_payload("{not json"),
            test::TestRequest::put().uri(&path).set_json(json!({ "dailyPrice": 1.0 })),
            test::TestRequest::delete().uri(&path),
        ];
        for req in requests {
            let resp = test::call_service(&app, req.to_request()).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        }

        let req = test::TestRequest::delete()
            .uri(&path)
            .insert_header(bearer("expired.or.forged"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn rejects_invalid_car_payloads() {
        let ctx = TestContext::new();
        let token = ctx.token_for(UserRole::SuperAdmin).await;
        let app = test_app!(ctx);

        let mut missing_name = huracan();
        missing_name.as_object_mut().unwrap().remove("name");
        let mut negative_price = huracan();
        negative_price["dailyPrice"] = json!(-5.0);

        for body in [missing_name, negative_price] {
            let req = test::TestRequest::post()
                .uri("/api/cars")
                .insert_header(bearer(&token))
                .set_json(body)
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[actix_web::test]
    async fn lists_with_filters_and_pagination() {
        let ctx = TestContext::new();
        ctx.seed_car("Roma", "Ferrari", 900.0).await;
        ctx.seed_car("296 GTB", "Ferrari", 1600.0).await;
        ctx.seed_car("Cullinan", "Rolls-Royce", 2200.0).await;
        let app = test_app!(ctx);

        let req = test::TestRequest::get()
            .uri("/api/cars?brand=Ferrari&maxPrice=1000")
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["pagination"]["total"], 1);
        assert_eq!(body["data"][0]["name"], "Roma");

        let req = test::TestRequest::get()
            .uri("/api/cars?sortBy=dailyPrice&sortOrder=desc&limit=2&page=1")
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["pagination"]["total"], 3);
        assert_eq!(body["pagination"]["totalPages"], 2);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"][0]["name"], "Cullinan");

        let req = test::TestRequest::get().uri("/api/cars?search=gtb").to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["data"][0]["name"], "296 GTB");

        // non-numeric bounds are ignored rather than rejected
        let req = test::TestRequest::get().uri("/api/cars?minPrice=cheap").to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["pagination"]["total"], 3);
    }

    #[actix_web::test]
    async fn page_far_past_the_end_is_empty() {
        let ctx = TestContext::new();
        ctx.seed_car("Roma", "Ferrari", 900.0).await;
        let app = test_app!(ctx);

        let req = test::TestRequest::get().uri("/api/cars?page=1e18").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["data"].as_array().unwrap().is_empty());
        assert_eq!(body["pagination"]["total"], 1);
    }

    #[actix_web::test]
    async fn token_of_a_deleted_user_is_invalid() {
        let ctx = TestContext::new();
        let admin = ctx.seed_user("gone@example.com", UserRole::Admin).await;
        let token = ctx.tokens.issue(&admin).unwrap();
        let car = ctx.seed_car("Roma", "Ferrari", 900.0).await;
        assert!(ctx.state.users.delete(admin.id.unwrap()).await.unwrap());
        let app = test_app!(ctx);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/cars/{}", car.id.unwrap().to_hex()))
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Invalid token" }));
        assert!(ctx.state.cars.find_by_id(car.id.unwrap()).await.unwrap().is_some());
    }

    #[actix_web::test]
    async fn selector_list_is_not_shadowed_by_id_route() {
        let ctx = TestContext::new();
        ctx.seed_car("Roma", "Ferrari", 900.0).await;
        ctx.seed_car("Cullinan", "Rolls-Royce", 2200.0).await;
        let app = test_app!(ctx);

        let req = test::TestRequest::get().uri("/api/cars/list").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"][0]["name"], "Cullinan");
        assert!(body["data"][0].get("dailyPrice").is_none());
    }

    #[actix_web::test]
    async fn update_and_delete_cascade_reviews() {
        let ctx = TestContext::new();
        let token = ctx.token_for(UserRole::Admin).await;
        let car = ctx.seed_car("Roma", "Ferrari", 900.0).await;
        let app = test_app!(ctx);
        let car_id = car.id.unwrap().to_hex();

        let req = test::TestRequest::post()
            .uri("/api/reviews")
            .set_json(json!({
                "carId": car_id,
                "userName": "Sam",
                "rating": 5,
                "title": "Superb",
                "comment": "Smooth ride"
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::put()
            .uri(&format!("/api/cars/{}", car_id))
            .insert_header(bearer(&token))
            .set_json(json!({ "dailyPrice": 950.0, "featured": true }))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["data"]["dailyPrice"], 950.0);
        assert_eq!(body["data"]["featured"], true);
        assert_eq!(body["data"]["name"], "Roma");

        let req = test::TestRequest::delete()
            .uri(&format!("/api/cars/{}", car_id))
            .insert_header(bearer(&token))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        assert_eq!(ctx.state.reviews.count(mongodb::bson::doc! {}).await.unwrap(), 0);

        let req = test::TestRequest::get().uri(&format!("/api/cars/{}", car_id)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn malformed_ids_are_bad_requests() {
        let ctx = TestContext::new();
        let app = test_app!(ctx);

        let req = test::TestRequest::get().uri("/api/cars/not-an-id").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
