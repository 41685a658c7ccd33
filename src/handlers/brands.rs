use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Utc;
use mongodb::bson::{doc, oid::ObjectId};
use validator::Validate;

use super::{created, deleted, ok, paginate, parse_id};
use crate::{
    errors::ApiError,
    filters::{BrandFilter, ListParams, QueryParams},
    middleware::RoleGate,
    models::brand::{Brand, CreateBrandDto, UpdateBrandDto},
    state::AppState,
};

// Name and slug are both unique across brands.
async fn ensure_unique(state: &AppState, brand: &Brand, except: Option<ObjectId>) -> Result<(), ApiError> {
    let mut filter = doc! { "$or": [ { "slug": brand.slug.as_str() }, { "name": brand.name.as_str() } ] };
    if let Some(id) = except {
        filter.insert("_id", doc! { "$ne": id });
    }
    if state.brands.find_one(filter).await?.is_some() {
        return Err(ApiError::conflict("Brand with this name or slug already exists"));
    }
    Ok(())
}

#[get("/brands")]
pub async fn list_brands(
    state: web::Data<AppState>,
    query: web::Query<QueryParams>,
) -> Result<HttpResponse, ApiError> {
    let filter = BrandFilter::from_query(&query);
    let params = ListParams::from_query(&query, BrandFilter::DEFAULTS);

    let page = paginate(state.brands.as_ref(), filter.to_document(), &params).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/brands", wrap = "RoleGate::admin()")]
pub async fn create_brand(
    state: web::Data<AppState>,
    brand_data: web::Json<CreateBrandDto>,
) -> Result<HttpResponse, ApiError> {
    brand_data.validate()?;

    let mut brand = brand_data.into_inner().into_brand(Utc::now());
    ensure_unique(&state, &brand, None).await?;

    brand.id = Some(state.brands.insert(&brand).await?);
    log::info!("Created brand {}", brand.slug);
    Ok(created(brand))
}

#[get("/brands/{id}")]
pub async fn get_brand(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let brand_id = parse_id(&id, "brand")?;
    let brand = state
        .brands
        .find_by_id(brand_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Brand not found"))?;
    Ok(ok(brand))
}

#[put("/brands/{id}", wrap = "RoleGate::admin()")]
pub async fn update_brand(
    state: web::Data<AppState>,
    id: web::Path<String>,
    brand_data: web::Json<UpdateBrandDto>,
) -> Result<HttpResponse, ApiError> {
    let brand_id = parse_id(&id, "brand")?;
    brand_data.validate()?;

    let mut brand = state
        .brands
        .find_by_id(brand_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Brand not found"))?;
    brand_data.into_inner().apply(&mut brand, Utc::now());
    ensure_unique(&state, &brand, Some(brand_id)).await?;

    if !state.brands.replace(brand_id, &brand).await? {
        return Err(ApiError::not_found("Brand not found"));
    }
    Ok(ok(brand))
}

#[delete("/brands/{id}", wrap = "RoleGate::admin()")]
pub async fn delete_brand(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let brand_id = parse_id(&id, "brand")?;
    if !state.brands.delete(brand_id).await? {
        return Err(ApiError::not_found("Brand not found"));
    }
    log::info!("Deleted brand {}", brand_id);
    Ok(deleted(brand_id))
}
