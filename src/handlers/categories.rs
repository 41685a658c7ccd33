use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Utc;
use mongodb::bson::{doc, oid::ObjectId};
use validator::Validate;

use super::{created, deleted, ok, paginate, parse_id};
use crate::{
    errors::ApiError,
    filters::{CategoryFilter, ListParams, QueryParams},
    middleware::RoleGate,
    models::category::{Category, CreateCategoryDto, UpdateCategoryDto},
    state::AppState,
};

async fn ensure_unique_slug(
    state: &AppState,
    category: &Category,
    except: Option<ObjectId>,
) -> Result<(), ApiError> {
    let mut filter = doc! { "slug": category.slug.as_str() };
    if let Some(id) = except {
        filter.insert("_id", doc! { "$ne": id });
    }
    if state.categories.find_one(filter).await?.is_some() {
        return Err(ApiError::conflict("Category with this slug already exists"));
    }
    Ok(())
}

#[get("/categories")]
pub async fn list_categories(
    state: web::Data<AppState>,
    query: web::Query<QueryParams>,
) -> Result<HttpResponse, ApiError> {
    let filter = CategoryFilter::from_query(&query);
    let params = ListParams::from_query(&query, CategoryFilter::DEFAULTS);

    let page = paginate(state.categories.as_ref(), filter.to_document(), &params).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/categories", wrap = "RoleGate::admin()")]
pub async fn create_category(
    state: web::Data<AppState>,
    category_data: web::Json<CreateCategoryDto>,
) -> Result<HttpResponse, ApiError> {
    category_data.validate()?;

    let mut category = category_data.into_inner().into_category(Utc::now());
    ensure_unique_slug(&state, &category, None).await?;

    category.id = Some(state.categories.insert(&category).await?);
    log::info!("Created {} category {}", category.kind.as_str(), category.slug);
    Ok(created(category))
}

#[get("/categories/{id}")]
pub async fn get_category(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let category_id = parse_id(&id, "category")?;
    let category = state
        .categories
        .find_by_id(category_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;
    Ok(ok(category))
}

#[put("/categories/{id}", wrap = "RoleGate::admin()")]
pub async fn update_category(
    state: web::Data<AppState>,
    id: web::Path<String>,
    category_data: web::Json<UpdateCategoryDto>,
) -> Result<HttpResponse, ApiError> {
    let category_id = parse_id(&id, "category")?;
    category_data.validate()?;

    let mut category = state
        .categories
        .find_by_id(category_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;
    category_data.into_inner().apply(&mut category, Utc::now());
    ensure_unique_slug(&state, &category, Some(category_id)).await?;

    if !state.categories.replace(category_id, &category).await? {
        return Err(ApiError::not_found("Category not found"));
    }
    Ok(ok(category))
}

#[delete("/categories/{id}", wrap = "RoleGate::admin()")]
pub async fn delete_category(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let category_id = parse_id(&id, "category")?;
    if !state.categories.delete(category_id).await? {
        return Err(ApiError::not_found("Category not found"));
    }
    log::info!("Deleted category {}", category_id);
    Ok(deleted(category_id))
}
