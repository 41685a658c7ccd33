use std::str::FromStr;

use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, Bson};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::slug_or_derive;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub kind: CategoryType,
    #[serde(default)]
    pub featured: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CategoryType {
    CarType,
    FuelType,
    Tag,
}

impl CategoryType {
    pub fn as_str(self) -> &'static str {
        match self {
            CategoryType::CarType => "carType",
            CategoryType::FuelType => "fuelType",
            CategoryType::Tag => "tag",
        }
    }
}

impl FromStr for CategoryType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "carType" => Ok(CategoryType::CarType),
            "fuelType" => Ok(CategoryType::FuelType),
            "tag" => Ok(CategoryType::Tag),
            other => Err(format!("Unknown category type: {}", other)),
        }
    }
}

impl From<CategoryType> for Bson {
    fn from(kind: CategoryType) -> Self {
        Bson::String(kind.as_str().to_string())
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryDto {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    pub slug: Option<String>,
    #[serde(rename = "type")]
    pub kind: CategoryType,
    pub featured: Option<bool>,
}

impl CreateCategoryDto {
    pub fn into_category(self, now: DateTime<Utc>) -> Category {
        Category {
            id: None,
            slug: slug_or_derive(self.slug.as_deref(), &self.name),
            name: self.name,
            kind: self.kind,
            featured: self.featured.unwrap_or(false),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryDto {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<CategoryType>,
    pub featured: Option<bool>,
}

impl UpdateCategoryDto {
    pub fn apply(self, category: &mut Category, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            category.name = name;
        }
        if let Some(slug) = self.slug {
            category.slug = slug_or_derive(Some(&slug), &category.name);
        }
        if let Some(kind) = self.kind {
            category.kind = kind;
        }
        if let Some(featured) = self.featured {
            category.featured = featured;
        }
        category.updated_at = now;
    }
}
