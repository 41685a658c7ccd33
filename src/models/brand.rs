use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::slug_or_derive;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub logo: String,
    pub slug: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBrandDto {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Logo is required"))]
    pub logo: String,
    pub slug: Option<String>,
    pub featured: Option<bool>,
}

impl CreateBrandDto {
    pub fn into_brand(self, now: DateTime<Utc>) -> Brand {
        Brand {
            id: None,
            slug: slug_or_derive(self.slug.as_deref(), &self.name),
            name: self.name,
            logo: self.logo,
            featured: self.featured.unwrap_or(false),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBrandDto {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub logo: Option<String>,
    pub slug: Option<String>,
    pub featured: Option<bool>,
}

impl UpdateBrandDto {
    pub fn apply(self, brand: &mut Brand, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            brand.name = name;
        }
        if let Some(logo) = self.logo {
            brand.logo = logo;
        }
        if let Some(slug) = self.slug {
            brand.slug = slug_or_derive(Some(&slug), &brand.name);
        }
        if let Some(featured) = self.featured {
            brand.featured = featured;
        }
        brand.updated_at = now;
    }
}
