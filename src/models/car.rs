use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub brand: String,
    pub model: String,
    pub name: String,
    pub year: i32,
    pub transmission: String,
    pub fuel: String,
    pub mileage: i64,
    pub daily_price: f64,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

fn default_available() -> bool {
    true
}

/// Trimmed-down car used by selectors (`GET /cars/list`).
#[derive(Debug, Serialize)]
pub struct CarSummary {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub brand: String,
    pub model: String,
}

impl From<Car> for CarSummary {
    fn from(car: Car) -> Self {
        CarSummary {
            id: car.id,
            name: car.name,
            brand: car.brand,
            model: car.model,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCarDto {
    #[validate(length(min = 1, message = "Brand is required"))]
    pub brand: String,
    #[validate(length(min = 1, message = "Model is required"))]
    pub model: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(range(min = 1900, max = 2100))]
    pub year: i32,
    #[validate(length(min = 1))]
    pub transmission: String,
    #[validate(length(min = 1))]
    pub fuel: String,
    #[validate(range(min = 0))]
    pub mileage: i64,
    #[validate(range(min = 0.0))]
    pub daily_price: f64,
    #[serde(default)]
    pub images: Vec<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub available: Option<bool>,
}

impl CreateCarDto {
    pub fn into_car(self, now: DateTime<Utc>) -> Car {
        Car {
            id: None,
            brand: self.brand,
            model: self.model,
            name: self.name,
            year: self.year,
            transmission: self.transmission,
            fuel: self.fuel,
            mileage: self.mileage,
            daily_price: self.daily_price,
            images: self.images,
            description: self.description,
            category: self.category,
            featured: self.featured.unwrap_or(false),
            available: self.available.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Deserialize, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCarDto {
    #[validate(length(min = 1))]
    pub brand: Option<String>,
    #[validate(length(min = 1))]
    pub model: Option<String>,
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(range(min = 1900, max = 2100))]
    pub year: Option<i32>,
    #[validate(length(min = 1))]
    pub transmission: Option<String>,
    #[validate(length(min = 1))]
    pub fuel: Option<String>,
    #[validate(range(min = 0))]
    pub mileage: Option<i64>,
    #[validate(range(min = 0.0))]
    pub daily_price: Option<f64>,
    pub images: Option<Vec<String>>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub available: Option<bool>,
}

impl UpdateCarDto {
    pub fn apply(self, car: &mut Car, now: DateTime<Utc>) {
        if let Some(brand) = self.brand {
            car.brand = brand;
        }
        if let Some(model) = self.model {
            car.model = model;
        }
        if let Some(name) = self.name {
            car.name = name;
        }
        if let Some(year) = self.year {
            car.year = year;
        }
        if let Some(transmission) = self.transmission {
            car.transmission = transmission;
        }
        if let Some(fuel) = self.fuel {
            car.fuel = fuel;
        }
        if let Some(mileage) = self.mileage {
            car.mileage = mileage;
        }
        if let Some(daily_price) = self.daily_price {
            car.daily_price = daily_price;
        }
        if let Some(images) = self.images {
            car.images = images;
        }
        if self.description.is_some() {
            car.description = self.description;
        }
        if self.category.is_some() {
            car.category = self.category;
        }
        if let Some(featured) = self.featured {
            car.featured = featured;
        }
        if let Some(available) = self.available {
            car.available = available;
        }
        car.updated_at = now;
    }
}
