use mongodb::bson::{doc, Document};

use super::{contains_ignore_case, flag, number, range, text, ListDefaults, QueryParams};
use crate::db::SortOrder;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CarFilter {
    pub brand: Option<String>,
    pub category: Option<String>,
    pub fuel: Option<String>,
    pub transmission: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_year: Option<f64>,
    pub max_year: Option<f64>,
    pub featured: Option<bool>,
    pub available: Option<bool>,
    pub search: Option<String>,
}

impl CarFilter {
    pub const DEFAULTS: ListDefaults = ListDefaults {
        limit: 12,
        sort_by: "createdAt",
        order: SortOrder::Desc,
    };

    pub fn from_query(query: &QueryParams) -> Self {
        let owned = |key: &str| text(query, key).map(str::to_string);
        CarFilter {
            brand: owned("brand"),
            category: owned("category"),
            fuel: owned("fuel"),
            transmission: owned("transmission"),
            min_price: number(query, "minPrice"),
            max_price: number(query, "maxPrice"),
            min_year: number(query, "minYear"),
            max_year: number(query, "maxYear"),
            featured: flag(query, "featured"),
            available: flag(query, "available"),
            search: owned("search"),
        }
    }

    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();

        for (field, value) in [
            ("brand", &self.brand),
            ("category", &self.category),
            ("fuel", &self.fuel),
            ("transmission", &self.transmission),
        ] {
            if let Some(value) = value {
                filter.insert(field, value.as_str());
            }
        }
        if let Some(price) = range(self.min_price, self.max_price) {
            filter.insert("dailyPrice", price);
        }
        if let Some(year) = range(self.min_year, self.max_year) {
            filter.insert("year", year);
        }
        if let Some(featured) = self.featured {
            filter.insert("featured", featured);
        }
        if let Some(available) = self.available {
            filter.insert("available", available);
        }
        if let Some(term) = &self.search {
            filter.insert(
                "$or",
                vec![
                    doc! { "name": contains_ignore_case(term) },
                    doc! { "model": contains_ignore_case(term) },
                    doc! { "brand": contains_ignore_case(term) },
                ],
            );
        }

        filter
    }
}
