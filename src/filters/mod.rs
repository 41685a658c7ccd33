//! Query-string to persistence-filter translation for the list endpoints.
//!
//! Parsing is lenient on purpose: a value that does not coerce to the
//! expected type is dropped and the request proceeds as if it were absent.

mod brand;
mod car;
mod category;
mod review;

use std::collections::HashMap;

use mongodb::bson::{doc, Document};
use serde::Serialize;

use crate::db::{FindSpec, SortOrder, SortSpec};

pub use brand::BrandFilter;
pub use car::CarFilter;
pub use category::CategoryFilter;
pub use review::ReviewFilter;

pub type QueryParams = HashMap<String, String>;

pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy)]
pub struct ListDefaults {
    pub limit: i64,
    pub sort_by: &'static str,
    pub order: SortOrder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub page: i64,
    pub limit: i64,
    pub sort_by: String,
    pub order: SortOrder,
}

impl ListParams {
    pub fn from_query(query: &QueryParams, defaults: ListDefaults) -> Self {
        let page = whole_number(query, "page").filter(|p| *p >= 1).unwrap_or(1);
        let limit = whole_number(query, "limit")
            .filter(|l| *l >= 1)
            .map(|l| l.min(MAX_LIMIT))
            .unwrap_or(defaults.limit);
        let sort_by = text(query, "sortBy").unwrap_or(defaults.sort_by).to_string();
        let order = match text(query, "sortOrder") {
            Some(o) if o.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            Some(o) if o.eq_ignore_ascii_case("desc") => SortOrder::Desc,
            _ => defaults.order,
        };

        ListParams {
            page,
            limit,
            sort_by,
            order,
        }
    }

    pub fn find_spec(&self) -> FindSpec {
        FindSpec {
            sort: Some(SortSpec {
                field: self.sort_by.clone(),
                order: self.order,
            }),
            // page is only bounded below, so the product can exceed i64
            skip: (self.page - 1).saturating_mul(self.limit) as u64,
            limit: Some(self.limit),
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(params: &ListParams, total: u64) -> Self {
        let limit = params.limit.max(1) as u64;
        Pagination {
            page: params.page,
            limit: params.limit,
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

pub(crate) fn text<'a>(query: &'a QueryParams, key: &str) -> Option<&'a str> {
    query.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

pub(crate) fn number(query: &QueryParams, key: &str) -> Option<f64> {
    let raw = text(query, key)?;
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            log::debug!("Ignoring non-numeric query parameter {}={}", key, raw);
            None
        }
    }
}

fn whole_number(query: &QueryParams, key: &str) -> Option<i64> {
    number(query, key).map(|v| v.trunc() as i64)
}

/// Any value other than the literal `true` reads as `false`.
pub(crate) fn flag(query: &QueryParams, key: &str) -> Option<bool> {
    text(query, key).map(|v| v == "true")
}

pub(crate) fn contains_ignore_case(term: &str) -> Document {
    doc! { "$regex": regex::escape(term), "$options": "i" }
}

pub(crate) fn range(min: Option<f64>, max: Option<f64>) -> Option<Document> {
    let mut bounds = Document::new();
    if let Some(min) = min {
        bounds.insert("$gte", min);
    }
    if let Some(max) = max {
        bounds.insert("$lte", max);
    }
    (!bounds.is_empty()).then_some(bounds)
}

#[cfg(test)]
pub(crate) fn query(pairs: &[(&str, &str)]) -> QueryParams {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
