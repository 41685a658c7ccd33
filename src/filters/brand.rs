use mongodb::bson::Document;

use super::{contains_ignore_case, flag, text, ListDefaults, QueryParams};
use crate::db::SortOrder;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct BrandFilter {
    pub featured: Option<bool>,
    pub search: Option<String>,
}

impl BrandFilter {
    pub const DEFAULTS: ListDefaults = ListDefaults {
        limit: 20,
        sort_by: "name",
        order: SortOrder::Asc,
    };

    pub fn from_query(query: &QueryParams) -> Self {
        BrandFilter {
            featured: flag(query, "featured"),
            search: text(query, "search").map(str::to_string),
        }
    }

    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(featured) = self.featured {
            filter.insert("featured", featured);
        }
        if let Some(term) = &self.search {
            filter.insert("name", contains_ignore_case(term));
        }
        filter
    }
}
