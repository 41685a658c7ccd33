use mongodb::bson::Document;

use super::{contains_ignore_case, flag, text, ListDefaults, QueryParams};
use crate::db::SortOrder;
use crate::models::category::CategoryType;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CategoryFilter {
    pub kind: Option<CategoryType>,
    pub featured: Option<bool>,
    pub search: Option<String>,
}

impl CategoryFilter {
    pub const DEFAULTS: ListDefaults = ListDefaults {
        limit: 20,
        sort_by: "name",
        order: SortOrder::Asc,
    };

    pub fn from_query(query: &QueryParams) -> Self {
        let kind = text(query, "type").and_then(|raw| match raw.parse::<CategoryType>() {
            Ok(kind) => Some(kind),
            Err(_) => {
                log::debug!("Ignoring unknown category type filter {}", raw);
                None
            }
        });

        CategoryFilter {
            kind,
            featured: flag(query, "featured"),
            search: text(query, "search").map(str::to_string),
        }
    }

    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(kind) = self.kind {
            filter.insert("type", kind);
        }
        if let Some(featured) = self.featured {
            filter.insert("featured", featured);
        }
        if let Some(term) = &self.search {
            filter.insert("name", contains_ignore_case(term));
        }
        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::query;
    use mongodb::bson::doc;

    #[test]
    fn filters_by_type() {
        let filter = CategoryFilter::from_query(&query(&[("type", "fuelType")]));
        assert_eq!(filter.to_document(), doc! { "type": "fuelType" });
    }

    #[test]
    fn unknown_type_is_dropped() {
        let filter = CategoryFilter::from_query(&query(&[("type", "colour"), ("featured", "1")]));
        assert_eq!(filter.kind, None);
        assert_eq!(filter.to_document(), doc! { "featured": false });
    }
}
