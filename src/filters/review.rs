use mongodb::bson::{oid::ObjectId, Document};

use super::{flag, number, range, text, ListDefaults, QueryParams};
use crate::db::SortOrder;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReviewFilter {
    pub car_id: Option<ObjectId>,
    pub approved: Option<bool>,
    pub featured: Option<bool>,
    pub rating: Option<f64>,
    pub min_rating: Option<f64>,
}

impl ReviewFilter {
    pub const DEFAULTS: ListDefaults = ListDefaults {
        limit: 10,
        sort_by: "createdAt",
        order: SortOrder::Desc,
    };

    pub fn from_query(query: &QueryParams) -> Self {
        let car_id = text(query, "carId").and_then(|raw| match ObjectId::parse_str(raw) {
            Ok(id) => Some(id),
            Err(_) => {
                log::debug!("Ignoring malformed carId filter {}", raw);
                None
            }
        });

        ReviewFilter {
            car_id,
            approved: flag(query, "isApproved"),
            featured: flag(query, "isFeatured"),
            rating: number(query, "rating"),
            min_rating: number(query, "minRating"),
        }
    }

    /// Restricts the listing to approved reviews, for callers without admin rights.
    pub fn approved_only(mut self) -> Self {
        self.approved = Some(true);
        self
    }

    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(car_id) = self.car_id {
            filter.insert("carId", car_id);
        }
        if let Some(approved) = self.approved {
            filter.insert("isApproved", approved);
        }
        if let Some(featured) = self.featured {
            filter.insert("isFeatured", featured);
        }
        if let Some(rating) = self.rating {
            filter.insert("rating", rating);
        } else if let Some(bounds) = range(self.min_rating, None) {
            filter.insert("rating", bounds);
        }
        filter
    }
}
