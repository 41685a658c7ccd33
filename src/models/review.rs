use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub car_id: ObjectId,
    pub user_name: String,
    pub rating: i32,
    pub title: String,
    pub comment: String,
    #[serde(default)]
    pub is_approved: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewDto {
    #[validate(length(min = 1, message = "Car is required"))]
    pub car_id: String,
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub user_name: String,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    #[validate(length(min = 1, max = 150, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 2000, message = "Comment is required"))]
    pub comment: String,
}

impl CreateReviewDto {
    /// Public submissions always start unapproved and unfeatured.
    pub fn into_review(self, car_id: ObjectId, now: DateTime<Utc>) -> Review {
        Review {
            id: None,
            car_id,
            user_name: self.user_name,
            rating: self.rating,
            title: self.title,
            comment: self.comment,
            is_approved: false,
            is_featured: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReviewDto {
    #[validate(length(min = 1, max = 100))]
    pub user_name: Option<String>,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i32>,
    #[validate(length(min = 1, max = 150))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub comment: Option<String>,
    pub is_approved: Option<bool>,
    pub is_featured: Option<bool>,
}

impl UpdateReviewDto {
    pub fn apply(self, review: &mut Review, now: DateTime<Utc>) {
        if let Some(user_name) = self.user_name {
            review.user_name = user_name;
        }
        if let Some(rating) = self.rating {
            review.rating = rating;
        }
        if let Some(title) = self.title {
            review.title = title;
        }
        if let Some(comment) = self.comment {
            review.comment = comment;
        }
        if let Some(is_approved) = self.is_approved {
            review.is_approved = is_approved;
        }
        if let Some(is_featured) = self.is_featured {
            review.is_featured = is_featured;
        }
        review.updated_at = now;
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerateReviewDto {
    pub is_approved: Option<bool>,
    pub is_featured: Option<bool>,
}

impl ModerateReviewDto {
    pub fn is_empty(&self) -> bool {
        self.is_approved.is_none() && self.is_featured.is_none()
    }

    pub fn apply(self, review: &mut Review, now: DateTime<Utc>) {
        if let Some(is_approved) = self.is_approved {
            review.is_approved = is_approved;
        }
        if let Some(is_featured) = self.is_featured {
            review.is_featured = is_featured;
        }
        review.updated_at = now;
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub car_id: ObjectId,
    pub average_rating: f64,
    pub total_reviews: u64,
    pub rating_distribution: BTreeMap<u8, u64>,
}

impl ReviewStats {
    pub fn from_reviews(car_id: ObjectId, reviews: &[Review]) -> Self {
        let mut rating_distribution: BTreeMap<u8, u64> = (1..=5).map(|star| (star, 0)).collect();
        let mut sum = 0i64;

        for review in reviews {
            sum += i64::from(review.rating);
            if let Ok(star) = u8::try_from(review.rating) {
                if let Some(count) = rating_distribution.get_mut(&star) {
                    *count += 1;
                }
            }
        }

        let total_reviews = reviews.len() as u64;
        let average_rating = if total_reviews == 0 {
            0.0
        } else {
            // one decimal place
            (sum as f64 / total_reviews as f64 * 10.0).round() / 10.0
        };

        ReviewStats {
            car_id,
            average_rating,
            total_reviews,
            rating_distribution,
        }
    }
}
