pub mod mongo;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    options::IndexOptions,
    Database, IndexModel,
};
use thiserror::Error;

pub use mongo::MongoRepository;

pub const USERS: &str = "users";
pub const CARS: &str = "cars";
pub const BRANDS: &str = "brands";
pub const CATEGORIES: &str = "categories";
pub const REVIEWS: &str = "reviews";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("duplicate key: {0}")]
    Duplicate(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn direction(self) -> i32 {
        match self {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

/// Sort and window applied to a `find`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindSpec {
    pub sort: Option<SortSpec>,
    pub skip: u64,
    pub limit: Option<i64>,
}

impl FindSpec {
    pub fn sorted(field: &str, order: SortOrder) -> Self {
        FindSpec {
            sort: Some(SortSpec {
                field: field.to_string(),
                order,
            }),
            ..FindSpec::default()
        }
    }
}

/// Data access for one collection. Filters are plain BSON documents built by `crate::filters`.
#[async_trait]
pub trait Repository<T>: Send + Sync {
    async fn find(&self, filter: Document, spec: FindSpec) -> StoreResult<Vec<T>>;
    async fn count(&self, filter: Document) -> StoreResult<u64>;
    async fn find_one(&self, filter: Document) -> StoreResult<Option<T>>;
    async fn insert(&self, item: &T) -> StoreResult<ObjectId>;
    /// Returns `false` when no document has the id.
    async fn replace(&self, id: ObjectId, item: &T) -> StoreResult<bool>;
    async fn delete(&self, id: ObjectId) -> StoreResult<bool>;
    async fn delete_many(&self, filter: Document) -> StoreResult<u64>;

    async fn find_by_id(&self, id: ObjectId) -> StoreResult<Option<T>> {
        self.find_one(doc! { "_id": id }).await
    }
}

pub async fn ensure_indexes(database: &Database) -> StoreResult<()> {
    for (collection, field) in [(USERS, "email"), (BRANDS, "slug"), (CATEGORIES, "slug")] {
        let index = IndexModel::builder()
            .keys(doc! { field: 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        database
            .collection::<Document>(collection)
            .create_index(index, None)
            .await?;
        log::debug!("Ensured unique index on {}.{}", collection, field);
    }
    Ok(())
}
