use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    error::{ErrorKind, WriteFailure},
    options::FindOptions,
    Collection, Database,
};
use serde::{de::DeserializeOwned, Serialize};

use super::{FindSpec, Repository, StoreError, StoreResult};

const DUPLICATE_KEY: i32 = 11000;

pub struct MongoRepository<T> {
    collection: Collection<T>,
}

impl<T> MongoRepository<T> {
    pub fn new(database: &Database, name: &str) -> Self {
        MongoRepository {
            collection: database.collection::<T>(name),
        }
    }
}

fn classify(err: mongodb::error::Error) -> StoreError {
    if let ErrorKind::Write(WriteFailure::WriteError(ref write_error)) = *err.kind {
        if write_error.code == DUPLICATE_KEY {
            return StoreError::Duplicate(write_error.message.clone());
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl<T> Repository<T> for MongoRepository<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    async fn find(&self, filter: Document, spec: FindSpec) -> StoreResult<Vec<T>> {
        let options = FindOptions::builder()
            .sort(
                spec.sort
                    .map(|sort| doc! { sort.field: sort.order.direction() }),
            )
            .skip(Some(spec.skip).filter(|skip| *skip > 0))
            .limit(spec.limit)
            .build();

        let cursor = self.collection.find(filter, options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count(&self, filter: Document) -> StoreResult<u64> {
        Ok(self.collection.count_documents(filter, None).await?)
    }

    async fn find_one(&self, filter: Document) -> StoreResult<Option<T>> {
        Ok(self.collection.find_one(filter, None).await?)
    }

    async fn insert(&self, item: &T) -> StoreResult<ObjectId> {
        let result = self.collection.insert_one(item, None).await.map_err(classify)?;
        result.inserted_id.as_object_id().ok_or_else(|| {
            StoreError::Serialization(format!("unexpected inserted id {}", result.inserted_id))
        })
    }

    async fn replace(&self, id: ObjectId, item: &T) -> StoreResult<bool> {
        let result = self
            .collection
            .replace_one(doc! { "_id": id }, item, None)
            .await
            .map_err(classify)?;
        Ok(result.matched_count > 0)
    }

    async fn delete(&self, id: ObjectId) -> StoreResult<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_many(&self, filter: Document) -> StoreResult<u64> {
        let result = self.collection.delete_many(filter, None).await?;
        Ok(result.deleted_count)
    }
}
