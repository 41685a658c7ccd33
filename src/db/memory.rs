use std::cmp::Ordering;
use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use mongodb::bson::{self, oid::ObjectId, Bson, Document};
use regex::RegexBuilder;
use serde::{de::DeserializeOwned, Serialize};

use super::{FindSpec, Repository, SortOrder, StoreError, StoreResult};

/// Repository over a `Vec<Document>` that understands the subset of query
/// operators `crate::filters` produces: equality, `$gte`/`$lte`/`$gt`/`$lt`,
/// `$ne`, `$in`, `$regex` with `$options`, and `$or`/`$and`.
pub struct MemoryRepository<T> {
    docs: Mutex<Vec<Document>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for MemoryRepository<T> {
    fn default() -> Self {
        MemoryRepository {
            docs: Mutex::new(Vec::new()),
            _marker: PhantomData,
        }
    }
}

impl<T> MemoryRepository<T> {
    fn docs(&self) -> MutexGuard<'_, Vec<Document>> {
        self.docs.lock().expect("memory repository poisoned")
    }
}

fn encode<T: Serialize>(item: &T) -> StoreResult<Document> {
    bson::to_document(item).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(doc: Document) -> StoreResult<T> {
    bson::from_document(doc).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn id_of(doc: &Document) -> Option<ObjectId> {
    doc.get_object_id("_id").ok()
}

#[async_trait]
impl<T> Repository<T> for MemoryRepository<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    async fn find(&self, filter: Document, spec: FindSpec) -> StoreResult<Vec<T>> {
        let mut matched: Vec<Document> = self
            .docs()
            .iter()
            .filter(|doc| matches(doc, &filter))
            .cloned()
            .collect();

        if let Some(sort) = &spec.sort {
            matched.sort_by(|a, b| {
                let ordering = sort_key_cmp(a.get(&sort.field), b.get(&sort.field));
                match sort.order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }

        let window = matched.into_iter().skip(spec.skip as usize);
        let limited: Vec<Document> = match spec.limit {
            Some(limit) if limit > 0 => window.take(limit as usize).collect(),
            _ => window.collect(),
        };
        limited.into_iter().map(decode).collect()
    }

    async fn count(&self, filter: Document) -> StoreResult<u64> {
        Ok(self.docs().iter().filter(|doc| matches(doc, &filter)).count() as u64)
    }

    async fn find_one(&self, filter: Document) -> StoreResult<Option<T>> {
        let found = self.docs().iter().find(|doc| matches(doc, &filter)).cloned();
        found.map(decode).transpose()
    }

    async fn insert(&self, item: &T) -> StoreResult<ObjectId> {
        let mut doc = encode(item)?;
        let id = ObjectId::new();
        doc.insert("_id", id);
        self.docs().push(doc);
        Ok(id)
    }

    async fn replace(&self, id: ObjectId, item: &T) -> StoreResult<bool> {
        let mut doc = encode(item)?;
        doc.insert("_id", id);
        let mut docs = self.docs();
        match docs.iter_mut().find(|existing| id_of(existing) == Some(id)) {
            Some(slot) => {
                *slot = doc;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: ObjectId) -> StoreResult<bool> {
        let mut docs = self.docs();
        let before = docs.len();
        docs.retain(|doc| id_of(doc) != Some(id));
        Ok(docs.len() < before)
    }

    async fn delete_many(&self, filter: Document) -> StoreResult<u64> {
        let mut docs = self.docs();
        let before = docs.len();
        docs.retain(|doc| !matches(doc, &filter));
        Ok((before - docs.len()) as u64)
    }
}

pub fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, condition)| match key.as_str() {
        "$or" => sub_filters(condition).iter().any(|sub| matches(doc, sub)),
        "$and" => sub_filters(condition).iter().all(|sub| matches(doc, sub)),
        field => field_matches(doc.get(field), condition),
    })
}

fn sub_filters(condition: &Bson) -> Vec<Document> {
    condition
        .as_array()
        .map(|items| items.iter().filter_map(|item| item.as_document().cloned()).collect())
        .unwrap_or_default()
}

fn field_matches(value: Option<&Bson>, condition: &Bson) -> bool {
    match condition {
        Bson::Document(ops) if ops.keys().all(|key| key.starts_with('$')) => {
            ops.iter().all(|(op, arg)| operator_matches(value, op, arg, ops))
        }
        expected => equals(value, expected),
    }
}

fn operator_matches(value: Option<&Bson>, op: &str, arg: &Bson, ops: &Document) -> bool {
    let ordering = || value.and_then(|v| compare(v, arg));
    match op {
        "$gte" => matches!(ordering(), Some(Ordering::Greater | Ordering::Equal)),
        "$gt" => ordering() == Some(Ordering::Greater),
        "$lte" => matches!(ordering(), Some(Ordering::Less | Ordering::Equal)),
        "$lt" => ordering() == Some(Ordering::Less),
        "$ne" => !equals(value, arg),
        "$in" => arg
            .as_array()
            .map(|items| items.iter().any(|item| equals(value, item)))
            .unwrap_or(false),
        "$regex" => {
            let pattern = arg.as_str().unwrap_or_default();
            let options = ops.get_str("$options").unwrap_or_default();
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(options.contains('i'))
                .build();
            match (regex, value.and_then(Bson::as_str)) {
                (Ok(regex), Some(text)) => regex.is_match(text),
                _ => false,
            }
        }
        "$options" => true,
        _ => false,
    }
}

fn equals(value: Option<&Bson>, expected: &Bson) -> bool {
    value.and_then(|v| compare(v, expected)) == Some(Ordering::Equal)
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

fn compare(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => Some(x.bytes().cmp(&y.bytes())),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.timestamp_millis().cmp(&y.timestamp_millis())),
        (Bson::Null, Bson::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

// Missing fields sort first, as in MongoDB.
fn sort_key_cmp(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn evaluates_ranges_and_equality() {
        let car = doc! { "brand": "Ferrari", "dailyPrice": 900.0, "year": 2022 };
        assert!(matches(&car, &doc! { "brand": "Ferrari" }));
        assert!(matches(&car, &doc! { "dailyPrice": { "$gte": 500.0, "$lte": 900.0 } }));
        assert!(matches(&car, &doc! { "year": { "$gte": 2020.0 } }));
        assert!(!matches(&car, &doc! { "year": { "$lt": 2022 } }));
        assert!(!matches(&car, &doc! { "featured": true }));
    }

    #[test]
    fn evaluates_regex_or_and_ne() {
        let car = doc! { "name": "Huracan EVO", "model": "Huracan" };
        let search = doc! { "$or": [
            { "name": { "$regex": "evo", "$options": "i" } },
            { "model": { "$regex": "nothing", "$options": "i" } },
        ] };
        assert!(matches(&car, &search));
        assert!(!matches(&car, &doc! { "name": { "$regex": "evo" } }));
        assert!(matches(&car, &doc! { "slug": { "$ne": "huracan" } }));
    }
}
