use std::collections::HashMap;

use parking_lot::RwLock;

use super::{ObjectId, StoreError};

pub trait Document: Clone + Send + Sync + 'static {
    fn id(&self) -> &ObjectId;
}

/// Extracts the value of a uniquely indexed field.
pub type UniqueKey<T> = fn(&T) -> String;

/// One named collection of documents keyed by object id, with optional unique indexes.
///
/// Locks are held only for the duration of a single point operation.
pub struct Collection<T> {
    name: &'static str,
    docs: RwLock<HashMap<ObjectId, T>>,
    unique: Vec<(&'static str, UniqueKey<T>)>,
}

impl<T: Document> Collection<T> {
    pub fn new(name: &'static str) -> Self {
        Self { name, docs: RwLock::new(HashMap::new()), unique: Vec::new() }
    }

    pub fn with_unique(mut self, field: &'static str, key: UniqueKey<T>) -> Self {
        self.unique.push((field, key));
        self
    }

    pub fn get(&self, id: &ObjectId) -> Option<T> { self.docs.read().get(id).cloned() }

    pub fn contains(&self, id: &ObjectId) -> bool { self.docs.read().contains_key(id) }

    pub fn find_one(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        self.docs.read().values().find(|d| pred(d)).cloned()
    }

    /// Matching documents ordered by id, which follows creation order.
    pub fn find(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        let mut out: Vec<T> = self.docs.read().values().filter(|d| pred(d)).cloned().collect();
        out.sort_by(|a, b| a.id().cmp(b.id()));
        out
    }

    pub fn all(&self) -> Vec<T> { self.find(|_| true) }

    pub fn len(&self) -> usize { self.docs.read().len() }

    pub fn is_empty(&self) -> bool { self.docs.read().is_empty() }

    pub fn insert(&self, doc: T) -> Result<T, StoreError> {
        let mut docs = self.docs.write();
        if docs.contains_key(doc.id()) {
            return Err(StoreError::Duplicate { collection: self.name, field: "_id" });
        }
        self.check_unique(&docs, &doc)?;
        docs.insert(doc.id().clone(), doc.clone());
        Ok(doc)
    }

    /// Replace an existing document. Never upserts: returns `Ok(None)` when the id is unknown.
    pub fn replace(&self, doc: T) -> Result<Option<T>, StoreError> {
        let mut docs = self.docs.write();
        if !docs.contains_key(doc.id()) {
            return Ok(None);
        }
        self.check_unique(&docs, &doc)?;
        docs.insert(doc.id().clone(), doc.clone());
        Ok(Some(doc))
    }

    pub fn remove(&self, id: &ObjectId) -> Option<T> { self.docs.write().remove(id) }

    fn check_unique(&self, docs: &HashMap<ObjectId, T>, doc: &T) -> Result<(), StoreError> {
        for &(field, key) in &self.unique {
            let wanted = key(doc);
            if docs.values().any(|d| d.id() != doc.id() && key(d) == wanted) {
                return Err(StoreError::Duplicate { collection: self.name, field });
            }
        }
        Ok(())
    }
}
