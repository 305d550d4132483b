//! Shared read-mostly caches
//!
//! Entity definitions and described table schemas are cached per process and
//! read by many concurrent operations. Each cache holds one immutable
//! generation behind an `Arc`; readers clone the `Arc`, writers publish a new
//! generation, and invalidation swaps in a fresh empty map. A reader therefore
//! sees either the old or the new generation, never a half-cleared one.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::entity::EntityDefinition;
use crate::error::Result;
use crate::schema::TableSchema;

pub type DefinitionCache = SharedCache<EntityDefinition>;

pub type SchemaCache = SharedCache<TableSchema>;

pub struct SharedCache<V> {
    generation: RwLock<Arc<HashMap<String, Arc<V>>>>,
}

impl<V> Default for SharedCache<V> {
    fn default() -> Self {
        Self {
            generation: RwLock::new(Arc::new(HashMap::new())),
        }
    }
}

impl<V> SharedCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation
    pub fn snapshot(&self) -> Arc<HashMap<String, Arc<V>>> {
        self.generation
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        self.snapshot().get(key).cloned()
    }

    /// Publish a new generation containing `key`
    pub fn insert(&self, key: impl Into<String>, value: V) -> Arc<V> {
        let value = Arc::new(value);
        let mut guard = self
            .generation
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut next = HashMap::clone(&guard);
        next.insert(key.into(), value.clone());
        *guard = Arc::new(next);
        value
    }

    /// Cached value, or the loader's value which is then cached
    pub fn get_or_load<F>(&self, key: &str, loader: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Result<V>,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }

        let value = loader()?;
        Ok(self.insert(key, value))
    }

    /// Publish a new generation without `key`
    pub fn remove(&self, key: &str) -> Option<Arc<V>> {
        let mut guard = self
            .generation
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if !guard.contains_key(key) {
            return None;
        }
        let mut next = HashMap::clone(&guard);
        let removed = next.remove(key);
        *guard = Arc::new(next);
        removed
    }

    /// Drop every entry by swapping in an empty generation
    pub fn invalidate(&self) {
        let mut guard = self
            .generation
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(HashMap::new());
        tracing::debug!("cache invalidated");
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
