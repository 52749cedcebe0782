//! In-memory profile store for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::store::ProfileStore;
use finvault_common::{Error, ProfileId, Result};

/// In-memory profile store.
///
/// Useful for testing and development. All records are stored in memory
/// and lost on drop.
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn insert(&self, id: &ProfileId, record: Vec<u8>) -> Result<()> {
        let mut records = self.records.write().unwrap();
        if records.contains_key(id.as_str()) {
            return Err(Error::AlreadyExists(format!(
                "Profile already exists: {}",
                id
            )));
        }
        records.insert(id.as_str().to_string(), record);
        Ok(())
    }

    async fn replace(&self, id: &ProfileId, record: Vec<u8>) -> Result<()> {
        let mut records = self.records.write().unwrap();
        match records.get_mut(id.as_str()) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(Error::ProfileNotFound(format!("Profile not found: {}", id))),
        }
    }

    async fn load(&self, id: &ProfileId) -> Result<Vec<u8>> {
        let records = self.records.read().unwrap();
        records
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| Error::ProfileNotFound(format!("Profile not found: {}", id)))
    }

    async fn delete(&self, id: &ProfileId) -> Result<()> {
        let mut records = self.records.write().unwrap();
        match records.remove(id.as_str()) {
            Some(_) => Ok(()),
            None => Err(Error::ProfileNotFound(format!("Profile not found: {}", id))),
        }
    }

    async fn exists(&self, id: &ProfileId) -> Result<bool> {
        Ok(self.records.read().unwrap().contains_key(id.as_str()))
    }

    async fn list(&self) -> Result<Vec<ProfileId>> {
        let records = self.records.read().unwrap();
        records.keys().map(|k| ProfileId::new(k.clone())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_load() {
        let store = MemoryStore::new();
        let id = ProfileId::new("alice").unwrap();
        let record = b"record bytes".to_vec();

        store.insert(&id, record.clone()).await.unwrap();
        let loaded = store.load(&id).await.unwrap();

        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn test_insert_twice_fails() {
        let store = MemoryStore::new();
        let id = ProfileId::new("alice").unwrap();

        store.insert(&id, vec![1]).await.unwrap();
        let result = store.insert(&id, vec![2]).await;

        assert!(matches!(result, Err(Error::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_replace() {
        let store = MemoryStore::new();
        let id = ProfileId::new("alice").unwrap();

        store.insert(&id, vec![1]).await.unwrap();
        store.replace(&id, vec![2]).await.unwrap();

        assert_eq!(store.load(&id).await.unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_replace_missing_fails() {
        let store = MemoryStore::new();
        let id = ProfileId::new("ghost").unwrap();

        let result = store.replace(&id, vec![1]).await;
        assert!(matches!(result, Err(Error::ProfileNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        let id = ProfileId::new("alice").unwrap();

        store.insert(&id, vec![1]).await.unwrap();
        store.delete(&id).await.unwrap();

        assert!(!store.exists(&id).await.unwrap());
        let result = store.load(&id).await;
        assert!(matches!(result, Err(Error::ProfileNotFound(_))));
    }

    #[tokio::test]
    async fn test_list() {
        let store = MemoryStore::new();
        store
            .insert(&ProfileId::new("a").unwrap(), vec![1])
            .await
            .unwrap();
        store
            .insert(&ProfileId::new("b").unwrap(), vec![2])
            .await
            .unwrap();

        let mut ids: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|id| id.as_str().to_string())
            .collect();
        ids.sort();

        assert_eq!(ids, vec!["a", "b"]);
    }
}
