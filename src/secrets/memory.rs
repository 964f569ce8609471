//! In-memory secret store for unit tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{SecretError, SecretStore};

/// Secret store backed by a map of (project, name, version) -> value
#[derive(Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<(String, String, String), String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, project: &str, name: &str, version: &str, value: &str) {
        self.secrets
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert((project.to_string(), name.to_string(), version.to_string()), value.to_string());
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn access(&self, project: &str, name: &str, version: &str) -> Result<String, SecretError> {
        let secrets = self.secrets.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        secrets
            .get(&(project.to_string(), name.to_string(), version.to_string()))
            .cloned()
            .ok_or_else(|| SecretError::NotFound(format!("projects/{}/secrets/{}/versions/{}", project, name, version)))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_access_is_keyed_by_version() {
        let store = MemorySecretStore::new();
        store.insert("p", "s", "1", "one");
        store.insert("p", "s", "latest", "newest");

        assert_eq!(store.access("p", "s", "1").await.unwrap(), "one");
        assert_eq!(store.access("p", "s", "latest").await.unwrap(), "newest");
        assert!(matches!(store.access("p", "s", "2").await, Err(SecretError::NotFound(_))));
    }
}
