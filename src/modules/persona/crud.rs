use std::sync::Arc;

use crate::id;
use crate::modules::persona::model::Persona;
use crate::modules::persona::schema::PersonaSummary;
use crate::services::storage::{BlobStore, PutReceipt, StorageError};
use crate::validation::is_valid_persona_id;

/// Persisted persona blobs are named `{persona_id}.json`.
const BLOB_SUFFIX: &str = ".json";

/// Typed persona operations over the blob storage collaborator.
pub struct PersonaCrud {
    storage: Arc<dyn BlobStore>,
}

impl PersonaCrud {
    pub fn new(storage: Arc<dyn BlobStore>) -> Self {
        Self { storage }
    }

    pub fn generate_id() -> String {
        id::new_persona_id()
    }

    fn blob_key(persona_id: &str) -> String {
        format!("{}{}", persona_id, BLOB_SUFFIX)
    }

    /// Persists a persona under a fresh id. Duplicate writes are an error,
    /// not silently accepted.
    pub async fn save(
        &self,
        persona_id: &str,
        persona: &Persona,
    ) -> Result<PutReceipt, StorageError> {
        let blob = serde_json::to_string(persona)?;
        self.storage.put(&Self::blob_key(persona_id), &blob).await
    }

    /// Loads the stored JSON for a persona, `None` when absent.
    pub async fn load(&self, persona_id: &str) -> Result<Option<serde_json::Value>, StorageError> {
        let Some(blob) = self.storage.get(&Self::blob_key(persona_id)).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&blob)?))
    }

    /// Lists stored personas newest-first, filtered to keys that follow the
    /// persisted-blob naming convention.
    pub async fn list(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<PersonaSummary>, u64), StorageError> {
        let (entries, total) = self.storage.list(limit, offset).await?;

        let personas = entries
            .into_iter()
            .filter_map(|entry| {
                let id = entry.key.strip_suffix(BLOB_SUFFIX)?;
                if !is_valid_persona_id(id) {
                    return None;
                }
                Some(PersonaSummary {
                    id: id.to_string(),
                    name: id.to_string(),
                    created_at: entry.created_at,
                })
            })
            .collect();

        Ok((personas, total))
    }

    pub async fn delete(&self, persona_id: &str) -> Result<(), StorageError> {
        self.storage.delete(&Self::blob_key(persona_id)).await
    }
}
