use std::path::Path;

use anyhow::Context;

use crate::models::document::Document;

const FALLBACK_KEY: &str = "user_db";

/// Same-shape copy of the remote document in an embedded key-value store,
/// served whenever the remote store is unreachable.
#[derive(Clone)]
pub struct FallbackStore {
    db: sled::Db,
}

impl FallbackStore {
    pub fn open(dir: &Path) -> Result<Self, anyhow::Error> {
        let db = sled::open(dir)
            .with_context(|| format!("Could not open fallback store at {}", dir.display()))?;

        Ok(FallbackStore { db })
    }

    /// Returns the stored document. An absent key synthesizes the seed
    /// document and persists it before returning.
    pub fn read(&self) -> Result<Document, anyhow::Error> {
        match self.db.get(FALLBACK_KEY)? {
            Some(raw) => Ok(serde_json::from_slice(&raw)?),
            None => {
                let document = Document::seed();
                self.write(&document)?;
                Ok(document)
            }
        }
    }

    pub fn write(&self, document: &Document) -> Result<(), anyhow::Error> {
        self.db.insert(FALLBACK_KEY, serde_json::to_vec(document)?)?;
        self.db.flush()?;

        Ok(())
    }
}
