use crate::models::document::Document;
use crate::models::users::{Contact, NewUser, Product, User, UserPatch};

use super::fallback::FallbackStore;

mod jsonbin;

/// Failures a caller of the document store can actually observe. Transport
/// failures never appear here; they degrade to the fallback store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("User already exists: {0}")]
    DuplicateUser(String),
    #[error("Fallback store error: {0}")]
    Fallback(String),
}

/// Sole gateway between application logic and persisted state.
///
/// Every mutation is an unconditional fetch, in-memory change and full
/// overwrite. There is no version token and no compare-and-swap: of two
/// in-flight writers, the last `replace_document` wins and the other's
/// change is silently discarded. Callers that need consistency must
/// serialize their own operations.
#[derive(Clone)]
pub struct DocumentRepository {
    jsonbin: jsonbin::JsonBinApi,
    fallback: FallbackStore,
}

impl DocumentRepository {
    pub fn new(master_key: String, url: String, fallback: FallbackStore) -> Self {
        let jsonbin = jsonbin::JsonBinApi::new(master_key, url);

        DocumentRepository { jsonbin, fallback }
    }

    /// Overwrites the remote bin with the seed document. When the remote
    /// store is unreachable the seed lands in the fallback store instead.
    pub async fn initialize(&self) -> Result<Document, StoreError> {
        let document = Document::seed();

        match self.jsonbin.create(&document).await {
            Ok(()) => {}
            Err(e) => {
                log::warn!("Remote store unreachable, seeding fallback store: {}", e);
                self.fallback
                    .write(&document)
                    .map_err(|e| StoreError::Fallback(e.to_string()))?;
            }
        }

        Ok(document)
    }

    /// Latest document, from the remote store when reachable, otherwise the
    /// fallback copy (seeded on first use).
    pub async fn fetch_document(&self) -> Result<Document, StoreError> {
        match self.jsonbin.read_latest().await {
            Ok(document) => Ok(document),
            Err(e) => {
                log::warn!("Remote read failed, serving fallback copy: {}", e);
                self.fallback
                    .read()
                    .map_err(|e| StoreError::Fallback(e.to_string()))
            }
        }
    }

    /// Full overwrite of the remote document, mirrored into the fallback
    /// store afterwards so the local copy is always fresh. A failed remote
    /// write is logged and swallowed; the document is then only updated
    /// locally.
    pub async fn replace_document(&self, document: &Document) -> Result<(), StoreError> {
        if let Err(e) = self.jsonbin.update(document).await {
            log::warn!("Remote write failed, document updated locally only: {}", e);
        }

        self.fallback
            .write(document)
            .map_err(|e| StoreError::Fallback(e.to_string()))
    }

    pub async fn find_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let document = self.fetch_document().await?;

        Ok(document.users.into_iter().find(|u| u.user_id == user_id))
    }

    pub async fn user_exists(&self, user_id: &str) -> Result<bool, StoreError> {
        Ok(self.find_user(user_id).await?.is_some())
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut document = self.fetch_document().await?;

        if document.users.iter().any(|u| u.user_id == new_user.user_id) {
            return Err(StoreError::DuplicateUser(new_user.user_id));
        }

        let user = User::from_new(new_user);
        document.users.push(user.clone());
        self.replace_document(&document).await?;

        Ok(user)
    }

    pub async fn update_user(
        &self,
        user_id: &str,
        patch: UserPatch,
    ) -> Result<Option<User>, StoreError> {
        let mut document = self.fetch_document().await?;

        let Some(position) = document.users.iter().position(|u| u.user_id == user_id) else {
            return Ok(None);
        };

        document.users[position].apply(patch);
        let user = document.users[position].clone();
        self.replace_document(&document).await?;

        Ok(Some(user))
    }

    pub async fn add_contact(
        &self,
        user_id: &str,
        contact: Contact,
    ) -> Result<Option<Contact>, StoreError> {
        let mut document = self.fetch_document().await?;

        let Some(position) = document.users.iter().position(|u| u.user_id == user_id) else {
            return Ok(None);
        };

        document.users[position].contacts.push(contact.clone());
        self.replace_document(&document).await?;

        Ok(Some(contact))
    }

    pub async fn get_contacts(&self, user_id: &str) -> Result<Option<Vec<Contact>>, StoreError> {
        let document = self.fetch_document().await?;

        Ok(document.find_user(user_id).map(|u| u.contacts.clone()))
    }

    pub async fn add_product(
        &self,
        user_id: &str,
        product: Product,
    ) -> Result<Option<Product>, StoreError> {
        let mut document = self.fetch_document().await?;

        let Some(position) = document.users.iter().position(|u| u.user_id == user_id) else {
            return Ok(None);
        };

        document.users[position].inventory.push(product.clone());
        self.replace_document(&document).await?;

        Ok(Some(product))
    }

    pub async fn get_products(&self, user_id: &str) -> Result<Option<Vec<Product>>, StoreError> {
        let document = self.fetch_document().await?;

        Ok(document.find_user(user_id).map(|u| u.inventory.clone()))
    }
}
