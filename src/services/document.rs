use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::models::document::Document;
use crate::models::users::{Contact, NewUser, Product, User, UserPatch};
use crate::repositories::document::{DocumentRepository, StoreError};
use crate::repositories::fallback::FallbackStore;

pub enum DocumentRequest {
    Initialize {
        response: oneshot::Sender<Result<Document, ServiceError>>,
    },
    GetUser {
        id: String,
        response: oneshot::Sender<Result<Option<User>, ServiceError>>,
    },
    CreateUser {
        new_user: NewUser,
        response: oneshot::Sender<Result<User, ServiceError>>,
    },
    UpdateUser {
        id: String,
        patch: UserPatch,
        response: oneshot::Sender<Result<Option<User>, ServiceError>>,
    },
    Login {
        id: String,
        password: String,
        response: oneshot::Sender<Result<User, ServiceError>>,
    },
    TopUp {
        id: String,
        amount: f64,
        response: oneshot::Sender<Result<Option<User>, ServiceError>>,
    },
    Withdraw {
        id: String,
        amount: f64,
        response: oneshot::Sender<Result<Option<User>, ServiceError>>,
    },
    AddContact {
        id: String,
        contact: Contact,
        response: oneshot::Sender<Result<Option<Contact>, ServiceError>>,
    },
    GetContacts {
        id: String,
        response: oneshot::Sender<Result<Option<Vec<Contact>>, ServiceError>>,
    },
    AddProduct {
        id: String,
        product: Product,
        response: oneshot::Sender<Result<Option<Product>, ServiceError>>,
    },
    GetProducts {
        id: String,
        response: oneshot::Sender<Result<Option<Vec<Product>>, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct DocumentRequestHandler {
    repository: DocumentRepository,
}

impl DocumentRequestHandler {
    pub fn new(master_key: String, url: String, fallback: FallbackStore) -> Self {
        let repository = DocumentRepository::new(master_key, url, fallback);

        DocumentRequestHandler { repository }
    }

    pub async fn initialize(&self) -> Result<Document, ServiceError> {
        self.repository.initialize().await.map_err(map_store_error)
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, ServiceError> {
        self.repository.find_user(id).await.map_err(map_store_error)
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, ServiceError> {
        // Check-then-act, as the registration flow always did. The store
        // scans again on create, so a duplicate slipping past this check
        // still fails there.
        if self
            .repository
            .user_exists(&new_user.user_id)
            .await
            .map_err(map_store_error)?
        {
            return Err(ServiceError::DuplicateUser(new_user.user_id));
        }

        self.repository
            .create_user(new_user)
            .await
            .map_err(map_store_error)
    }

    async fn update_user(&self, id: &str, patch: UserPatch) -> Result<Option<User>, ServiceError> {
        self.repository
            .update_user(id, patch)
            .await
            .map_err(map_store_error)
    }

    async fn login(&self, id: &str, password: &str) -> Result<User, ServiceError> {
        match self.get_user(id).await? {
            Some(user) if user.password == password => {
                let patch = UserPatch {
                    last_login: Some(Utc::now().naive_utc()),
                    ..Default::default()
                };
                self.update_user(id, patch).await?.ok_or_else(|| {
                    ServiceError::Internal(format!("User {} vanished during login", id))
                })
            }
            // Unknown account and wrong password are indistinguishable.
            _ => Err(ServiceError::InvalidCredentials(id.to_string())),
        }
    }

    async fn top_up(&self, id: &str, amount: f64) -> Result<Option<User>, ServiceError> {
        if amount <= 0.0 {
            return Err(ServiceError::Validation(format!(
                "Top-up amount must be positive, got {}",
                amount
            )));
        }

        let Some(user) = self.get_user(id).await? else {
            return Ok(None);
        };

        let patch = UserPatch {
            wallet: Some(user.wallet + amount),
            ..Default::default()
        };
        self.update_user(id, patch).await
    }

    async fn withdraw(&self, id: &str, amount: f64) -> Result<Option<User>, ServiceError> {
        if amount <= 0.0 {
            return Err(ServiceError::Validation(format!(
                "Withdrawal amount must be positive, got {}",
                amount
            )));
        }

        let Some(user) = self.get_user(id).await? else {
            return Ok(None);
        };

        // The wallet must never go negative; the store does not enforce
        // this, so it is checked here.
        if user.wallet < amount {
            return Err(ServiceError::InsufficientFunds(user.wallet, amount));
        }

        let patch = UserPatch {
            wallet: Some(user.wallet - amount),
            ..Default::default()
        };
        self.update_user(id, patch).await
    }

    async fn add_contact(&self, id: &str, contact: Contact) -> Result<Option<Contact>, ServiceError> {
        self.repository
            .add_contact(id, contact)
            .await
            .map_err(map_store_error)
    }

    async fn get_contacts(&self, id: &str) -> Result<Option<Vec<Contact>>, ServiceError> {
        self.repository
            .get_contacts(id)
            .await
            .map_err(map_store_error)
    }

    async fn add_product(&self, id: &str, product: Product) -> Result<Option<Product>, ServiceError> {
        self.repository
            .add_product(id, product)
            .await
            .map_err(map_store_error)
    }

    async fn get_products(&self, id: &str) -> Result<Option<Vec<Product>>, ServiceError> {
        self.repository
            .get_products(id)
            .await
            .map_err(map_store_error)
    }
}

fn map_store_error(e: StoreError) -> ServiceError {
    match e {
        StoreError::DuplicateUser(id) => ServiceError::DuplicateUser(id),
        StoreError::Fallback(detail) => ServiceError::Repository("Document".to_string(), detail),
    }
}

#[async_trait]
impl RequestHandler<DocumentRequest> for DocumentRequestHandler {
    async fn handle_request(&self, request: DocumentRequest) {
        match request {
            DocumentRequest::Initialize { response } => {
                let result = self.initialize().await;
                let _ = response.send(result);
            }
            DocumentRequest::GetUser { id, response } => {
                let user = self.get_user(&id).await;
                let _ = response.send(user);
            }
            DocumentRequest::CreateUser { new_user, response } => {
                let user = self.create_user(new_user).await;
                let _ = response.send(user);
            }
            DocumentRequest::UpdateUser {
                id,
                patch,
                response,
            } => {
                let user = self.update_user(&id, patch).await;
                let _ = response.send(user);
            }
            DocumentRequest::Login {
                id,
                password,
                response,
            } => {
                let user = self.login(&id, &password).await;
                let _ = response.send(user);
            }
            DocumentRequest::TopUp {
                id,
                amount,
                response,
            } => {
                let user = self.top_up(&id, amount).await;
                let _ = response.send(user);
            }
            DocumentRequest::Withdraw {
                id,
                amount,
                response,
            } => {
                let user = self.withdraw(&id, amount).await;
                let _ = response.send(user);
            }
            DocumentRequest::AddContact {
                id,
                contact,
                response,
            } => {
                let contact = self.add_contact(&id, contact).await;
                let _ = response.send(contact);
            }
            DocumentRequest::GetContacts { id, response } => {
                let contacts = self.get_contacts(&id).await;
                let _ = response.send(contacts);
            }
            DocumentRequest::AddProduct {
                id,
                product,
                response,
            } => {
                let product = self.add_product(&id, product).await;
                let _ = response.send(product);
            }
            DocumentRequest::GetProducts { id, response } => {
                let products = self.get_products(&id).await;
                let _ = response.send(products);
            }
        }
    }
}

pub struct DocumentService;

impl DocumentService {
    pub fn new() -> Self {
        DocumentService {}
    }
}

#[async_trait]
impl Service<DocumentRequest, DocumentRequestHandler> for DocumentService {}

#[cfg(test)]
mod tests {
    use super::*;

    // With nothing listening on the remote port, every operation degrades
    // to the fallback store, which seeds itself with the demo document.
    fn offline_handler(dir: &std::path::Path) -> DocumentRequestHandler {
        let fallback = FallbackStore::open(dir).unwrap();
        DocumentRequestHandler::new(
            "test-master-key".to_string(),
            "http://127.0.0.1:1".to_string(),
            fallback,
        )
    }

    fn new_user(user_id: &str, wallet: f64) -> NewUser {
        NewUser {
            user_id: user_id.to_string(),
            password: "secret".to_string(),
            full_name: "Alice".to_string(),
            wallet,
        }
    }

    #[tokio::test]
    async fn login_sets_last_login_and_rejects_bad_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let handler = offline_handler(dir.path());
        handler.create_user(new_user("alice", 0.0)).await.unwrap();

        let user = handler.login("alice", "secret").await.unwrap();
        assert_eq!(user.user_id, "alice");
        assert!(user.last_login.is_some());

        match handler.login("alice", "wrong").await {
            Err(ServiceError::InvalidCredentials(id)) => assert_eq!(id, "alice"),
            other => panic!("Expected invalid credentials, got {:?}", other.map(|u| u.user_id)),
        }
        assert!(matches!(
            handler.login("nobody", "secret").await,
            Err(ServiceError::InvalidCredentials(_))
        ));
    }

    #[tokio::test]
    async fn top_up_and_withdraw_adjust_wallet() {
        let dir = tempfile::tempdir().unwrap();
        let handler = offline_handler(dir.path());
        handler.create_user(new_user("alice", 100.0)).await.unwrap();

        let user = handler.top_up("alice", 50.0).await.unwrap().unwrap();
        assert_eq!(user.wallet, 150.0);

        let user = handler.withdraw("alice", 120.0).await.unwrap().unwrap();
        assert_eq!(user.wallet, 30.0);

        assert!(handler.top_up("nobody", 5.0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn withdraw_never_drives_wallet_negative() {
        let dir = tempfile::tempdir().unwrap();
        let handler = offline_handler(dir.path());
        handler.create_user(new_user("alice", 30.0)).await.unwrap();

        match handler.withdraw("alice", 100.0).await {
            Err(ServiceError::InsufficientFunds(balance, requested)) => {
                assert_eq!(balance, 30.0);
                assert_eq!(requested, 100.0);
            }
            other => panic!("Expected insufficient funds, got {:?}", other.map(|u| u.map(|u| u.wallet))),
        }

        let user = handler.get_user("alice").await.unwrap().unwrap();
        assert_eq!(user.wallet, 30.0);
    }

    #[tokio::test]
    async fn wallet_operations_reject_non_positive_amounts() {
        let dir = tempfile::tempdir().unwrap();
        let handler = offline_handler(dir.path());
        handler.create_user(new_user("alice", 10.0)).await.unwrap();

        assert!(matches!(
            handler.top_up("alice", 0.0).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            handler.withdraw("alice", -3.0).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_registration_surfaces_as_duplicate_user() {
        let dir = tempfile::tempdir().unwrap();
        let handler = offline_handler(dir.path());
        handler.create_user(new_user("alice", 0.0)).await.unwrap();

        assert!(matches!(
            handler.create_user(new_user("alice", 0.0)).await,
            Err(ServiceError::DuplicateUser(_))
        ));
    }
}
