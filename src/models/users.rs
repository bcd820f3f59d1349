use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Opaque key-value record owned by a single user.
pub type Contact = serde_json::Value;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub password: String,
    pub full_name: String,
    pub wallet: f64,
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub inventory: Vec<Product>,
    pub created_at: NaiveDateTime,
    pub last_login: Option<NaiveDateTime>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub wallet: f64,
}

/// Partial update with explicit optional fields. A field left `None` keeps
/// the stored value.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub wallet: Option<f64>,
    pub last_login: Option<NaiveDateTime>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Product {
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WalletOperation {
    pub amount: f64,
}

impl User {
    pub fn from_new(new_user: NewUser) -> Self {
        User {
            user_id: new_user.user_id,
            password: new_user.password,
            full_name: new_user.full_name,
            wallet: new_user.wallet,
            contacts: Vec::new(),
            inventory: Vec::new(),
            created_at: chrono::Utc::now().naive_utc(),
            last_login: None,
        }
    }

    /// Demo account present in every freshly seeded document.
    pub fn demo() -> Self {
        User {
            user_id: "tmp101".to_string(),
            password: "123456".to_string(),
            full_name: "Temp User".to_string(),
            wallet: 5000.00,
            contacts: Vec::new(),
            inventory: Vec::new(),
            created_at: chrono::Utc::now().naive_utc(),
            last_login: None,
        }
    }

    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(password) = patch.password {
            self.password = password;
        }
        if let Some(full_name) = patch.full_name {
            self.full_name = full_name;
        }
        if let Some(wallet) = patch.wallet {
            self.wallet = wallet;
        }
        if let Some(last_login) = patch.last_login {
            self.last_login = Some(last_login);
        }
    }
}
