use serde::{Deserialize, Serialize};

use super::users::{Contact, User};

/// The whole persisted aggregate. The remote store has no partial updates;
/// every write replaces this document wholesale.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Document {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub contacts: Vec<Contact>,
}

impl Document {
    /// Document written on initialization: the demo account and an empty
    /// top-level contact list.
    pub fn seed() -> Self {
        Document {
            users: vec![User::demo()],
            contacts: Vec::new(),
        }
    }

    pub fn find_user(&self, user_id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.user_id == user_id)
    }
}
