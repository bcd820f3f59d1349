pub mod document;
pub mod users;
