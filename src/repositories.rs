pub mod document;
pub mod fallback;
