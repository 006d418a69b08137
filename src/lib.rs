//! User and contact schemas over a document store: field validation,
//! password hashing on save, and user expansion on contact reads.

pub mod config;
pub mod contacts;
pub mod db;
pub mod error;
pub mod store;
pub mod users;
pub mod validation;

pub use contacts::Contacts;
pub use db::PgStore;
pub use error::{Error, Result};
pub use store::MemoryStore;
pub use users::Users;
