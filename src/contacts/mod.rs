pub mod document;
pub mod dto;
mod repo;
pub mod repo_types;
pub mod services;

pub use document::ContactDocument;
pub use dto::{ContactQuery, ContactView, NewContact, Owner, Population, UserRef};
pub use services::Contacts;
