pub mod document;
pub mod dto;
pub mod password;
mod repo;
pub mod repo_types;
pub mod services;

pub use document::{Credential, UserDocument};
pub use dto::{NewUser, PublicUser, UserSummary};
pub use repo_types::Role;
pub use services::Users;
