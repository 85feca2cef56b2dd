//! Core data model types for blobkeep

mod account;
mod credential;
mod username;

pub use account::AccountInfo;
pub use credential::{CredentialHash, HashCost};
pub use username::{Username, MAX_USERNAME_LEN};
