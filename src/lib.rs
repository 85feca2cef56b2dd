//! # blobkeep
//!
//! A per-user, password-gated blob store backed by SQLite.
//!
//! Every account owns exactly one opaque binary payload. The payload can only
//! be read or replaced by presenting the account's password, which is kept as
//! a bcrypt hash and never stored in plaintext.
//!
//! ## Core Concepts
//!
//! - **Accounts**: one row per username, created and removed by an operator
//! - **Credentials**: salted bcrypt hashes, reset only by an operator
//! - **Payloads**: opaque bytes, written only after a successful password check
//! - **Outcomes**: every operation classifies as success, a soft failure
//!   (not found, bad credential, validation) or a hard storage failure
//!
//! ## Example
//!
//! ```ignore
//! use blobkeep::{HashCost, Vault};
//!
//! let vault = Vault::open("data.db", HashCost::DEFAULT)?;
//! vault.register("alice", "secret")?;
//! vault.verified_write("alice", "secret", &[1, 2])?;
//! assert_eq!(vault.verified_read("alice", "secret")?, vec![1, 2]);
//! ```

pub mod config;
pub mod logging;
pub mod model;
#[cfg(feature = "server")]
pub mod server;
pub mod store;

mod error;
mod vault;

pub use config::Config;
pub use error::{Error, Outcome, Result};
pub use model::{AccountInfo, CredentialHash, HashCost, Username};
pub use store::AccountStore;
pub use vault::Vault;
